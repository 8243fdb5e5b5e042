//! Common utilities and types shared across apkrebuild crates.

pub mod error;
pub mod os;

pub use error::{Error, Result};
pub use os::OsType;
