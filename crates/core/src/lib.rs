//! apkrebuild core - unpack, patch, rebuild, align and re-sign Android packages
//! so their network traffic can be inspected.

pub mod args;
pub mod audit;
pub mod config;
pub mod console;
pub mod executor;
pub mod locator;
pub mod manifest;
pub mod messages;
pub mod pipeline;

pub use args::{parse_args, process_args, RebuildArgs};
pub use config::RebuildConfig;
pub use console::Console;
pub use executor::{LocalRunner, ToolCommand, ToolRunner};
pub use locator::{Tool, ToolLocator};
pub use pipeline::{RebuildReport, Rebuilder};
