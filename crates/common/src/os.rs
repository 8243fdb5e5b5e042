//! Host operating system detection.

use std::fmt;
use std::str::FromStr;

/// Supported host operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Windows,
    MacOs,
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsType::Windows => write!(f, "windows"),
            OsType::MacOs => write!(f, "macos"),
        }
    }
}

impl FromStr for OsType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(OsType::Windows),
            "macos" | "darwin" => Ok(OsType::MacOs),
            _ => Err(crate::Error::UnsupportedOs(s.to_string())),
        }
    }
}

impl OsType {
    /// Check if the OS is Windows.
    pub fn is_windows(&self) -> bool {
        matches!(self, OsType::Windows)
    }
}
