//! Common error types for apkrebuild.

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for apkrebuild operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid arguments\n{usage}")]
    InvalidArguments { usage: String },

    #[error("Input filename not exists: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Abort")]
    Aborted,

    #[error("Please use macOS or Windows (detected: {0})")]
    UnsupportedOs(String),

    #[error("No <{element}> element in {}", .path.display())]
    ElementNotFound { element: String, path: PathBuf },

    #[error("Expected exactly one <{element}> element in {}, found {count}", .path.display())]
    DuplicateElement {
        element: String,
        path: PathBuf,
        count: usize,
    },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Command exited with status {}: {cmd}", exit_code_label(.code))]
    CommandFailed { cmd: String, code: Option<i32> },

    #[error("Command execution failed: {cmd} - {reason}")]
    CommandExecution { cmd: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Step {index} ({name}) failed")]
    Step {
        index: usize,
        name: &'static str,
        #[source]
        source: Box<Error>,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(e.into())
    }
}

impl Error {
    /// Wrap an error with the pipeline step it came from.
    pub fn at_step(self, index: usize, name: &'static str) -> Self {
        Error::Step {
            index,
            name,
            source: Box::new(self),
        }
    }

    /// The pipeline step index, if this error came out of a pipeline step.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Error::Step { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Innermost error, skipping step wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }
}
