//! External tool execution.

use apkrebuild_common::{Error, OsType, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// A program and its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// File name of the program, without directories.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .to_string()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Trait for running external tools.
pub trait ToolRunner {
    /// Run a command to completion and return its exit code.
    fn run(&self, command: &ToolCommand) -> Result<Option<i32>>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, command: &ToolCommand) -> Result<Option<i32>> {
        (**self).run(command)
    }
}

/// Runs tools as child processes of this one, sharing its terminal.
///
/// The key generator and the signer prompt for passwords, so stdio is
/// inherited rather than captured.
pub struct LocalRunner {
    os: OsType,
}

impl LocalRunner {
    pub fn new(os: OsType) -> Self {
        Self { os }
    }

    fn command(&self, tool: &ToolCommand) -> Command {
        if self.os.is_windows() && needs_shell(&tool.program) {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(&tool.program).args(&tool.args);
            command
        } else {
            let mut command = Command::new(&tool.program);
            command.args(&tool.args);
            command
        }
    }
}

impl ToolRunner for LocalRunner {
    fn run(&self, tool: &ToolCommand) -> Result<Option<i32>> {
        debug!("Local exec: {}", tool);

        let status = self
            .command(tool)
            .status()
            .map_err(|e| Error::CommandExecution {
                cmd: tool.to_string(),
                reason: e.to_string(),
            })?;

        debug!("{} exited with {:?}", tool.program_name(), status.code());
        Ok(status.code())
    }
}

/// Batch wrappers (`apksigner.bat`, `apktool.bat`) only run through `cmd`.
fn needs_shell(program: &Path) -> bool {
    match program.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case("bat") || ext.eq_ignore_ascii_case("cmd"),
        None => true,
    }
}
