//! Color-coded console output for user-facing progress.
//!
//! Diagnostics go through `tracing`; this is only the text a user watches
//! while a rebuild runs.

use std::fmt::Display;
use std::io::{self, IsTerminal, Stdout, Write};

const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Writes info, success, warning and error lines, optionally ANSI-colored.
pub struct Console<W: Write = Stdout> {
    out: W,
    colored: bool,
}

impl Console<Stdout> {
    /// Console on stdout, colored only when stdout is a terminal.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let colored = out.is_terminal();
        Self { out, colored }
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self { out, colored }
    }

    pub fn info(&mut self, message: impl Display) {
        self.line(CYAN, message);
    }

    pub fn success(&mut self, message: impl Display) {
        self.line(GREEN, message);
    }

    pub fn warning(&mut self, message: impl Display) {
        self.line(YELLOW, message);
    }

    pub fn error(&mut self, message: impl Display) {
        self.line(RED, message);
    }

    /// Consume the console, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, color: &str, message: impl Display) {
        // A closed stdout must not abort a rebuild half way through.
        let written = if self.colored {
            writeln!(self.out, "{color}{message}{RESET}")
        } else {
            writeln!(self.out, "{message}")
        };
        written.ok();
        self.out.flush().ok();
    }
}
