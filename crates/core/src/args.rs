//! Command-line argument handling.
//!
//! The accepted shape is fixed: `apkrebuild -i <input> -o <output>`, both
//! flags present, in that order, nothing else.

use crate::console::Console;
use crate::messages;
use apkrebuild_common::{Error, OsType, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

const ARGUMENT_COUNT: usize = 5;
const INPUT_FLAG: &str = "-i";
const OUTPUT_FLAG: &str = "-o";

#[derive(Parser, Debug)]
#[command(name = "apkrebuild")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Package to rebuild
    #[arg(short = 'i', value_name = "INPUT", allow_hyphen_values = true)]
    input: PathBuf,

    /// Path of the rebuilt, signed package
    #[arg(short = 'o', value_name = "OUTPUT", allow_hyphen_values = true)]
    output: PathBuf,
}

/// Validated arguments of a rebuild run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildArgs {
    pub os: OsType,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Check the host platform, then the token shape, then parse the two paths.
///
/// `tokens` includes the program name, as `std::env::args_os()` yields it.
pub fn parse_args<I, T>(host_os: &str, tokens: I) -> Result<RebuildArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let os: OsType = host_os.parse()?;

    let tokens: Vec<OsString> = tokens.into_iter().map(Into::into).collect();
    if tokens.len() != ARGUMENT_COUNT
        || tokens[1].as_os_str() != OsStr::new(INPUT_FLAG)
        || tokens[3].as_os_str() != OsStr::new(OUTPUT_FLAG)
    {
        return Err(invalid_arguments());
    }

    let matches = Cli::command()
        .try_get_matches_from(&tokens)
        .map_err(|e| {
            debug!("Argument parsing failed: {}", e);
            invalid_arguments()
        })?;
    let cli = Cli::from_arg_matches(&matches).map_err(|_| invalid_arguments())?;

    Ok(RebuildArgs {
        os,
        input: cli.input,
        output: cli.output,
    })
}

/// Check that the input exists and that overwriting the output is allowed.
///
/// When the output already exists the user is asked on `console`, and one
/// line is read from `answers`.
pub fn process_args<W, R>(
    args: &RebuildArgs,
    console: &mut Console<W>,
    answers: &mut R,
) -> Result<()>
where
    W: Write,
    R: BufRead,
{
    if !args.input.is_file() {
        return Err(Error::InputNotFound(args.input.clone()));
    }

    if args.output.exists() {
        console.info(messages::OUTPUT_EXISTS);

        let mut answer = String::new();
        answers.read_line(&mut answer)?;
        if !is_affirmative(&answer) {
            return Err(Error::Aborted);
        }
        debug!("Overwriting {:?}", args.output);
    }

    Ok(())
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn invalid_arguments() -> Error {
    Error::InvalidArguments {
        usage: messages::USAGE.to_string(),
    }
}
