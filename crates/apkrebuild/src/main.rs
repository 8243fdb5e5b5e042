//! apkrebuild - rebuild an Android package so its network traffic can be
//! inspected with a user-installed CA.

use anyhow::Context;
use apkrebuild_core::{
    parse_args, process_args, Console, LocalRunner, RebuildConfig, RebuildReport, Rebuilder,
    ToolLocator,
};
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the diagnostics filter.
const LOG_ENV: &str = "APKREBUILD_LOG";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let mut console = Console::stdout();
    match run(&mut console) {
        Ok(report) => {
            if let Ok(json) = serde_json::to_string(&report) {
                debug!("Rebuild report: {}", json);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            console.error(format!("{:#}", err));
            debug!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(console: &mut Console) -> anyhow::Result<RebuildReport> {
    let args = parse_args(std::env::consts::OS, std::env::args_os())?;
    let config = RebuildConfig::from_env()?;

    process_args(&args, console, &mut io::stdin().lock())?;

    let locator = ToolLocator::for_os(args.os, &config);
    let rebuilder = Rebuilder::new(config, locator, LocalRunner::new(args.os));
    let report = rebuilder
        .rebuild(&args.input, &args.output, console)
        .with_context(|| format!("Failed to rebuild {}", args.input.display()))?;

    Ok(report)
}
