#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod session;
mod telemetry;

use std::process;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Cli;
use crate::session::{Command, Session};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "tabula_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "tabula_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "tabula_cli::config";
pub const TRACING_TARGET_SESSION: &str = "tabula_cli::session";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "session finished"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "session terminated with error"
        );
    }
    eprintln!("Error: {error:#}");

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();

    cli.controller
        .check()
        .context("invalid controller configuration")?;

    let mut session = Session::new(&cli)?;
    session.start(cli.session.role).await;
    session.execute(Command::List).await;

    for (number, line) in read_script(&cli).await?.into_iter().enumerate() {
        let command = Command::parse_line(&line)
            .with_context(|| format!("line {}: `{}`", number + 1, line.trim()))?;

        if let Some(command) = command {
            println!("> {}", line.trim());
            session.execute(command).await;
        }
    }

    Ok(())
}

/// Reads the script file, or standard input when none is configured.
async fn read_script(cli: &Cli) -> anyhow::Result<Vec<String>> {
    if let Some(path) = &cli.session.script {
        let script = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read script {}", path.display()))?;
        return Ok(script.lines().map(str::to_owned).collect());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut script = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read standard input")?
    {
        script.push(line);
    }

    Ok(script)
}
