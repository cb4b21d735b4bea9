// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// richmedia-harness: runs a scripted bridge session against a console
// content surface.

mod host;
mod session;
mod surface;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use richmedia_core::config::BridgeConfig;
use richmedia_core::error::Result;

use session::{SessionOptions, run_session};
use surface::ConsoleSurface;

#[derive(Parser, Debug)]
#[command(name = "richmedia-harness")]
#[command(about = "Run a scripted rich-media bridge session and print every injected script")]
#[command(version)]
struct Args {
    /// JSON bridge configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device pixels per dip passed to the initial state.
    #[arg(long)]
    scale: Option<f32>,

    /// Do not echo injected scripts to stdout.
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    let mut options = SessionOptions::default();
    if let Some(scale) = args.scale {
        options.scale = scale;
    }
    let surface = Arc::new(ConsoleSurface::new(options.bounds, !args.quiet));

    let summary = run_session(&config, surface, options).await?;
    tracing::info!(
        scripts = summary.scripts,
        stopped = ?summary.stopped,
        teardown_failures = summary.teardown_failures,
        host_actions = summary.host_actions.len(),
        events_created = summary.events_created,
        reminders_created = summary.reminders_created,
        scripts_after_teardown = summary.scripts_after_teardown,
        "session finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("richmedia-harness starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}
