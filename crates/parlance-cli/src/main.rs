//! Parlance CLI entry point.

use clap::Parser;
use parlance_cli::config::Cli;
use parlance_cli::error::AppError;
use parlance_cli::session;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Logs go to stderr; stdout carries the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(
        npc_id = %cli.npc_id,
        turns = cli.recordings.len(),
        "Starting scripted conversation"
    );

    let summary = session::run(&cli).await?;

    for turn in &summary.turns {
        println!("{}", turn.transcript_line());
    }
    println!("{} charm: {}", summary.npc.display_name, summary.charm.value());
    if summary.failed_turns > 0 {
        tracing::warn!(failed = summary.failed_turns, "some turns did not complete");
    }

    Ok(())
}
