//! tubelift: resumable YouTube uploader.

mod cli;
mod config;
mod report;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use tubelift_upload::{BatchSummary, UploadEvent, UploadOrchestrator};
use tubelift_youtube::YouTubeClient;

use cli::Cli;
use config::AppConfig;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,tubelift=debug,tubelift_upload=debug,tubelift_youtube=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(summary) if summary.all_succeeded() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<BatchSummary> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("cannot read configuration")?;
    config.apply_cli(&cli);

    if config.access_token.trim().is_empty() {
        anyhow::bail!("no access token: pass --access-token or set TUBELIFT_ACCESS_TOKEN");
    }

    let jobs = cli
        .source
        .provider(config.template())
        .jobs()
        .context("no valid video files to upload")?;

    let client = YouTubeClient::new(&config.access_token, config.request_timeout())
        .context("cannot build HTTP client")?
        .with_base_url(config.api_base_url.as_str());

    let mut orchestrator = UploadOrchestrator::new(config.driver_config());
    let events = orchestrator
        .take_events()
        .context("event receiver already taken")?;
    let printer = tokio::spawn(print_events(events));

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, cancelling uploads");
            cancel.cancel();
        }
    });

    println!("=== Starting upload of {} video(s) ===", jobs.len());
    let summary = orchestrator.upload_all(&client, jobs).await;

    // Closes the event channel so the printer drains and exits.
    drop(orchestrator);
    let _ = printer.await;

    print!("{}", report::render_summary(&summary));
    if let Some(path) = &cli.report {
        report::write_report(path, &summary)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
    }
    Ok(summary)
}

async fn print_events(mut events: mpsc::Receiver<UploadEvent>) {
    while let Some(event) = events.recv().await {
        println!("{}", report::format_event(&event));
    }
}
