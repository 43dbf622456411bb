//! Console output and the JSON batch report.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tubelift_protocol::constants::WATCH_URL_PREFIX;
use tubelift_upload::{BatchSummary, UploadEvent, UploadResult};

/// Formats a byte count with a binary unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// One progress line per event.
pub fn format_event(event: &UploadEvent) -> String {
    match event {
        UploadEvent::Started { file, total_bytes } => {
            format!("Uploading {file} ({})...", format_bytes(*total_bytes))
        }
        UploadEvent::ChunkSent {
            file,
            bytes_sent,
            total_bytes,
            bytes_per_second,
            eta,
        } => {
            let percent = if *total_bytes == 0 {
                100.0
            } else {
                *bytes_sent as f64 * 100.0 / *total_bytes as f64
            };
            let mut line = format!(
                "  {file}: {percent:.1}% ({} / {}) at {}/s",
                format_bytes(*bytes_sent),
                format_bytes(*total_bytes),
                format_bytes(*bytes_per_second as u64)
            );
            if let Some(eta) = eta {
                let _ = write!(line, ", {}s left", eta.as_secs());
            }
            line
        }
        UploadEvent::Retrying {
            file,
            attempt,
            delay_secs,
            error,
        } => format!(
            "  {file}: {error}\n  Sleeping {delay_secs:.2} seconds and then retrying (attempt {attempt})..."
        ),
        UploadEvent::Completed { file, remote_id } => {
            format!("Video '{file}' (id: {remote_id}) was successfully uploaded.")
        }
        UploadEvent::Failed { file, error } => format!("Upload of '{file}' failed: {error}"),
    }
}

/// Renders the end-of-batch summary.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Upload Summary ===");
    let _ = writeln!(out, "Successful uploads: {}", summary.success_count());
    for result in summary.succeeded() {
        if let Some(id) = result.remote_id() {
            let _ = writeln!(out, "  ✓ {} -> {WATCH_URL_PREFIX}{id}", result.file_name);
        }
    }

    let failures = summary.failure_count();
    if failures > 0 {
        let _ = writeln!(out, "\nFailed uploads: {failures}");
        for result in summary.failed() {
            let cause = result.failure_cause().unwrap_or("unknown error");
            let _ = writeln!(out, "  ✗ {}: {cause}", result.file_name);
        }
    }

    let _ = writeln!(
        out,
        "\nTotal: {} successful, {failures} failed",
        summary.success_count()
    );
    out
}

#[derive(Serialize)]
struct ReportFile<'a> {
    generated_at: DateTime<Utc>,
    succeeded: usize,
    failed: usize,
    results: &'a [UploadResult],
}

/// Writes the batch results as pretty-printed JSON.
pub fn write_report(path: &Path, summary: &BatchSummary) -> anyhow::Result<()> {
    let report = ReportFile {
        generated_at: Utc::now(),
        succeeded: summary.success_count(),
        failed: summary.failure_count(),
        results: &summary.results,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(())
}
