//! Data types for the upload flow.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tubelift_protocol::VideoMetadata;
use tubelift_transfer::{DEFAULT_CHUNK_SIZE, RetryPolicy};

use crate::media::display_name;

/// Settings passed to every driver of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Bytes per chunk transmission.
    pub chunk_size: usize,
    pub retry: RetryPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

/// One file to upload together with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadJob {
    pub path: PathBuf,
    pub metadata: VideoMetadata,
}

impl UploadJob {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Terminal outcome of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Uploaded { remote_id: String },
    Failed { cause: String },
}

/// Result of uploading one file. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: UploadOutcome,
    pub finished_at: DateTime<Utc>,
}

impl UploadResult {
    pub fn uploaded(file_name: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            outcome: UploadOutcome::Uploaded {
                remote_id: remote_id.into(),
            },
            finished_at: Utc::now(),
        }
    }

    pub fn failed(file_name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            outcome: UploadOutcome::Failed {
                cause: cause.into(),
            },
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UploadOutcome::Uploaded { .. })
    }

    pub fn remote_id(&self) -> Option<&str> {
        match &self.outcome {
            UploadOutcome::Uploaded { remote_id } => Some(remote_id),
            UploadOutcome::Failed { .. } => None,
        }
    }

    pub fn failure_cause(&self) -> Option<&str> {
        match &self.outcome {
            UploadOutcome::Uploaded { .. } => None,
            UploadOutcome::Failed { cause } => Some(cause),
        }
    }
}

/// Results of a batch, in job order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub results: Vec<UploadResult>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(UploadResult::is_success)
    }
}

/// Advisory progress event emitted during a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Session opened; chunks are about to be sent.
    Started { file: String, total_bytes: u64 },
    /// The service confirmed progress.
    ChunkSent {
        file: String,
        bytes_sent: u64,
        total_bytes: u64,
        bytes_per_second: f64,
        /// Estimated time to finish at the current rate.
        eta: Option<Duration>,
    },
    /// A retriable failure; the driver sleeps `delay_secs` before retrying.
    Retrying {
        file: String,
        attempt: u32,
        delay_secs: f64,
        error: String,
    },
    /// Upload finished successfully.
    Completed { file: String, remote_id: String },
    /// Upload ended with an error.
    Failed { file: String, error: String },
}
