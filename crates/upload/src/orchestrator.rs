//! Batch orchestrator.
//!
//! Uploads a list of jobs one after another. Each file gets its own
//! session and driver; a failed file never stops the batch.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::driver::TransferDriver;
use crate::error::UploadError;
use crate::initializer::initialize_session;
use crate::transport::UploadTransport;
use crate::types::{BatchSummary, DriverConfig, UploadEvent, UploadJob, UploadResult};

/// Uploads batches of files and reports progress on an event channel.
pub struct UploadOrchestrator {
    config: DriverConfig,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

impl UploadOrchestrator {
    pub fn new(config: DriverConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            config,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns the token that cancels the whole batch.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads every job in order and returns one result per job.
    pub async fn upload_all(
        &self,
        transport: &dyn UploadTransport,
        jobs: Vec<UploadJob>,
    ) -> BatchSummary {
        let total = jobs.len();
        let mut results = Vec::with_capacity(total);

        for (index, job) in jobs.iter().enumerate() {
            info!(
                file = %job.file_name(),
                "uploading file {}/{}",
                index + 1,
                total
            );
            results.push(self.upload_one(transport, job).await);
        }

        let summary = BatchSummary { results };
        info!(
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            "batch finished"
        );
        summary
    }

    /// Uploads a single job: open the session, then drive it to the end.
    pub async fn upload_one(&self, transport: &dyn UploadTransport, job: &UploadJob) -> UploadResult {
        let file_name = job.file_name();

        match self.run_job(transport, job, &file_name).await {
            Ok(remote_id) => {
                self.emit(UploadEvent::Completed {
                    file: file_name.clone(),
                    remote_id: remote_id.clone(),
                });
                UploadResult::uploaded(file_name, remote_id)
            }
            Err(e) => {
                let err_msg = e.to_string();
                error!(file = %file_name, error = %err_msg, "upload failed");
                self.emit(UploadEvent::Failed {
                    file: file_name.clone(),
                    error: err_msg.clone(),
                });
                UploadResult::failed(file_name, err_msg)
            }
        }
    }

    async fn run_job(
        &self,
        transport: &dyn UploadTransport,
        job: &UploadJob,
        file_name: &str,
    ) -> Result<String, UploadError> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let prepared = initialize_session(
            transport,
            &job.path,
            &job.metadata,
            self.config.chunk_size,
            &self.cancel,
        )
        .await?;

        info!(
            file = %file_name,
            bytes = prepared.session.file_length(),
            "upload session opened"
        );
        self.emit(UploadEvent::Started {
            file: file_name.to_string(),
            total_bytes: prepared.session.file_length(),
        });

        let mut driver = TransferDriver::new(transport, prepared, &self.config, self.cancel.clone())
            .with_events(self.events_tx.clone());
        driver.run().await
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.try_send(event);
    }
}
