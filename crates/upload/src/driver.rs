//! Resumable transfer driver.
//!
//! Drives one [`UploadSession`] from its current offset to completion.
//! The driver is a sequential state machine: a chunk is only sent once the
//! outcome of the previous one is known, and the backoff sleep is the only
//! suspension point besides I/O.
//!
//! After a network error the driver does not know how much of the chunk
//! reached the service, so it first asks with an empty `bytes */N` request
//! and resumes from the offset in the reply.
//!
//! ```text
//!            ┌──────── progress ────────┐
//!            v                          │
//!   ──> SENDING ── retriable error ──> RETRY_WAIT
//!        │  │  ^ ^                        │  │
//!        │  │  │ └─ slept (HTTP status) ──┘  ├─ attempt > max ─┐
//!        │  │  │                             │ slept (network) │
//!        │  │  └── no progress ── RESYNCING <┘                 │
//!        │  └─ fatal / protocol violation / cancelled ──> ABORTED
//!        └─ completion with id ──> DONE
//! ```

use std::fs::File;
use std::io::{Read, Seek};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tubelift_protocol::remote_id;
use tubelift_transfer::{Chunk, ChunkReader, RetryState, SpeedCalculator, UploadSession};

use crate::error::{FailureClass, TransportError, UploadError};
use crate::initializer::PreparedUpload;
use crate::transport::{ChunkResponse, UploadTransport};
use crate::types::{DriverConfig, UploadEvent};

#[derive(Debug)]
enum DriverState {
    Sending,
    /// Carries the description of the retriable failure. `resync` asks the
    /// service for its offset before the next chunk.
    RetryWait { error: String, resync: bool },
    Resyncing,
    Done(String),
    Aborted(UploadError),
}

/// Sends the chunks of one prepared upload until a terminal outcome.
pub struct TransferDriver<'a, R = File> {
    transport: &'a dyn UploadTransport,
    config: &'a DriverConfig,
    file_name: String,
    session: UploadSession,
    // Moved into `spawn_blocking` for each read and put back afterwards.
    reader: Option<ChunkReader<R>>,
    retry: RetryState,
    cancel: CancellationToken,
    events_tx: Option<mpsc::Sender<UploadEvent>>,
    speed: SpeedCalculator,
    transmissions: u32,
}

impl<'a, R> TransferDriver<'a, R>
where
    R: Read + Seek + Send + 'static,
{
    pub fn new(
        transport: &'a dyn UploadTransport,
        prepared: PreparedUpload<R>,
        config: &'a DriverConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            config,
            file_name: prepared.file_name,
            session: prepared.session,
            reader: Some(prepared.reader),
            retry: RetryState::new(),
            cancel,
            events_tx: None,
            speed: SpeedCalculator::default(),
            transmissions: 0,
        }
    }

    /// Emits progress and retry events on `events_tx`.
    pub fn with_events(mut self, events_tx: mpsc::Sender<UploadEvent>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Runs the state machine to completion.
    ///
    /// Returns the remote identifier on success. On failure the cause is
    /// also recorded in the session.
    pub async fn run(&mut self) -> Result<String, UploadError> {
        self.speed.add_sample(0);

        let mut state = DriverState::Sending;
        loop {
            state = match state {
                DriverState::Sending => self.send_next().await,
                DriverState::RetryWait { error, resync } => {
                    self.wait_before_retry(error, resync).await
                }
                DriverState::Resyncing => self.query_status().await,
                DriverState::Done(remote_id) => match self.session.complete(remote_id.as_str()) {
                    Ok(()) => {
                        info!(file = %self.file_name, remote_id = %remote_id, "upload complete");
                        return Ok(remote_id);
                    }
                    Err(e) => DriverState::Aborted(e.into()),
                },
                DriverState::Aborted(err) => {
                    warn!(file = %self.file_name, error = %err, "upload aborted");
                    self.session.fail(err.to_string());
                    return Err(err);
                }
            };
        }
    }

    async fn send_next(&mut self) -> DriverState {
        if self.cancel.is_cancelled() {
            return DriverState::Aborted(UploadError::Cancelled);
        }

        let offset = self.session.bytes_sent();
        let total = self.session.file_length();
        let chunk = match self.read_chunk(offset).await {
            Ok(chunk) => chunk,
            Err(e) => return DriverState::Aborted(e),
        };

        self.transmissions += 1;
        debug!(
            file = %self.file_name,
            offset,
            len = chunk.len(),
            total,
            attempt = self.retry.attempt(),
            "sending chunk"
        );

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return DriverState::Aborted(UploadError::Cancelled),
            response = self.transport.send_chunk(self.session.session_token(), chunk, total) => response,
        };

        self.on_response(response)
    }

    /// Sends an empty status query and resumes from the reported offset.
    async fn query_status(&mut self) -> DriverState {
        if self.cancel.is_cancelled() {
            return DriverState::Aborted(UploadError::Cancelled);
        }

        let offset = self.session.bytes_sent();
        let total = self.session.file_length();
        let query = Chunk {
            offset,
            data: Vec::new(),
        };

        self.transmissions += 1;
        debug!(file = %self.file_name, offset, total, "querying upload status");

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return DriverState::Aborted(UploadError::Cancelled),
            response = self.transport.send_chunk(self.session.session_token(), query, total) => response,
        };

        match response {
            Ok(ChunkResponse::Incomplete { next_offset }) if next_offset == offset => {
                DriverState::Sending
            }
            other => self.on_response(other),
        }
    }

    /// Transition out of `Sending` for one transmission outcome.
    fn on_response(&mut self, response: Result<ChunkResponse, TransportError>) -> DriverState {
        match response {
            Ok(ChunkResponse::Complete { body }) => match remote_id(&body) {
                Some(id) => {
                    self.retry.reset();
                    DriverState::Done(id.to_string())
                }
                None => DriverState::Aborted(UploadError::UnexpectedResponse(format!(
                    "completion response without a video id: {body}"
                ))),
            },
            Ok(ChunkResponse::Incomplete { next_offset }) => {
                let previous = self.session.bytes_sent();
                if next_offset == previous {
                    return DriverState::RetryWait {
                        error: format!("service made no progress past byte {previous}"),
                        resync: false,
                    };
                }
                if let Err(e) = self.session.advance_to(next_offset) {
                    return DriverState::Aborted(UploadError::UnexpectedResponse(e.to_string()));
                }

                self.retry.reset();
                self.speed.add_sample(next_offset - previous);
                self.emit(UploadEvent::ChunkSent {
                    file: self.file_name.clone(),
                    bytes_sent: next_offset,
                    total_bytes: self.session.file_length(),
                    bytes_per_second: self.speed.bytes_per_second(),
                    eta: self.speed.eta(self.session.remaining()),
                });
                DriverState::Sending
            }
            Err(err) => match err.classify(&self.config.retry) {
                FailureClass::Retriable => DriverState::RetryWait {
                    resync: matches!(err, TransportError::Network { .. }),
                    error: err.to_string(),
                },
                FailureClass::Fatal => DriverState::Aborted(err.into()),
            },
        }
    }

    async fn wait_before_retry(&mut self, error: String, resync: bool) -> DriverState {
        let attempt = self.retry.record_failure(error.as_str());
        warn!(file = %self.file_name, attempt, error = %error, "retriable error");

        if self.config.retry.exhausted(attempt) {
            warn!(file = %self.file_name, attempt, "no longer attempting to retry");
            return DriverState::Aborted(UploadError::RetriesExhausted {
                attempts: attempt,
                last_error: error,
            });
        }

        let delay = self.config.retry.backoff(attempt, &mut rand::thread_rng());
        let delay_secs = delay.as_secs_f64();
        info!(
            file = %self.file_name,
            attempt,
            delay_secs = format_args!("{delay_secs:.2}"),
            "sleeping before retry"
        );
        self.emit(UploadEvent::Retrying {
            file: self.file_name.clone(),
            attempt,
            delay_secs,
            error,
        });

        let next = if resync {
            DriverState::Resyncing
        } else {
            DriverState::Sending
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => DriverState::Aborted(UploadError::Cancelled),
            _ = tokio::time::sleep(delay) => next,
        }
    }

    async fn read_chunk(&mut self, offset: u64) -> Result<Chunk, UploadError> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| UploadError::Io(std::io::Error::other("chunk reader unavailable")))?;

        let (reader, chunk) = tokio::task::spawn_blocking(move || {
            let chunk = reader.read_chunk(offset);
            (reader, chunk)
        })
        .await
        .map_err(|e| UploadError::Io(std::io::Error::other(format!("task join error: {e}"))))?;

        self.reader = Some(reader);
        Ok(chunk?)
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events_tx {
            // Advisory only: never block the transfer on a slow consumer.
            let _ = tx.try_send(event);
        }
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn retry_state(&self) -> &RetryState {
        &self.retry
    }

    /// Number of requests sent to the session so far, status queries included.
    pub fn transmissions(&self) -> u32 {
        self.transmissions
    }
}
