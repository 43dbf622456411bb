//! Chunked file reads, upload session state and retry policy.

mod chunked;
mod progress;
mod retry;
mod session;

pub use chunked::{Chunk, ChunkReader, normalize_chunk_size};
pub use progress::SpeedCalculator;
pub use retry::{RetryPolicy, RetryState};
pub use session::{SessionStatus, UploadSession};

/// Default chunk size: 8 MiB (a multiple of the service's 256 KiB granularity).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("offset {offset} is beyond the end of the file ({len} bytes)")]
    OffsetBeyondEnd { offset: u64, len: u64 },

    #[error("service reported offset {reported} below confirmed offset {current}")]
    OffsetRegressed { current: u64, reported: u64 },

    #[error("file shrank during upload: expected {expected} bytes at offset {offset}, read {read}")]
    ShortRead { offset: u64, expected: u64, read: u64 },

    #[error("session is no longer in progress ({0})")]
    SessionClosed(SessionStatus),

    #[error("completion without a remote identifier")]
    EmptyRemoteId,
}
