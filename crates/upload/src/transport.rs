//! Transport seam between the upload engine and the HTTP client.
//!
//! The CLI implements this on top of the `reqwest` YouTube client; tests
//! implement it with scripted responses.

use std::future::Future;
use std::pin::Pin;

use tubelift_protocol::VideoInsertBody;
use tubelift_transfer::Chunk;

use crate::error::TransportError;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Everything the service needs to open a resumable session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    /// Total bytes that will be uploaded.
    pub content_length: u64,
    /// Media content type of the file.
    pub content_type: String,
    /// Metadata sent once with the session-open request.
    pub body: VideoInsertBody,
}

/// Response to a chunk transmission.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkResponse {
    /// Upload not finished; the service has persisted bytes `[0, next_offset)`.
    Incomplete { next_offset: u64 },
    /// Upload finished; `body` is the resource returned by the service.
    Complete { body: serde_json::Value },
}

/// Authenticated access to a resumable upload service.
pub trait UploadTransport: Send + Sync {
    /// Opens a session and returns its opaque session URI.
    fn open_session<'a>(&'a self, request: &'a SessionRequest) -> TransportFuture<'a, String>;

    /// Sends `chunk` of a `total_len`-byte upload to an open session.
    fn send_chunk<'a>(
        &'a self,
        session_uri: &'a str,
        chunk: Chunk,
        total_len: u64,
    ) -> TransportFuture<'a, ChunkResponse>;
}
