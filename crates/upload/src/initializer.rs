//! Opens a resumable upload session for one file.

use std::fs::File;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use tubelift_protocol::{VideoInsertBody, VideoMetadata};
use tubelift_transfer::{ChunkReader, UploadSession};

use crate::error::UploadError;
use crate::media::{detect_content_type, display_name};
use crate::transport::{SessionRequest, UploadTransport};

/// A file with an open session, ready for the transfer driver.
pub struct PreparedUpload<R = File> {
    pub file_name: String,
    pub session: UploadSession,
    pub reader: ChunkReader<R>,
}

/// Stats `path`, sends the session-open request and returns the session.
///
/// The request is sent exactly once: until the service issues a session
/// URI there is nothing to resume, so every failure here is surfaced as
/// [`UploadError::Initialization`]. Cancelling `cancel` abandons the
/// request with [`UploadError::Cancelled`].
pub async fn initialize_session(
    transport: &dyn UploadTransport,
    path: &Path,
    metadata: &VideoMetadata,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<PreparedUpload, UploadError> {
    let file_name = display_name(path);

    let reader = tokio::task::spawn_blocking({
        let path = path.to_path_buf();
        move || ChunkReader::open(&path, chunk_size)
    })
    .await
    .map_err(|e| UploadError::Initialization(format!("task join error: {e}")))?
    .map_err(|e| UploadError::Initialization(format!("cannot read {}: {e}", path.display())))?;

    let request = SessionRequest {
        content_length: reader.len(),
        content_type: detect_content_type(path).to_string(),
        body: VideoInsertBody::from(metadata),
    };

    debug!(
        file = %file_name,
        bytes = request.content_length,
        content_type = %request.content_type,
        "opening upload session"
    );

    let reply = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(UploadError::Cancelled),
        reply = transport.open_session(&request) => reply,
    };
    let session_uri = reply
        .map_err(|e| UploadError::Initialization(format!("upload session rejected: {e}")))?;

    if session_uri.is_empty() {
        return Err(UploadError::Initialization(
            "service returned an empty session URI".into(),
        ));
    }

    Ok(PreparedUpload {
        file_name,
        session: UploadSession::new(session_uri, reader.len()),
        reader,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::{ChunkResponse, TransportFuture};
    use std::sync::Mutex;
    use tubelift_protocol::PrivacyStatus;
    use tubelift_transfer::{Chunk, SessionStatus};

    struct MockOpen {
        reply: Result<String, TransportError>,
        requests: Mutex<Vec<SessionRequest>>,
    }

    impl MockOpen {
        fn new(reply: Result<String, TransportError>) -> Self {
            Self {
                reply,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl UploadTransport for MockOpen {
        fn open_session<'a>(&'a self, request: &'a SessionRequest) -> TransportFuture<'a, String> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }

        fn send_chunk<'a>(
            &'a self,
            _session_uri: &'a str,
            _chunk: Chunk,
            _total_len: u64,
        ) -> TransportFuture<'a, ChunkResponse> {
            let reply: Result<ChunkResponse, TransportError> = Err(
                TransportError::MalformedResponse("initializer must not send chunks".into()),
            );
            Box::pin(async move { reply })
        }
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            title: "Trip".into(),
            description: "Mountains".into(),
            tags: vec!["hiking".into()],
            category_id: "19".into(),
            privacy_status: PrivacyStatus::Public,
        }
    }

    #[tokio::test]
    async fn opens_session_with_length_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip.mp4");
        std::fs::write(&path, vec![7u8; 1500]).unwrap();

        let transport = MockOpen::new(Ok("https://upload.example/s/1".into()));
        let prepared = initialize_session(&transport, &path, &metadata(), 1024, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(prepared.file_name, "trip.mp4");
        assert_eq!(prepared.session.session_token(), "https://upload.example/s/1");
        assert_eq!(prepared.session.file_length(), 1500);
        assert_eq!(prepared.session.bytes_sent(), 0);
        assert_eq!(prepared.session.status(), SessionStatus::InProgress);
        assert_eq!(prepared.reader.chunk_size(), 1024);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].content_length, 1500);
        assert_eq!(requests[0].content_type, "video/mp4");
        assert_eq!(requests[0].body.snippet.title, "Trip");
        assert_eq!(requests[0].body.status.privacy_status, PrivacyStatus::Public);
    }

    #[tokio::test]
    async fn missing_file_is_initialization_error() {
        let transport = MockOpen::new(Ok("unused".into()));
        let result = initialize_session(
            &transport,
            Path::new("/nonexistent/clip.mp4"),
            &metadata(),
            1024,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(UploadError::Initialization(_))));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_request_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();

        // Even a normally retriable status is surfaced immediately here.
        let transport = MockOpen::new(Err(TransportError::status(503, "busy")));
        let result = initialize_session(&transport, &path, &metadata(), 1024, &CancellationToken::new()).await;

        match result {
            Err(UploadError::Initialization(msg)) => assert!(msg.contains("503"), "{msg}"),
            other => panic!("expected initialization error, got {:?}", other.err()),
        }
        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_session_uri_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();

        let transport = MockOpen::new(Ok(String::new()));
        let result = initialize_session(&transport, &path, &metadata(), 1024, &CancellationToken::new()).await;
        assert!(matches!(result, Err(UploadError::Initialization(_))));
    }

    #[tokio::test]
    async fn cancelled_token_skips_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();

        let transport = MockOpen::new(Ok("https://upload.example/s/1".into()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = initialize_session(&transport, &path, &metadata(), 1024, &cancel).await;

        assert!(matches!(result, Err(UploadError::Cancelled)));
    }
}
