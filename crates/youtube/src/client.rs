//! YouTube resumable upload client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! Implements [`UploadTransport`] so the upload engine can drive it.

use std::error::Error as StdError;
use std::io::ErrorKind;
use std::time::Duration;

use reqwest::header::{
    AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION, RANGE,
};
use reqwest::{Response, StatusCode};
use tracing::debug;

use tubelift_protocol::constants::{
    DEFAULT_BASE_URL, HEADER_UPLOAD_CONTENT_LENGTH, HEADER_UPLOAD_CONTENT_TYPE, INSERT_PARTS,
    RESUME_INCOMPLETE, UPLOAD_PATH,
};
use tubelift_protocol::{content_range, next_offset_from_range};
use tubelift_transfer::Chunk;
use tubelift_upload::{
    ChunkResponse, NetworkErrorKind, SessionRequest, TransportError, TransportFuture,
    UploadTransport,
};

/// Errors from building the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid access token")]
    InvalidToken,
}

/// Authenticated client for the video insert endpoint.
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    /// Creates a client that sends `access_token` as a Bearer token.
    ///
    /// `timeout` bounds every request, including chunk uploads.
    pub fn new(access_token: &str, timeout: Duration) -> Result<Self, ClientError> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(ClientError::InvalidToken);
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        // 308 means "resume incomplete" here, never a redirect.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Opens a resumable session and returns the session URI.
    pub async fn open_resumable_session(
        &self,
        request: &SessionRequest,
    ) -> Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, UPLOAD_PATH);
        let body = serde_json::to_vec(&request.body)
            .map_err(|e| TransportError::MalformedResponse(format!("cannot encode metadata: {e}")))?;

        let resp = self
            .http
            .post(&url)
            .query(&[("uploadType", "resumable"), ("part", INSERT_PARTS)])
            .header(HEADER_UPLOAD_CONTENT_LENGTH, request.content_length)
            .header(HEADER_UPLOAD_CONTENT_TYPE, request.content_type.as_str())
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await
            .map_err(network_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(resp).await);
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                TransportError::MalformedResponse("session response has no Location header".into())
            })?;

        debug!(status = status.as_u16(), "resumable session opened");
        Ok(location)
    }

    /// Uploads one chunk to an open session.
    pub async fn put_chunk(
        &self,
        session_uri: &str,
        chunk: Chunk,
        total_len: u64,
    ) -> Result<ChunkResponse, TransportError> {
        let range = content_range(chunk.offset, chunk.len(), total_len);
        debug!(content_range = %range, "uploading chunk");

        let resp = self
            .http
            .put(session_uri)
            .header(CONTENT_RANGE, range)
            .body(chunk.data)
            .send()
            .await
            .map_err(network_error)?;

        let status = resp.status();
        if status.as_u16() == RESUME_INCOMPLETE {
            let next_offset = match resp.headers().get(RANGE) {
                Some(value) => {
                    let value = value.to_str().map_err(|_| {
                        TransportError::MalformedResponse("non-ASCII Range header".into())
                    })?;
                    next_offset_from_range(value)
                        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?
                }
                // Nothing persisted yet.
                None => 0,
            };
            return Ok(ChunkResponse::Incomplete { next_offset });
        }

        if status == StatusCode::OK || status == StatusCode::CREATED {
            let text = resp.text().await.map_err(network_error)?;
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            return Ok(ChunkResponse::Complete { body });
        }

        Err(status_error(resp).await)
    }
}

impl UploadTransport for YouTubeClient {
    fn open_session<'a>(&'a self, request: &'a SessionRequest) -> TransportFuture<'a, String> {
        Box::pin(self.open_resumable_session(request))
    }

    fn send_chunk<'a>(
        &'a self,
        session_uri: &'a str,
        chunk: Chunk,
        total_len: u64,
    ) -> TransportFuture<'a, ChunkResponse> {
        Box::pin(self.put_chunk(session_uri, chunk, total_len))
    }
}

async fn status_error(resp: Response) -> TransportError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    TransportError::status(status, body)
}

/// Maps a `reqwest` failure onto the closed set of network error kinds.
fn network_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if err.is_connect() {
        NetworkErrorKind::Connect
    } else {
        match kind_from_sources(&err) {
            NetworkErrorKind::Other if err.is_body() || err.is_decode() => {
                NetworkErrorKind::IncompleteRead
            }
            kind => kind,
        }
    };
    TransportError::network(kind, err.to_string())
}

fn kind_from_sources(err: &(dyn StdError + 'static)) -> NetworkErrorKind {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return match io.kind() {
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                    NetworkErrorKind::ConnectionReset
                }
                ErrorKind::UnexpectedEof => NetworkErrorKind::IncompleteRead,
                ErrorKind::TimedOut => NetworkErrorKind::Timeout,
                _ => NetworkErrorKind::Other,
            };
        }

        let message = cause.to_string();
        if message.contains("invalid HTTP") {
            return NetworkErrorKind::BadStatusLine;
        }
        if message.contains("closed before message completed") {
            return NetworkErrorKind::IncompleteRead;
        }
        source = cause.source();
    }
    NetworkErrorKind::Other
}
