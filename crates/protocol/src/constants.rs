use std::time::Duration;

/// Default API host for uploads.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Path of the resumable video insert endpoint (relative to the base URL).
pub const UPLOAD_PATH: &str = "/upload/youtube/v3/videos";

/// Resource parts sent with the insert request. Must match the body sections.
pub const INSERT_PARTS: &str = "snippet,status";

/// Header announcing the total media length when opening a session.
pub const HEADER_UPLOAD_CONTENT_LENGTH: &str = "X-Upload-Content-Length";

/// Header announcing the media content type when opening a session.
pub const HEADER_UPLOAD_CONTENT_TYPE: &str = "X-Upload-Content-Type";

/// Status returned by the service while a resumable upload is incomplete.
pub const RESUME_INCOMPLETE: u16 = 308;

/// Server-side statuses that are safe to retry.
pub const RETRIABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Consecutive retriable failures tolerated before giving up.
pub const MAX_RETRIES: u32 = 10;

/// Chunk sizes must be a multiple of this (256 KiB) except for the final chunk.
pub const CHUNK_GRANULARITY: usize = 256 * 1024;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// "People & Blogs".
pub const DEFAULT_CATEGORY_ID: &str = "22";

/// Public watch URL prefix for an uploaded video id.
pub const WATCH_URL_PREFIX: &str = "https://youtube.com/watch?v=";

/// Content type used when the file extension is not recognised.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
