pub mod constants;
pub mod range;
pub mod types;

// Re-export primary types for convenience.
pub use range::{ProtocolError, content_range, next_offset_from_range};
pub use types::{PrivacyStatus, Snippet, VideoInsertBody, VideoMetadata, VideoStatus, remote_id};
