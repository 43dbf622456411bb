//! `Content-Range` / `Range` header helpers for resumable uploads.

/// Errors from parsing protocol values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid privacy status: {0} (expected unlisted, private or public)")]
    InvalidPrivacyStatus(String),

    #[error("invalid range header: {0}")]
    InvalidRange(String),
}

/// Builds the `Content-Range` value for a chunk of `len` bytes at `start`.
///
/// An empty chunk (only valid for an empty file) is sent as `bytes */{total}`.
pub fn content_range(start: u64, len: u64, total: u64) -> String {
    if len == 0 {
        return format!("bytes */{total}");
    }
    format!("bytes {start}-{}/{total}", start + len - 1)
}

/// Parses the `Range` header of a 308 response into the next byte to send.
///
/// The service reports the bytes it has persisted as `bytes=0-{last}`, so the
/// next offset is `last + 1`.
pub fn next_offset_from_range(header: &str) -> Result<u64, ProtocolError> {
    let invalid = || ProtocolError::InvalidRange(header.to_string());

    let value = header.trim();
    let value = value.strip_prefix("bytes=").unwrap_or(value);
    let (first, last) = value.split_once('-').ok_or_else(invalid)?;

    let first: u64 = first.trim().parse().map_err(|_| invalid())?;
    let last: u64 = last.trim().parse().map_err(|_| invalid())?;
    if first != 0 || last < first {
        return Err(invalid());
    }
    last.checked_add(1).ok_or_else(invalid)
}
