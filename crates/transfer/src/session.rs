use std::fmt;

use serde::Serialize;

use crate::TransferError;

/// Lifecycle of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Complete,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InProgress => "in progress",
            Self::Complete => "complete",
            Self::Failed => "failed",
        })
    }
}

/// One in-flight resumable upload.
///
/// Owned by a single driver. Every mutator checks the session invariants
/// and returns an error instead of leaving the session inconsistent:
/// `bytes_sent` never decreases or passes `file_length`, a complete session
/// has sent every byte and carries a remote id, and a closed session
/// accepts no further changes.
#[derive(Debug, Clone)]
pub struct UploadSession {
    session_token: String,
    file_length: u64,
    bytes_sent: u64,
    status: SessionStatus,
    remote_id: Option<String>,
    failure: Option<String>,
}

impl UploadSession {
    /// Creates an in-progress session with nothing sent yet.
    pub fn new(session_token: impl Into<String>, file_length: u64) -> Self {
        Self {
            session_token: session_token.into(),
            file_length,
            bytes_sent: 0,
            status: SessionStatus::InProgress,
            remote_id: None,
            failure: None,
        }
    }

    /// Moves the cursor to the offset the service says it has persisted.
    pub fn advance_to(&mut self, offset: u64) -> Result<(), TransferError> {
        self.ensure_active()?;
        if offset < self.bytes_sent {
            return Err(TransferError::OffsetRegressed {
                current: self.bytes_sent,
                reported: offset,
            });
        }
        if offset > self.file_length {
            return Err(TransferError::OffsetBeyondEnd {
                offset,
                len: self.file_length,
            });
        }
        self.bytes_sent = offset;
        Ok(())
    }

    /// Marks the session complete with the identifier issued by the service.
    pub fn complete(&mut self, remote_id: impl Into<String>) -> Result<(), TransferError> {
        self.ensure_active()?;
        let remote_id = remote_id.into();
        if remote_id.is_empty() {
            return Err(TransferError::EmptyRemoteId);
        }
        self.bytes_sent = self.file_length;
        self.remote_id = Some(remote_id);
        self.status = SessionStatus::Complete;
        Ok(())
    }

    /// Marks the session failed. Has no effect on an already closed session.
    pub fn fail(&mut self, cause: impl Into<String>) {
        if self.status == SessionStatus::InProgress {
            self.failure = Some(cause.into());
            self.status = SessionStatus::Failed;
        }
    }

    fn ensure_active(&self) -> Result<(), TransferError> {
        match self.status {
            SessionStatus::InProgress => Ok(()),
            closed => Err(TransferError::SessionClosed(closed)),
        }
    }

    /// Opaque upload URI issued by the service.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn remaining(&self) -> u64 {
        self.file_length - self.bytes_sent
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}
