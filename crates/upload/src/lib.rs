//! Resumable video upload engine.
//!
//! This crate holds the upload **business logic** and has no HTTP
//! dependency: callers provide an [`UploadTransport`] implementation
//! (the `tubelift-youtube` client in production, scripted mocks in tests).
//!
//! # Pipeline
//!
//! 1. **Jobs**: a [`JobProvider`] resolves files and metadata
//! 2. **Init**: [`initialize_session`] opens a resumable session
//! 3. **Transfer**: [`TransferDriver`] sends chunks, retrying with backoff
//! 4. **Batch**: [`UploadOrchestrator`] runs files in order and reports results

pub mod driver;
pub mod error;
pub mod initializer;
pub mod media;
pub mod orchestrator;
pub mod provider;
pub mod transport;
pub mod types;

pub use driver::TransferDriver;
pub use error::{FailureClass, NetworkErrorKind, TransportError, UploadError};
pub use initializer::{PreparedUpload, initialize_session};
pub use media::{VIDEO_EXTENSIONS, detect_content_type, is_video_file, parse_tags, scan_video_files};
pub use orchestrator::UploadOrchestrator;
pub use provider::{DirectoryProvider, FileListProvider, JobProvider, MetadataTemplate};
pub use transport::{ChunkResponse, SessionRequest, TransportFuture, UploadTransport};
pub use types::{
    BatchSummary, DriverConfig, UploadEvent, UploadJob, UploadOutcome, UploadResult,
};
