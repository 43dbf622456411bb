//! Job providers: turn user input into a list of [`UploadJob`]s.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use tubelift_protocol::{PrivacyStatus, VideoMetadata};

use crate::error::UploadError;
use crate::media::{parse_tags, scan_video_files};
use crate::types::UploadJob;

/// Source of upload jobs.
pub trait JobProvider {
    fn jobs(&self) -> Result<Vec<UploadJob>, UploadError>;
}

/// Metadata shared by every file of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTemplate {
    pub title: String,
    pub description: String,
    /// Comma-separated keywords.
    pub keywords: String,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
}

impl MetadataTemplate {
    /// Builds the metadata for one file of a `batch_size`-file batch.
    ///
    /// A lone file keeps the title as given; in a larger batch the file stem
    /// is appended so titles stay distinct.
    pub fn for_file(&self, path: &Path, batch_size: usize) -> VideoMetadata {
        let title = if batch_size <= 1 {
            self.title.clone()
        } else {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{} - {stem}", self.title)
        };

        VideoMetadata {
            title,
            description: self.description.clone(),
            tags: parse_tags(&self.keywords),
            category_id: self.category_id.clone(),
            privacy_status: self.privacy_status,
        }
    }

    fn jobs_for(&self, paths: Vec<PathBuf>) -> Vec<UploadJob> {
        let batch_size = paths.len();
        paths
            .into_iter()
            .map(|path| UploadJob {
                metadata: self.for_file(&path, batch_size),
                path,
            })
            .collect()
    }
}

/// Jobs from explicitly named files.
pub struct FileListProvider {
    paths: Vec<PathBuf>,
    template: MetadataTemplate,
    strict: bool,
}

impl FileListProvider {
    /// A single file. A missing file is an error.
    pub fn single(path: impl Into<PathBuf>, template: MetadataTemplate) -> Self {
        Self {
            paths: vec![path.into()],
            template,
            strict: true,
        }
    }

    /// Several files. Missing entries are skipped with a warning.
    pub fn many(paths: Vec<PathBuf>, template: MetadataTemplate) -> Self {
        Self {
            paths,
            template,
            strict: false,
        }
    }
}

impl JobProvider for FileListProvider {
    fn jobs(&self) -> Result<Vec<UploadJob>, UploadError> {
        let mut existing = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            if path.is_file() {
                existing.push(path.clone());
            } else if self.strict {
                return Err(UploadError::FileNotFound(path.clone()));
            } else {
                warn!(path = %path.display(), "file not found, skipping");
            }
        }

        if existing.is_empty() {
            return Err(UploadError::NoJobs("none of the given files exist".into()));
        }
        Ok(self.template.jobs_for(existing))
    }
}

/// Jobs for every video file directly inside a directory.
pub struct DirectoryProvider {
    dir: PathBuf,
    template: MetadataTemplate,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>, template: MetadataTemplate) -> Self {
        Self {
            dir: dir.into(),
            template,
        }
    }
}

impl JobProvider for DirectoryProvider {
    fn jobs(&self) -> Result<Vec<UploadJob>, UploadError> {
        let files = scan_video_files(&self.dir)?;
        debug!(dir = %self.dir.display(), count = files.len(), "scanned for video files");

        if files.is_empty() {
            return Err(UploadError::NoJobs(format!(
                "no video files in {}",
                self.dir.display()
            )));
        }
        Ok(self.template.jobs_for(files))
    }
}
