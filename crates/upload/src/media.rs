//! Video file discovery and content-type detection.

use std::path::{Path, PathBuf};

use tubelift_protocol::constants::FALLBACK_CONTENT_TYPE;

use crate::error::UploadError;

/// Extensions (lowercase) recognised as video files.
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

/// Detects the media content type from a file extension (case-insensitive).
pub fn detect_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("wmv") => "video/x-ms-wmv",
        Some("flv") => "video/x-flv",
        Some("webm") => "video/webm",
        Some("m4v") => "video/x-m4v",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Returns `true` if the path has a known video extension.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(e)))
}

/// Lists video files directly inside `dir`, sorted by path.
///
/// Symlinks are followed; dangling links are skipped.
pub fn scan_video_files(dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Parses a comma-separated keyword string into trimmed, non-empty tags.
pub fn parse_tags(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// File name used in logs and results.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detect_content_type_known() {
        assert_eq!(detect_content_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(detect_content_type(Path::new("a.mov")), "video/quicktime");
        assert_eq!(detect_content_type(Path::new("a.mkv")), "video/x-matroska");
        assert_eq!(detect_content_type(Path::new("a.webm")), "video/webm");
    }

    #[test]
    fn detect_content_type_case_insensitive() {
        assert_eq!(detect_content_type(Path::new("CLIP.MP4")), "video/mp4");
        assert_eq!(detect_content_type(Path::new("Clip.Avi")), "video/x-msvideo");
    }

    #[test]
    fn detect_content_type_fallback() {
        assert_eq!(detect_content_type(Path::new("notes.txt")), FALLBACK_CONTENT_TYPE);
        assert_eq!(detect_content_type(Path::new("noext")), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn scan_finds_only_videos_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.mp4"), b"B").unwrap();
        fs::write(dir.path().join("a.MOV"), b"A").unwrap();
        fs::write(dir.path().join("readme.txt"), b"R").unwrap();
        fs::create_dir(dir.path().join("nested.mp4")).unwrap();
        fs::write(dir.path().join("c.webm"), b"C").unwrap();

        let files = scan_video_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.MOV", "b.mp4", "c.webm"]);
    }

    #[test]
    fn scan_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.mp4"), b"D").unwrap();
        assert!(scan_video_files(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let target = store.path().join("raw.mp4");
        fs::write(&target, b"V").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linked.mp4")).unwrap();
        std::os::unix::fs::symlink(store.path().join("gone.mp4"), dir.path().join("dangling.mp4"))
            .unwrap();

        let files = scan_video_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("linked.mp4")]);
    }

    #[test]
    fn scan_missing_dir_fails() {
        assert!(scan_video_files(Path::new("/nonexistent/videos")).is_err());
    }

    #[test]
    fn parse_tags_trims_and_drops_empty() {
        assert_eq!(parse_tags("  travel ,beach,, sun "), vec!["travel", "beach", "sun"]);
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ").is_empty());
    }
}
