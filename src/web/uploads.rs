use std::path::{Path, PathBuf};

use sanitize_filename::Options;
use thiserror::Error;

use crate::web::submission::UploadedFile;

// Used when nothing of the client-supplied name survives sanitization.
const FALLBACK_STEM: &str = "upload";

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to create upload directory {}: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write upload {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Metadata describing a stored upload on disk.
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: PathBuf,
    pub file_size: u64,
}

/// Ensures the destination directory exists.
pub async fn ensure_directory(path: &Path) -> UploadResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| UploadError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })
}

/// Reduce a client-supplied filename to a bare name that is safe to join onto a directory.
///
/// Path separators become word breaks, runs of whitespace collapse to `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped and leading/trailing dots and underscores are trimmed, so
/// `../../etc/passwd` comes out as `etc_passwd`. Reserved device names and over-long names
/// are then handled by `sanitize_filename`.
pub fn secure_filename(original: &str) -> String {
    let flattened = original.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    let sanitized = sanitize_filename::sanitize_with_options(
        trimmed,
        Options {
            windows: true,
            truncate: true,
            replacement: "",
        },
    );

    if sanitized.is_empty() {
        let extension = Path::new(trimmed)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty());
        return match extension {
            Some(ext) => format!("{FALLBACK_STEM}.{ext}"),
            None => FALLBACK_STEM.to_string(),
        };
    }

    sanitized
}

/// Write an uploaded file into `dest_dir` under its sanitized name.
///
/// There is no collision check: a later upload with the same sanitized name replaces the
/// earlier one.
pub async fn save_upload(file: &UploadedFile, dest_dir: &Path) -> UploadResult<SavedFile> {
    ensure_directory(dest_dir).await?;

    let stored_name = secure_filename(&file.original_name);
    let stored_path = dest_dir.join(&stored_name);

    tokio::fs::write(&stored_path, &file.bytes)
        .await
        .map_err(|source| UploadError::Write {
            path: stored_path.clone(),
            source,
        })?;

    Ok(SavedFile {
        original_name: file.original_name.clone(),
        stored_name,
        stored_path,
        file_size: file.bytes.len() as u64,
    })
}
