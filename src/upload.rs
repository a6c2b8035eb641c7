//! Intake of user files into the upload directory.
//!
//! The pipeline deletes the file it analyzes, so callers hand it a staged
//! copy rather than the user's own file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::detect_media_type;

/// Default maximum upload size (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub fn default_accepted_types() -> Vec<String> {
    vec!["application/pdf".to_string(), "text/plain".to_string()]
}

pub fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("pdf-analyzer").join("uploads")
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("File too large: {size} bytes (maximum {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Limits applied to incoming files.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    pub max_file_size: u64,
    pub accepted_types: Vec<String>,
    pub upload_dir: PathBuf,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_types: default_accepted_types(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl UploadPolicy {
    pub fn accepts(&self, media_type: &str) -> bool {
        self.accepted_types.iter().any(|t| t == media_type)
    }
}

/// Validate `src` and copy it into the upload directory under a fresh name.
///
/// Returns the path of the copy.
pub async fn stage_upload(src: &Path, policy: &UploadPolicy) -> Result<PathBuf, UploadError> {
    let meta = match tokio::fs::metadata(src).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Err(UploadError::NotFound(src.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound(src.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    if meta.len() > policy.max_file_size {
        return Err(UploadError::TooLarge {
            size: meta.len(),
            max: policy.max_file_size,
        });
    }

    let bytes = tokio::fs::read(src).await?;
    let media_type = detect_media_type(&bytes);
    if !policy.accepts(media_type) {
        return Err(UploadError::UnsupportedType(media_type.to_string()));
    }

    let ext = infer::get(&bytes)
        .map(|kind| kind.extension())
        .unwrap_or(if media_type == "text/plain" { "txt" } else { "bin" });

    tokio::fs::create_dir_all(&policy.upload_dir).await?;
    let dest = policy
        .upload_dir
        .join(format!("document-{}.{}", Uuid::new_v4(), ext));
    tokio::fs::write(&dest, &bytes).await?;

    info!(
        "Staged {} ({}, {} bytes) as {}",
        src.display(),
        media_type,
        bytes.len(),
        dest.display()
    );
    Ok(dest)
}
