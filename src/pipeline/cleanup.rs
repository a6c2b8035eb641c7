//! Ownership of the uploaded source file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Removes the uploaded file when the request ends.
///
/// [`release`](Self::release) deletes it asynchronously on the normal path;
/// `Drop` covers requests whose future is dropped or panics.
#[derive(Debug)]
pub struct UploadGuard {
    path: PathBuf,
    released: bool,
}

impl UploadGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. A file that is already gone is not an error.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed upload {} on drop", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_release_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.txt");
        std::fs::write(&path, "contenu").unwrap();

        UploadGuard::new(&path).release().await;
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.pdf");
        std::fs::write(&path, "%PDF").unwrap();

        drop(UploadGuard::new(&path));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_fine() {
        let dir = TempDir::new().unwrap();
        UploadGuard::new(dir.path().join("absent")).release().await;
    }
}
