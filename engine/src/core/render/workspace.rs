//! Per-request scratch directory.
//!
//! Every file a render creates (input copy, overlay images, subtitle
//! document, engine output) lives in one uniquely named temp directory and is
//! tracked, so `cleanup()` can release all of it exactly once on every exit
//! path. `Drop` runs the same cleanup as a backstop.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

/// Temp directory and file set owned by one render
#[derive(Debug)]
pub struct RenderWorkspace {
    request_id: Uuid,
    dir: Option<TempDir>,
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl RenderWorkspace {
    /// Creates `reelcap-{request_id}-*` under `parent` (or the system temp dir).
    pub fn create(parent: Option<&Path>, request_id: Uuid) -> io::Result<Self> {
        let prefix = format!("reelcap-{}-", request_id);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        tracing::debug!(dir = %dir.path().display(), "Created render workspace");

        Ok(Self {
            request_id,
            root: dir.path().to_path_buf(),
            dir: Some(dir),
            files: Vec::new(),
        })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reserves a tracked path inside the workspace without creating it.
    pub fn track(&mut self, name: &str) -> PathBuf {
        let path = self.root.join(name);
        if !self.files.contains(&path) {
            self.files.push(path.clone());
        }
        path
    }

    /// Writes `bytes` to a tracked file named `name`.
    pub async fn write_file(&mut self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.track(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Files created so far that still exist on disk
    pub fn live_files(&self) -> Vec<PathBuf> {
        self.files.iter().filter(|p| p.exists()).cloned().collect()
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.dir.is_none()
    }

    /// Removes every tracked file and the directory. Idempotent.
    pub fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        for file in self.files.drain(..) {
            if let Err(e) = std::fs::remove_file(&file) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove temp file {}: {}", file.display(), e);
                }
            }
        }

        if let Err(e) = dir.close() {
            tracing::warn!("Failed to remove workspace {}: {}", self.root.display(), e);
        }
    }
}

impl Drop for RenderWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
