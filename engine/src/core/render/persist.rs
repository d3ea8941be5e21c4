//! Auto-save of finished renders.
//!
//! Best effort: a failure here is reported as a degraded step and never
//! fails the request.

use std::path::{Path, PathBuf};

use crate::core::Degraded;

/// `~/Desktop`, then `~/OneDrive/Desktop`
pub fn default_save_dirs() -> Vec<PathBuf> {
    match dirs::home_dir() {
        Some(home) => vec![
            home.join("Desktop"),
            home.join("OneDrive").join("Desktop"),
        ],
        None => Vec::new(),
    }
}

/// `exported_video_{unix_seconds}.mp4`
pub fn export_file_name(unix_seconds: i64) -> String {
    format!("exported_video_{}.mp4", unix_seconds)
}

/// Copies `output` into the first existing directory of `candidates`.
///
/// Returns the saved path, or a degraded `None` when no directory exists or
/// the copy fails.
pub async fn persist_output(output: &Path, candidates: &[PathBuf]) -> Degraded<Option<PathBuf>> {
    let Some(dir) = candidates.iter().find(|d| d.is_dir()) else {
        tracing::warn!("Could not find a valid save folder");
        return Degraded::Fallback {
            value: None,
            reason: "no save directory exists".to_string(),
        };
    };

    let target = dir.join(export_file_name(chrono::Utc::now().timestamp()));
    match tokio::fs::copy(output, &target).await {
        Ok(_) => {
            tracing::info!("Video saved to {}", target.display());
            Degraded::Ok(Some(target))
        }
        Err(e) => {
            tracing::error!("Could not save video to {}: {}", target.display(), e);
            Degraded::Fallback {
                value: None,
                reason: format!("failed to copy to {}: {}", target.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(1_700_000_000), "exported_video_1700000000.mp4");
    }

    #[test]
    fn test_default_save_dirs_order() {
        let dirs = default_save_dirs();
        if let [desktop, onedrive] = dirs.as_slice() {
            assert!(desktop.ends_with("Desktop"));
            assert!(onedrive.ends_with("OneDrive/Desktop"));
        }
    }

    #[tokio::test]
    async fn test_persist_uses_first_existing_dir() {
        let src_dir = TempDir::new().unwrap();
        let output = src_dir.path().join("output.mp4");
        std::fs::write(&output, b"rendered").unwrap();

        let save_dir = TempDir::new().unwrap();
        let candidates = vec![
            PathBuf::from("/definitely/missing/Desktop"),
            save_dir.path().to_path_buf(),
        ];

        let result = persist_output(&output, &candidates).await;
        assert!(!result.is_degraded());

        let saved = result.into_value().unwrap();
        assert!(saved.starts_with(save_dir.path()));
        assert!(saved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("exported_video_"));
        assert_eq!(std::fs::read(saved).unwrap(), b"rendered");
    }

    #[tokio::test]
    async fn test_persist_without_candidates_is_degraded() {
        let result = persist_output(Path::new("/tmp/x.mp4"), &[]).await;
        assert!(result.is_degraded());
        assert_eq!(*result.value(), None);
    }

    #[tokio::test]
    async fn test_persist_copy_failure_is_degraded() {
        let save_dir = TempDir::new().unwrap();
        let result = persist_output(
            Path::new("/definitely/missing/output.mp4"),
            &[save_dir.path().to_path_buf()],
        )
        .await;
        assert!(result.is_degraded());
        assert!(result.reason().unwrap().contains("failed to copy"));
    }
}
