use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// RAII guard for a transient screenshot file
///
/// The file is removed when the guard is dropped, on success, error and panic alike.
#[derive(Debug)]
pub struct CaptureArtifact {
    path: PathBuf,
}

impl CaptureArtifact {
    /// Take ownership of an existing (or about to be written) file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reserve a unique `screenshot_<unix>_<id>.png` path inside `dir`
    pub fn allocate(dir: &Path) -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self::new(dir.join(format!("screenshot_{secs}_{}.png", &id[..8])))
    }

    /// Sibling path for a derived image, `<stem>_<suffix>.png`
    pub fn derive(&self, suffix: &str) -> Self {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenshot".to_string());
        Self::new(self.path.with_file_name(format!("{stem}_{suffix}.png")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CaptureArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed capture artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to remove capture artifact: {e}")
            }
        }
    }
}
