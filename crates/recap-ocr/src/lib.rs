use std::path::{Path, PathBuf};

mod artifact;
mod capture;
mod preprocess;
mod tesseract;
#[cfg(windows)]
mod com;
#[cfg(windows)]
mod windows_ocr;

pub use artifact::CaptureArtifact;
pub use capture::CommandCapture;
#[cfg(feature = "native-capture")]
pub use capture::ScreenCapture;
pub use preprocess::{ImagePreprocessor, PreprocessError};
pub use tesseract::TesseractExtractor;
#[cfg(windows)]
pub use windows_ocr::WindowsOcrExtractor;

/// Produces a screenshot on disk
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    /// The returned artifact deletes its file when dropped
    async fn capture(&self) -> Result<CaptureArtifact, CaptureError>;
}

/// Turns an image file into recognized text
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Fragments are joined with single spaces in recognition order
    async fn extract(&self, image: &Path) -> Result<String, ExtractError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture command is empty")]
    EmptyCommand,

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("capture produced no image at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("native capture failed: {0}")]
    Native(String),

    #[error("capture task failed: {0}")]
    Join(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("OCR engine error: {0}")]
    Engine(String),

    #[error("OCR task failed: {0}")]
    Join(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Join recognized lines into one space-separated string, dropping blank lines
pub fn join_fragments(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_fragments() {
        assert_eq!(join_fragments("File  Edit\n\n  View \r\nHelp\n"), "File  Edit View Help");
        assert_eq!(join_fragments("\n \n"), "");
    }
}
