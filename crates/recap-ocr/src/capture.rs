use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{CaptureArtifact, CaptureError, ImageSource};

/// Placeholder replaced by the screenshot path in command arguments
const PATH_PLACEHOLDER: &str = "{path}";

/// Capture through an external screenshot tool (`grim`, `screencapture`, `scrot`, ...)
pub struct CommandCapture {
    argv: Vec<String>,
    output_dir: PathBuf,
}

impl CommandCapture {
    pub fn new(argv: Vec<String>, output_dir: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        if argv.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(CaptureError::EmptyCommand);
        }

        Ok(Self {
            argv,
            output_dir: output_dir.into(),
        })
    }
}

#[async_trait]
impl ImageSource for CommandCapture {
    async fn capture(&self) -> Result<CaptureArtifact, CaptureError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        // Guard exists before the tool runs so a partial file is still removed
        let artifact = CaptureArtifact::allocate(&self.output_dir);
        let path = artifact.path().to_string_lossy().into_owned();

        let program = &self.argv[0];
        let args: Vec<String> = self.argv[1..]
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect();

        tracing::debug!(%program, ?args, "running capture command");

        let output = Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CaptureError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::CommandFailed {
                program: program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(artifact.path()).await.unwrap_or(false) {
            return Err(CaptureError::MissingOutput(artifact.path().to_path_buf()));
        }

        Ok(artifact)
    }
}

/// Capture the primary monitor in-process
#[cfg(feature = "native-capture")]
pub struct ScreenCapture {
    output_dir: PathBuf,
}

#[cfg(feature = "native-capture")]
impl ScreenCapture {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[cfg(feature = "native-capture")]
fn capture_primary_screen() -> Result<Vec<u8>, CaptureError> {
    use xcap::Monitor;
    use xcap::image::ImageEncoder;

    let monitors = Monitor::all().map_err(|e| CaptureError::Native(e.to_string()))?;
    let monitor = monitors
        .first()
        .ok_or_else(|| CaptureError::Native("No monitor found".to_string()))?;

    let image = monitor
        .capture_image()
        .map_err(|e| CaptureError::Native(e.to_string()))?;

    let mut buffer = Vec::new();
    xcap::image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            xcap::image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| CaptureError::Native(format!("Failed to encode PNG: {e}")))?;
    Ok(buffer)
}

#[cfg(feature = "native-capture")]
#[async_trait]
impl ImageSource for ScreenCapture {
    async fn capture(&self) -> Result<CaptureArtifact, CaptureError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let artifact = CaptureArtifact::allocate(&self.output_dir);

        let png = tokio::task::spawn_blocking(capture_primary_screen)
            .await
            .map_err(|e| CaptureError::Join(e.to_string()))??;

        tracing::debug!(bytes = png.len(), "captured primary screen");
        tokio::fs::write(artifact.path(), png).await?;
        Ok(artifact)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandCapture::new(vec![], "/tmp"),
            Err(CaptureError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_capture_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new(sh("printf png > '{path}'"), dir.path()).unwrap();

        let artifact = capture.capture().await.unwrap();
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"png");

        let path = artifact.path().to_path_buf();
        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_command_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let capture =
            CommandCapture::new(sh("printf partial > '{path}'; exit 3"), dir.path()).unwrap();

        let err = capture.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::CommandFailed { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_output_detected() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new(sh("true"), dir.path()).unwrap();
        assert!(matches!(
            capture.capture().await,
            Err(CaptureError::MissingOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let capture =
            CommandCapture::new(vec!["recap-no-such-tool".to_string()], dir.path()).unwrap();
        assert!(matches!(
            capture.capture().await,
            Err(CaptureError::Spawn { .. })
        ));
    }
}
