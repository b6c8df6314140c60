use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{ExtractError, TextExtractor, join_fragments};

/// OCR through the `tesseract` command line tool
pub struct TesseractExtractor {
    program: String,
    language: String,
}

impl TesseractExtractor {
    pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract(&self, image: &Path) -> Result<String, ExtractError> {
        let output = Command::new(&self.program)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = join_fragments(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(chars = text.len(), "tesseract finished");
        Ok(text)
    }
}
