use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "en".to_string()
}

fn default_tesseract_path() -> String {
    "tesseract".to_string()
}

fn default_tesseract_language() -> String {
    "eng".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    Tesseract,
    /// Windows.Media.Ocr, only available on Windows builds
    Windows,
}

impl Default for OcrEngineKind {
    fn default() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Tesseract
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: OcrEngineKind,
    /// BCP-47 tag for the Windows engine
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,
    #[serde(default = "default_tesseract_language")]
    pub tesseract_language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::default(),
            language: default_language(),
            tesseract_path: default_tesseract_path(),
            tesseract_language: default_tesseract_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
