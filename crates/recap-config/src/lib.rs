use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use self::capture::{CaptureBackend, CaptureConfig};
use self::ocr::{OcrConfig, OcrEngineKind};
use self::report::ReportConfig;
use self::server::ServerConfig;
use self::summarizer::{SummarizerConfig, SummarizerProvider};

pub mod capture;
pub mod ocr;
pub mod report;
pub mod server;
pub mod summarizer;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("capture interval must be at least one second")]
    ZeroInterval,

    #[error("capture command is empty")]
    EmptyCaptureCommand,

    #[error("summary min_length {min} exceeds max_length {max}")]
    InvertedSummaryBounds { min: u32, max: u32 },

    #[error("invalid value '{value}' for {key}")]
    InvalidOverride { key: &'static str, value: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
    pub capture: CaptureConfig,
    pub ocr: OcrConfig,
    pub summarizer: SummarizerConfig,
    pub server: ServerConfig,
    pub log_format: LogFormat,
}

impl Config {
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source, the environment in production
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup("RECAP_REPORT_DIR") {
            self.report.dir = PathBuf::from(dir);
        }
        if let Some(user) = lookup("RECAP_USER") {
            self.report.user_name = Some(user);
        }
        if let Some(v) = lookup("RECAP_RECORD_EMPTY") {
            self.report.record_empty_captures = parse_bool("RECAP_RECORD_EMPTY", &v)?;
        }
        if let Some(v) = lookup("RECAP_INTERVAL_SECS") {
            self.capture.interval_secs = v.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "RECAP_INTERVAL_SECS",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("RECAP_CAPTURE_BACKEND") {
            self.capture.backend = match v.to_lowercase().as_str() {
                "command" => CaptureBackend::Command,
                "native" => CaptureBackend::Native,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        key: "RECAP_CAPTURE_BACKEND",
                        value: v,
                    });
                }
            };
        }
        if let Some(v) = lookup("RECAP_CAPTURE_COMMAND") {
            self.capture.command = v.split_whitespace().map(str::to_string).collect();
        }
        if let Some(v) = lookup("RECAP_OCR_ENGINE") {
            self.ocr.engine = match v.to_lowercase().as_str() {
                "tesseract" => OcrEngineKind::Tesseract,
                "windows" => OcrEngineKind::Windows,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        key: "RECAP_OCR_ENGINE",
                        value: v,
                    });
                }
            };
        }
        if let Some(v) = lookup("RECAP_OCR_LANGUAGE") {
            self.ocr.language = v;
        }
        if let Some(v) = lookup("RECAP_SUMMARIZER") {
            self.summarizer.provider = match v.to_lowercase().as_str() {
                "huggingface" => SummarizerProvider::HuggingFace,
                "extractive" => SummarizerProvider::Extractive,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        key: "RECAP_SUMMARIZER",
                        value: v,
                    });
                }
            };
        }
        if let Some(key) = lookup("RECAP_SUMMARIZER_API_KEY").or_else(|| lookup("HF_API_TOKEN")) {
            self.summarizer.api_key = key;
        }
        if let Some(v) = lookup("RECAP_GRAMMAR") {
            self.summarizer.grammar.enabled = parse_bool("RECAP_GRAMMAR", &v)?;
        }
        if let Some(bind) = lookup("RECAP_BIND") {
            self.server.bind = bind;
        }
        if let Some(v) = lookup("RECAP_LOG_FORMAT") {
            self.log_format = match v.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        key: "RECAP_LOG_FORMAT",
                        value: v,
                    });
                }
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.capture.backend == CaptureBackend::Command && self.capture.command.is_empty() {
            return Err(ConfigError::EmptyCaptureCommand);
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            return Err(ConfigError::InvertedSummaryBounds {
                min: self.summarizer.min_length,
                max: self.summarizer.max_length,
            });
        }
        Ok(())
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidOverride {
            key,
            value: value.to_string(),
        }),
    }
}
