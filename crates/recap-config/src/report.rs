use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_record_empty_captures() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory holding `combined_report_*.json` and `readable_report_*.txt`
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// Name used in the readable report, resolved from the environment when unset
    pub user_name: Option<String>,
    /// Append a record even when OCR found no text
    #[serde(default = "default_record_empty_captures")]
    pub record_empty_captures: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            user_name: None,
            record_empty_captures: default_record_empty_captures(),
        }
    }
}
