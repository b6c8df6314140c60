use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_interval_secs() -> u64 {
    4 * 60
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_preprocess() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

/// Screenshot command for the current platform, `{path}` is replaced by the output file
fn default_command() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "macos") {
        &["screencapture", "-x", "{path}"]
    } else if cfg!(target_os = "windows") {
        &[
            "powershell",
            "-NoProfile",
            "-Command",
            "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
             $b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
             $i = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
             [System.Drawing.Graphics]::FromImage($i).CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size); \
             $i.Save('{path}')",
        ]
    } else {
        &["grim", "{path}"]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackend {
    /// External screenshot tool
    Command,
    /// In-process capture, needs the `native-capture` feature
    Native,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds between pipeline runs
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    pub backend: CaptureBackend,
    #[serde(default = "default_command")]
    pub command: Vec<String>,
    /// Where transient screenshots live until the cycle finishes
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Grayscale, contrast and sharpen before OCR
    #[serde(default = "default_preprocess")]
    pub preprocess: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            backend: CaptureBackend::Command,
            command: default_command(),
            temp_dir: default_temp_dir(),
            preprocess: default_preprocess(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
