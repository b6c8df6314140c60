use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use recap_config::Config;

const DEFAULT_CONFIG_FILE: &str = "config.json";

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Resolve the runtime config
///
/// An explicit path must exist. Otherwise `config.json` in the working directory
/// is used when present, and built-in defaults when not. Environment overrides
/// are applied last, then the result is validated.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            read_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => Config::default(),
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

/// Write the default config as pretty JSON, refusing to clobber an existing file
pub fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&Config::default())?)?;
    tracing::info!("Wrote default config to {}", path.display());
    Ok(())
}
