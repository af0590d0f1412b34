//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use invai_core::{BatchProcessor, GeminiClient, InvaiConfig};

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invai")
        .join("config.json")
}

/// Configuration file in effect: the `--config` path, else the default path.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration from `--config`, the default location if it exists, or
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvaiConfig> {
    if let Some(path) = config_path {
        return Ok(InvaiConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading configuration from {}", path.display());
        Ok(InvaiConfig::from_file(&path)?)
    } else {
        Ok(InvaiConfig::default())
    }
}

/// Build a processor backed by the configured extractor service.
pub fn build_processor(config: &InvaiConfig) -> anyhow::Result<BatchProcessor> {
    let client = GeminiClient::new(&config.extractor)?;
    debug!("Using model {}", client.model());
    Ok(BatchProcessor::new(Box::new(client), config))
}
