//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

const MB: u64 = 1024 * 1024;

/// Main configuration for the invai pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvaiConfig {
    /// Intake filter applied before a batch starts.
    pub intake: IntakeConfig,

    /// Payload encoding limits.
    pub encoder: EncoderConfig,

    /// Batch scheduling.
    pub batch: BatchConfig,

    /// Extractor service settings.
    pub extractor: ExtractorConfig,

    /// Schema validation policy.
    pub validation: ValidationConfig,
}

/// Intake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Largest file accepted into a batch, in bytes.
    pub max_file_size: u64,

    /// Skip files whose type the intake does not accept (PDF, images, Excel).
    pub accepted_only: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * MB,
            accepted_only: true,
        }
    }
}

/// Encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Largest file the encoder will turn into a payload, in bytes.
    pub max_file_size: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * MB,
        }
    }
}

/// Batch orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Files processed concurrently in one window.
    pub window_size: usize,

    /// Extra attempts for a file whose extractor call failed.
    pub retry_attempts: u32,

    /// Delay between attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            retry_attempts: 0,
            retry_delay_ms: 1000,
        }
    }
}

/// Extractor service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Base URL of the generative language API.
    pub endpoint: String,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ExtractorConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Blank values count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Schema validation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject non-numeric values in numeric fields instead of reading them as zero.
    pub strict_numbers: bool,
}

impl InvaiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
