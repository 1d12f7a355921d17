//! Explicit configuration.
//!
//! Every size, tolerance and endpoint the flows depend on is a value
//! passed in at construction, loaded here from a TOML file:
//!
//! ```toml
//! [flow]
//! bitstring_length = 128
//! extractor_tolerance_bits = 8
//! embedding_model_id = "Facenet"
//!
//! [extractor]
//! failure_rate = 0.001
//!
//! [service]
//! base_url = "http://localhost:8080"
//! timeout_secs = 10
//!
//! [capture]
//! device_id = 0
//! ```

use crate::capture::{CaptureConfig, CaptureConfigError};
use crate::extractor::ExtractorParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid capture configuration: {0}")]
    Capture(#[from] CaptureConfigError),
}

/// Protocol configuration shared by enrollment and verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Bitstring length in bits: the embedding dimension rounded up to
    /// whole bytes.
    pub bitstring_length: usize,
    /// Hamming distance the extractor tolerates between readings.
    pub extractor_tolerance_bits: u32,
    /// Embedding model that produced the enrolled vectors.
    pub embedding_model_id: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            bitstring_length: 128,
            extractor_tolerance_bits: 8,
            embedding_model_id: "Facenet".to_string(),
        }
    }
}

impl FlowConfig {
    /// Bitstring length in bytes.
    pub fn bitstring_bytes(&self) -> usize {
        self.bitstring_length.div_ceil(8)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bitstring_length == 0 || self.bitstring_length % 8 != 0 {
            return Err(ConfigError::Invalid(format!(
                "bitstring_length {} must be a non-zero multiple of 8",
                self.bitstring_length
            )));
        }
        if self.embedding_model_id.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding_model_id is empty".into()));
        }
        Ok(())
    }
}

/// Tuning of the shipped extractor beyond what [`FlowConfig`] fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Key length in bytes; defaults to the bitstring length.
    pub key_length: Option<usize>,
    /// Acceptable probability of rejecting a reading within tolerance.
    pub failure_rate: f64,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            key_length: None,
            failure_rate: 0.001,
        }
    }
}

/// Credential service endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; `/enroll`, `/retrieve` and `/verify` are appended.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "service base_url '{}' must be an http(s) URL",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("service timeout_secs must be non-zero".into()));
        }
        Ok(())
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub extractor: ExtractorSettings,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flow.validate()?;
        self.service.validate()?;
        self.capture.validate()?;
        self.extractor_params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Parameters for the shipped extractor.
    pub fn extractor_params(&self) -> ExtractorParams {
        let params = ExtractorParams::new(
            self.flow.bitstring_bytes(),
            self.flow.extractor_tolerance_bits,
        )
        .with_failure_rate(self.extractor.failure_rate);

        match self.extractor.key_length {
            Some(len) => params.with_key_len(len),
            None => params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.flow.bitstring_bytes(), 16);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = FileConfig::from_toml_str(
            r#"
            [flow]
            bitstring_length = 512
            embedding_model_id = "ArcFace"

            [extractor]
            key_length = 32

            [service]
            base_url = "https://keys.example.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.flow.bitstring_length, 512);
        assert_eq!(config.flow.extractor_tolerance_bits, 8);
        assert_eq!(config.service.timeout_secs, 10);

        let params = config.extractor_params();
        assert_eq!(params.input_len, 64);
        assert_eq!(params.key_len, 32);
    }

    #[test]
    fn test_unaligned_bitstring_rejected() {
        let err = FileConfig::from_toml_str("[flow]\nbitstring_length = 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_url_rejected() {
        let err = FileConfig::from_toml_str("[service]\nbase_url = \"localhost:8080\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_tolerance_beyond_extractor_limit_rejected() {
        let err = FileConfig::from_toml_str("[flow]\nextractor_tolerance_bits = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = FileConfig::from_toml_str("[flow\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_capture_section_validated() {
        let err = FileConfig::from_toml_str("[capture]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Capture(_)));
    }
}
