//! Camera capture configuration.

use serde::{Deserialize, Serialize};

/// Upper bound on the warm-up delay before the single read.
const MAX_WARMUP_MS: u64 = 10_000;

/// Configuration for camera capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Delay between opening the device and the single read, letting the
    /// sensor settle exposure.
    pub warmup_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            warmup_ms: 2000,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureConfigError::InvalidDimensions);
        }
        if self.warmup_ms > MAX_WARMUP_MS {
            return Err(CaptureConfigError::InvalidWarmup(self.warmup_ms));
        }
        Ok(())
    }
}

/// Capture configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("warm-up of {0} ms exceeds the 10000 ms limit")]
    InvalidWarmup(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(CaptureConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_excessive_warmup_invalid() {
        let config = CaptureConfig {
            warmup_ms: 60_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CaptureConfigError::InvalidWarmup(60_000))
        ));
    }
}
