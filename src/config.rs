//! Runtime configuration for the backend and router services.
//!
//! Binaries fill these from command-line flags and environment variables;
//! library code only ever sees the validated structs.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::script::Script;

/// Upload bodies larger than this are refused with 413.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Adaptive threshold and region filtering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Odd neighbourhood size of the Gaussian-weighted local mean.
    pub block_size: u32,
    /// How much darker than the local mean a pixel must be to count as ink.
    pub offset: u8,
    /// Regions with a smaller bounding-box area are dropped. 0 keeps all.
    pub min_region_area: u64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        SegmentationConfig { block_size: 11, offset: 2, min_region_area: 0 }
    }
}

impl SegmentationConfig {
    /// Gaussian sigma for a kernel of `block_size` taps, using the usual
    /// `0.3 * ((k - 1) / 2 - 1) + 0.8` rule.
    pub fn gaussian_sigma(&self) -> f32 {
        0.3 * ((self.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(ConfigError::invalid(format!(
                "block size must be odd and at least 3, got {}",
                self.block_size
            )));
        }
        Ok(())
    }
}

/// What the recognizer does when a single region cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RegionFailurePolicy {
    /// Emit the unrecognized marker for that region and keep going.
    #[default]
    Sentinel,
    /// Fail the whole request.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognizerConfig {
    pub segmentation: SegmentationConfig,
    pub on_region_failure: RegionFailurePolicy,
}

impl RecognizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segmentation.validate()
    }
}

/// One backend process: one script, one model.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub script: Script,
    pub bind: SocketAddr,
    pub recognizer: RecognizerConfig,
    pub max_upload_bytes: usize,
}

impl BackendConfig {
    pub fn new(script: Script) -> Self {
        BackendConfig {
            script,
            bind: SocketAddr::from(([0, 0, 0, 0], script.default_port())),
            recognizer: RecognizerConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.recognizer.validate()?;
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid("upload limit must be positive"));
        }
        Ok(())
    }
}

/// Bounded retry for transport failures. `max_attempts == 1` means no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 1, backoff: Duration::from_millis(200) }
    }
}

impl RetryPolicy {
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt.saturating_sub(1)
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub bind: SocketAddr,
    pub decimal_endpoint: String,
    pub devanagari_endpoint: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub max_upload_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            bind: SocketAddr::from(([0, 0, 0, 0], 5300)),
            decimal_endpoint: "http://decimal:5100/api/predict".into(),
            devanagari_endpoint: "http://devanagari:5200/api/predict".into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl RouterConfig {
    pub fn endpoint(&self, script: Script) -> &str {
        match script {
            Script::Decimal => &self.decimal_endpoint,
            Script::Devanagari => &self.devanagari_endpoint,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for script in Script::ALL {
            let endpoint = self.endpoint(script);
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::invalid(format!(
                    "{} endpoint must be an http(s) URL, got '{}'",
                    script, endpoint
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("backend timeout must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry attempts must be at least 1"));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid("upload limit must be positive"));
        }
        Ok(())
    }
}
