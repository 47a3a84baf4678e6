//! Engine configuration via `atomdoc.toml`
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. `write_default_if_missing` drops a commented template next
//! to the service's data so operators can see every knob.

use atomdoc_core::{Error, Limits, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "atomdoc.toml";

// ============================================================================
// Retry Configuration
// ============================================================================

/// Conflict retry behavior for single-key updates
///
/// A conflicting `put` restarts the whole get-mutate-put sequence for that
/// key. After `max_retries` restarts the `Conflict` is surfaced.
///
/// # Example
///
/// ```
/// use atomdoc_engine::RetryConfig;
///
/// let retry = RetryConfig::new().with_max_retries(5).with_max_delay_ms(20);
/// assert_eq!(retry.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 50,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub(crate) fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

// ============================================================================
// Engine Configuration
// ============================================================================

/// Engine configuration loaded from `atomdoc.toml`.
///
/// # Example
///
/// ```toml
/// parallel_group_updates = false
///
/// [retry]
/// max_retries = 3
///
/// [limits]
/// max_nesting_depth = 128
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Dispatch per-key updates of a group update on the rayon pool
    pub parallel_group_updates: bool,
    /// Conflict retry policy
    pub retry: RetryConfig,
    /// Document and path size limits
    pub limits: Limits,
}

impl EngineConfig {
    /// Enable or disable parallel group dispatch
    pub fn with_parallel_group_updates(mut self, parallel: bool) -> Self {
        self.parallel_group_updates = parallel;
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Check values that deserialize fine but cannot work
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_nesting_depth == 0 {
            return Err(Error::invalid_config(
                "limits.max_nesting_depth must be at least 1",
            ));
        }
        if self.limits.max_path_length == 0 {
            return Err(Error::invalid_config(
                "limits.max_path_length must be at least 1",
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::invalid_config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# atomdoc engine configuration

# Run the per-key updates of a group update on a thread pool (default: false).
# Each key stays atomic; there is no ordering between keys either way.
parallel_group_updates = false

[retry]
# Restarts of get-mutate-put after a write conflict on the same key.
max_retries = 3
# Exponential backoff between restarts, capped at max_delay_ms.
base_delay_ms = 1
max_delay_ms = 50

[limits]
max_nesting_depth = 128
max_path_length = 256
max_string_bytes = 16777216
max_bytes_len = 16777216
max_list_len = 1000000
max_map_entries = 1000000
"#
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the text does not parse or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::invalid_config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
