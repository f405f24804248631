//! Engine configuration.
//!
//! A plain struct with defaults. Hosts either build one directly, embed it
//! in their own config file (it is serde-friendly), or load it from the
//! environment with [`GatepassConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::env;

use gatepass_core::{Amount, MAX_BATCH_SIZE};

/// Price written at assignment when the caller omits one or passes zero.
pub const DEFAULT_PRICE: Amount = Amount(400);

/// Public address the redemption references point at.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Fresh draws allowed per code before generation gives up.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 8;

/// What `generate_batch` does when tokens already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPolicy {
    /// New batches are added to the pool.
    #[default]
    Append,
    /// Only one batch may ever exist; later calls fail with
    /// `TokensAlreadyExist`.
    SingleActiveBatch,
}

/// Configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatepassConfig {
    /// Fallback price for `assign` and `assign_next`.
    pub default_price: Amount,
    /// Batch generation policy.
    pub generation_policy: GenerationPolicy,
    /// Base for `{base_url}/verify/{code}`. No trailing slash.
    pub base_url: String,
    /// Largest batch accepted. Never above 10 000.
    pub max_batch: u32,
    /// Retry budget per colliding code.
    pub max_code_attempts: u32,
}

impl Default for GatepassConfig {
    fn default() -> Self {
        Self {
            default_price: DEFAULT_PRICE,
            generation_policy: GenerationPolicy::Append,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_batch: MAX_BATCH_SIZE,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }
}

impl GatepassConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GATEPASS_BASE_URL`
    /// - `GATEPASS_DEFAULT_PRICE`
    /// - `GATEPASS_SINGLE_BATCH` (`true`/`1` selects the single-batch policy)
    /// - `GATEPASS_MAX_CODE_ATTEMPTS`
    ///
    /// Missing or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let generation_policy = match lookup("GATEPASS_SINGLE_BATCH").as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("yes") => GenerationPolicy::SingleActiveBatch,
            _ => GenerationPolicy::Append,
        };

        Self {
            default_price: lookup("GATEPASS_DEFAULT_PRICE")
                .and_then(|s| s.trim().parse().ok())
                .map(Amount)
                .unwrap_or(defaults.default_price),
            generation_policy,
            base_url: lookup("GATEPASS_BASE_URL")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.base_url),
            max_batch: defaults.max_batch,
            max_code_attempts: lookup("GATEPASS_MAX_CODE_ATTEMPTS")
                .and_then(|s| s.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_code_attempts),
        }
        .normalized()
    }

    /// Clamp and trim fields into their valid ranges.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_batch = self.max_batch.min(MAX_BATCH_SIZE);
        self.max_code_attempts = self.max_code_attempts.max(1);
        let trimmed = self.base_url.trim_end_matches('/').len();
        self.base_url.truncate(trimmed);
        self
    }
}
