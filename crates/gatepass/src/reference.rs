//! Redemption references: what gets encoded into the printed QR image.

use serde::{Deserialize, Serialize};
use std::fmt;

use gatepass_core::TokenCode;

/// Canonical scannable reference for one token: `{base_url}/verify/{code}`.
///
/// Feeding `url` back through `TokenCode::from_scan` yields `code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedemptionRef {
    pub code: TokenCode,
    pub url: String,
}

impl RedemptionRef {
    pub fn new(base_url: &str, code: TokenCode) -> Self {
        Self {
            code,
            url: format!("{}/verify/{}", base_url.trim_end_matches('/'), code),
        }
    }
}

impl fmt::Display for RedemptionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
