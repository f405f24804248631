//! Strong type definitions for Gatepass.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::code::{CODE_BYTES, CODE_HEX_LEN};
use crate::error::CoreError;

/// Store-assigned identifier of a token record. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned identifier of a fund entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative money in whole currency units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Largest amount a single price or ledger entry may carry. Stored as a
    /// signed 64-bit integer.
    pub const MAX: Self = Self(i64::MAX as u64);

    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    pub const fn units(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `self`, or `fallback` when `self` is zero.
    pub const fn or_default_to(self, fallback: Amount) -> Amount {
        if self.0 == 0 {
            fallback
        } else {
            self
        }
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

/// The secret redemption string of a token.
///
/// Eight random bytes, rendered as a fixed-length lowercase hex string.
/// Immutable once issued and unique across the lifetime of the store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenCode([u8; CODE_BYTES]);

impl TokenCode {
    pub const fn from_bytes(bytes: [u8; CODE_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; CODE_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse an exact code string. Accepts upper or lower case hex.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if s.len() != CODE_HEX_LEN {
            return Err(CoreError::InvalidCode(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidCode(s.to_string()))?;
        let arr: [u8; CODE_BYTES] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidCode(s.to_string()))?;
        Ok(Self(arr))
    }

    /// Normalize whatever a scanner or operator typed into a code.
    ///
    /// Accepts a bare code or a full redemption URL
    /// (`https://host/verify/<code>`): the last path segment is taken and
    /// everything that is not alphanumeric is stripped. Returns `None` when
    /// the remainder is not a well-formed code.
    pub fn from_scan(raw: &str) -> Option<Self> {
        let segment = raw
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let cleaned: String = segment
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::from_hex(&cleaned).ok()
    }
}

impl fmt::Debug for TokenCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenCode({})", self.to_hex())
    }
}

impl fmt::Display for TokenCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TokenCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for TokenCode {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<TokenCode> for String {
    fn from(code: TokenCode) -> Self {
        code.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_hex_roundtrip() {
        let code = TokenCode::from_bytes([0x4a; CODE_BYTES]);
        let hex = code.to_hex();
        assert_eq!(hex, "4a4a4a4a4a4a4a4a");
        assert_eq!(TokenCode::from_hex(&hex).unwrap(), code);
    }

    #[test]
    fn test_code_rejects_wrong_length() {
        assert!(TokenCode::from_hex("abcd").is_err());
        assert!(TokenCode::from_hex("4a4a4a4a4a4a4a4a00").is_err());
        assert!(TokenCode::from_hex("zzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn test_from_scan_accepts_url_and_noise() {
        let code = TokenCode::from_bytes([0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);

        assert_eq!(TokenCode::from_scan("0123456789abcdef"), Some(code));
        assert_eq!(TokenCode::from_scan("  0123456789ABCDEF \n"), Some(code));
        assert_eq!(
            TokenCode::from_scan("https://gate.example/api/verify/0123456789abcdef"),
            Some(code)
        );
        assert_eq!(
            TokenCode::from_scan("https://gate.example/verify/0123456789abcdef/"),
            Some(code)
        );
        assert_eq!(TokenCode::from_scan("0123-4567-89ab-cdef"), Some(code));
    }

    #[test]
    fn test_from_scan_rejects_garbage() {
        assert_eq!(TokenCode::from_scan(""), None);
        assert_eq!(TokenCode::from_scan("////"), None);
        assert_eq!(TokenCode::from_scan("not-a-code"), None);
        assert_eq!(TokenCode::from_scan("https://gate.example/verify/"), None);
    }

    #[test]
    fn test_code_serializes_as_string() {
        let code = TokenCode::from_bytes([0xab; CODE_BYTES]);
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"abababababababab\"");
        let back: TokenCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn test_amount_default_fallback() {
        assert_eq!(Amount::ZERO.or_default_to(Amount(400)), Amount(400));
        assert_eq!(Amount(250).or_default_to(Amount(400)), Amount(250));
        assert_eq!(format!("{}", Amount(400)), "₹400");
    }
}
