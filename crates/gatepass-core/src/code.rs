//! Redemption code generation.
//!
//! Codes are drawn from the operating system CSPRNG. Uniqueness against
//! codes already issued is enforced by the store; this module only produces
//! candidates.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::types::TokenCode;

/// Random bytes per code (64 bits of entropy).
pub const CODE_BYTES: usize = 8;

/// Length of the hex rendering of a code.
pub const CODE_HEX_LEN: usize = CODE_BYTES * 2;

/// A source of candidate redemption codes.
pub trait CodeSource: Send + Sync {
    /// Draw one candidate code.
    fn next_code(&self) -> TokenCode;

    /// Draw `count` candidates.
    fn next_codes(&self, count: usize) -> Vec<TokenCode> {
        (0..count).map(|_| self.next_code()).collect()
    }
}

/// Code source backed by the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsCodeSource;

impl CodeSource for OsCodeSource {
    fn next_code(&self) -> TokenCode {
        let mut bytes = [0u8; CODE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        TokenCode::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_os_codes_are_fixed_length_hex() {
        let source = OsCodeSource;
        for code in source.next_codes(32) {
            let hex = code.to_hex();
            assert_eq!(hex.len(), CODE_HEX_LEN);
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_os_codes_do_not_repeat() {
        let codes: HashSet<_> = OsCodeSource.next_codes(10_000).into_iter().collect();
        assert_eq!(codes.len(), 10_000);
    }
}
