//! Deterministic code sources.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use gatepass_core::{CodeSource, TokenCode, CODE_BYTES};

/// Reproducible codes from a seeded PRNG.
pub struct SeededCodeSource {
    rng: Mutex<StdRng>,
}

impl SeededCodeSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CodeSource for SeededCodeSource {
    fn next_code(&self) -> TokenCode {
        let mut bytes = [0u8; CODE_BYTES];
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.fill_bytes(&mut bytes);
        TokenCode::from_bytes(bytes)
    }
}

/// Hands out a fixed script of codes first, then falls back to seeded ones.
///
/// Scripting a code that already exists in the store forces a collision.
pub struct ScriptedCodeSource {
    script: Mutex<VecDeque<TokenCode>>,
    fallback: SeededCodeSource,
}

impl ScriptedCodeSource {
    pub fn new(script: impl IntoIterator<Item = TokenCode>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: SeededCodeSource::new(0x6a7e_9a55),
        }
    }

    /// How many scripted codes have not been handed out yet.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl CodeSource for ScriptedCodeSource {
    fn next_code(&self) -> TokenCode {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| self.fallback.next_code())
    }
}

/// Always returns the same code. Every draw after the first collides.
pub struct StuckCodeSource(pub TokenCode);

impl CodeSource for StuckCodeSource {
    fn next_code(&self) -> TokenCode {
        self.0
    }
}
