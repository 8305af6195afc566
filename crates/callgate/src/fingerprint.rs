//! Deterministic argument fingerprinting for cache keys.
//!
//! SHA-256 over a canonical encoding: the sequence length as a
//! little-endian u64, then each argument word little-endian. Stable across
//! platforms and process restarts, so a persisted cache keeps its keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Collision-resistant digest of an argument sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArgFingerprint([u8; 32]);

impl ArgFingerprint {
    pub fn compute(args: &[u64]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((args.len() as u64).to_le_bytes());
        for arg in args {
            hasher.update(arg.to_le_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ArgFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "args:{}", self.to_hex())
    }
}
