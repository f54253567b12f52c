//! Run fingerprinting — deterministic identity for a completed run.
//!
//! The engine's determinism contract says identical input and config must
//! produce a byte-identical trade log. The fingerprint makes that checkable:
//! a BLAKE3 hash over the canonically serialized config + trade log. Two
//! runs agree iff their fingerprints agree.

use crate::domain::{BacktestConfig, Trade};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex BLAKE3 digest identifying one run's config + trade log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint(pub String);

impl RunFingerprint {
    /// Shortened prefix for directory names and log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RunFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint a trade log under its config.
///
/// Serialization is canonical: fixed top-level keys, struct fields in
/// declaration order, no maps with unstable iteration.
pub fn fingerprint_run(trades: &[Trade], config: &BacktestConfig) -> RunFingerprint {
    let canonical = serde_json::json!({
        "config": config,
        "trades": trades,
    });
    RunFingerprint(blake3::hash(canonical.to_string().as_bytes()).to_hex().to_string())
}
