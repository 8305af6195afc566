//! Timestamp-unit collaborator.
//!
//! The access gate buckets admissions by a coarse timestamp unit. The unit
//! source is a collaborator so tests can pin and advance time and deployments
//! can choose the bucket width.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Monotonic, coarse-grained unit source matching the rate-gate bucket width.
pub trait UnitClock {
    fn current_unit(&self) -> u64;
}

// ---------------------------------------------------------------------------
// FixedClock — manual advance, for tests and replay
// ---------------------------------------------------------------------------

/// Clock pinned to an explicit unit. Cloned handles share the same unit, so
/// a test can advance time while the gateway owns its own handle.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    unit: Arc<AtomicU64>,
}

impl FixedClock {
    pub fn new(start_unit: u64) -> Self {
        Self {
            unit: Arc::new(AtomicU64::new(start_unit)),
        }
    }

    pub fn set(&self, unit: u64) {
        self.unit.store(unit, Ordering::SeqCst);
    }

    pub fn advance(&self, units: u64) {
        self.unit.fetch_add(units, Ordering::SeqCst);
    }
}

impl UnitClock for FixedClock {
    fn current_unit(&self) -> u64 {
        self.unit.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// SystemUnitClock — wall clock bucketed by a configurable width
// ---------------------------------------------------------------------------

/// Default rate-gate bucket width in seconds.
pub const DEFAULT_BUCKET_SECS: u64 = 60;

/// Wall-clock unit source: seconds since the Unix epoch divided by the
/// bucket width.
#[derive(Debug, Clone, Copy)]
pub struct SystemUnitClock {
    bucket_secs: u64,
}

impl SystemUnitClock {
    /// A zero width is clamped to one second.
    pub fn new(bucket_secs: u64) -> Self {
        Self {
            bucket_secs: bucket_secs.max(1),
        }
    }

    pub fn bucket_secs(&self) -> u64 {
        self.bucket_secs
    }
}

impl Default for SystemUnitClock {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_SECS)
    }
}

impl UnitClock for SystemUnitClock {
    fn current_unit(&self) -> u64 {
        let secs = Utc::now().timestamp().max(0) as u64;
        secs / self.bucket_secs
    }
}
