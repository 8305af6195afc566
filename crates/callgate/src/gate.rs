//! Two-tier admission control: per-caller and global rate limiting with an
//! adaptive global ceiling and a trusted-role bypass.
//!
//! Admissions are bucketed per timestamp unit: a bucket resets exactly on a
//! unit boundary, not over a sliding window. Per-caller state stays at O(1),
//! and a burst of up to twice the limit can straddle a unit boundary.
//!
//! The gate answers with a boolean permit only and never raises; callers
//! translate a deny into their own rate-limit failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audit::{fields, AuditKind, AuditSink};
use crate::ident::CallerId;
use crate::roles::RoleStore;

/// Default per-caller admissions per timestamp unit.
pub const DEFAULT_PER_CALLER_LIMIT: u64 = 10;

/// Default starting value for the adaptive global ceiling.
pub const DEFAULT_GLOBAL_LIMIT: u64 = 100;

/// Count within the current unit plus the unit it was observed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RateBucket {
    count: u64,
    last_unit: u64,
}

impl RateBucket {
    /// Admit one event at `now_unit` against `limit`. Returns the admission
    /// decision and updates the bucket in place.
    fn admit(&mut self, now_unit: u64, limit: u64) -> bool {
        if self.last_unit == now_unit {
            if self.count >= limit {
                return false;
            }
            self.count = self.count.saturating_add(1);
        } else {
            self.last_unit = now_unit;
            self.count = 1;
        }
        true
    }
}

/// Per-caller + global admission gate.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessGate {
    per_caller_limit: u64,
    global_limit: u64,
    trusted_role: String,
    per_caller: BTreeMap<CallerId, RateBucket>,
    global: RateBucket,
}

impl AccessGate {
    /// Limits are clamped to at least one admission per unit.
    pub fn new(per_caller_limit: u64, initial_global_limit: u64, trusted_role: impl Into<String>) -> Self {
        Self {
            per_caller_limit: per_caller_limit.max(1),
            global_limit: initial_global_limit.max(1),
            trusted_role: trusted_role.into(),
            per_caller: BTreeMap::new(),
            global: RateBucket::default(),
        }
    }

    pub fn per_caller_limit(&self) -> u64 {
        self.per_caller_limit
    }

    /// Current adaptive global ceiling. Read during admission; written only
    /// through `set_global_limit`.
    pub fn global_limit(&self) -> u64 {
        self.global_limit
    }

    /// Tuning entry point for an external control loop reacting to load.
    /// Clamps to at least one and emits an adjust event.
    pub fn set_global_limit(&mut self, new_limit: u64, audit: &mut dyn AuditSink) {
        let clamped = new_limit.max(1);
        audit.emit(
            AuditKind::RateLimitAdjusted,
            fields([
                ("old_limit", self.global_limit.to_string()),
                ("new_limit", clamped.to_string()),
            ]),
        );
        self.global_limit = clamped;
    }

    /// Decide admission for `caller` at `now_unit`.
    ///
    /// Order: trusted bypass, then the per-caller bucket, then the global
    /// bucket. A caller that passes its own bucket but is denied globally
    /// keeps the per-caller increment; the sequential check is part of the
    /// admission contract.
    pub fn permit(
        &mut self,
        caller: &CallerId,
        now_unit: u64,
        roles: &dyn RoleStore,
        audit: &mut dyn AuditSink,
    ) -> bool {
        if roles.has_role(caller, &self.trusted_role) {
            audit.emit(
                AuditKind::RateLimitBypass,
                fields([
                    ("caller", caller.to_string()),
                    ("reason", "trusted_user".to_string()),
                    ("unit", now_unit.to_string()),
                ]),
            );
            return true;
        }

        let bucket = self.per_caller.entry(caller.clone()).or_default();
        if !bucket.admit(now_unit, self.per_caller_limit) {
            let count = bucket.count;
            audit.emit(
                AuditKind::RateLimitHit,
                fields([
                    ("scope", "caller".to_string()),
                    ("caller", caller.to_string()),
                    ("count", count.to_string()),
                    ("limit", self.per_caller_limit.to_string()),
                    ("unit", now_unit.to_string()),
                ]),
            );
            return false;
        }

        if !self.global.admit(now_unit, self.global_limit) {
            audit.emit(
                AuditKind::RateLimitHit,
                fields([
                    ("scope", "global".to_string()),
                    ("caller", caller.to_string()),
                    ("count", self.global.count.to_string()),
                    ("limit", self.global_limit.to_string()),
                    ("unit", now_unit.to_string()),
                ]),
            );
            return false;
        }

        true
    }

    /// Callers with live per-caller state. Buckets from past units linger
    /// until their caller returns; they are one machine word each.
    pub fn tracked_callers(&self) -> usize {
        self.per_caller.len()
    }
}
