//! State snapshot utility: capture, restore, and point-write of a target's
//! observable state.
//!
//! Observable state is the target's key-value storage held by the invocation
//! collaborator, reached through `StateAccess`. Restore replaces the target's
//! entry map wholesale, so repeated restores with no intervening writes are
//! byte-identical no-ops. Snapshots bracket scenario runs (`run_scenario`)
//! and single isolated simulations (`simulate_isolated`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ident::TargetAddress;

/// Capture of one target's observable state, sufficient to restore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Target the snapshot was taken from.
    pub target: TargetAddress,
    pub entries: BTreeMap<String, u64>,
}

impl StateSnapshot {
    pub fn empty(target: TargetAddress) -> Self {
        Self {
            target,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Window onto per-target key-value state.
///
/// Backends without real storage may return empty snapshots; restore must
/// still replace the target's state with the snapshot's entries.
pub trait StateAccess {
    fn state_snapshot(&self, target: &TargetAddress) -> StateSnapshot;

    /// Replace `target`'s state with the snapshot's entries. Idempotent.
    fn state_restore(&mut self, target: &TargetAddress, snapshot: &StateSnapshot);

    /// Point-write for constructing synthetic states.
    fn state_set(&mut self, target: &TargetAddress, key: &str, value: u64);

    fn state_get(&self, target: &TargetAddress, key: &str) -> Option<u64>;
}
