//! Append-only structured audit stream.
//!
//! Every admission decision, registry mutation, and completed call emits an
//! `AuditEvent` into an `AuditSink`. Events are data: they carry a monotonic
//! sequence number, a kind, and string fields, and the core never reads them
//! back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AuditKind
// ---------------------------------------------------------------------------

/// Kind of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    TargetRegistered,
    CallerApproved,
    CallerRevoked,
    CallCompleted,
    RateLimitHit,
    RateLimitBypass,
    RateLimitAdjusted,
    CachePurged,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetRegistered => f.write_str("target_registered"),
            Self::CallerApproved => f.write_str("caller_approved"),
            Self::CallerRevoked => f.write_str("caller_revoked"),
            Self::CallCompleted => f.write_str("call_completed"),
            Self::RateLimitHit => f.write_str("rate_limit_hit"),
            Self::RateLimitBypass => f.write_str("rate_limit_bypass"),
            Self::RateLimitAdjusted => f.write_str("rate_limit_adjusted"),
            Self::CachePurged => f.write_str("cache_purged"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// One entry in the audit stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Monotonic sequence number assigned by the sink.
    pub seq: u64,
    pub kind: AuditKind,
    pub fields: BTreeMap<String, String>,
}

/// Build an event field map from literal pairs.
pub fn fields<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// ---------------------------------------------------------------------------
// AuditSink
// ---------------------------------------------------------------------------

/// Append-only consumer of audit events. Write-only from the core's
/// perspective.
pub trait AuditSink {
    fn emit(&mut self, kind: AuditKind, fields: BTreeMap<String, String>);
}

/// In-memory sink accumulating events with a monotonic sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryAuditSink {
    events: Vec<AuditEvent>,
    next_seq: u64,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Drain accumulated events, e.g. to forward them to an external stream.
    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count_kind(&self, kind: AuditKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn last_of_kind(&self, kind: AuditKind) -> Option<&AuditEvent> {
        self.events.iter().rev().find(|e| e.kind == kind)
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&mut self, kind: AuditKind, fields: BTreeMap<String, String>) {
        let event = AuditEvent {
            seq: self.next_seq,
            kind,
            fields,
        };
        self.next_seq = self.next_seq.saturating_add(1);
        self.events.push(event);
    }
}
