//! Gateway error taxonomy with stable, permanent error codes.
//!
//! Codes are append-only: once assigned they are never reused and may only
//! be marked deprecated. The code appears in the `Display` rendering so any
//! surfaced error string can be traced back to a taxonomy entry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Every failure the gateway can surface.
///
/// A single dispatch aborts on the first failure (fail-closed); batch and
/// scenario layers contain these into per-step result records instead of
/// aborting the whole sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum GatewayError {
    /// Malformed input: blank names or identities, zero addresses.
    #[error("CG-GW-0001: validation failed: {detail}")]
    Validation { detail: String },

    /// Caller is not the admin, or not approved for the target.
    #[error("CG-GW-0002: authorization failed: {detail}")]
    Authorization { detail: String },

    /// The access gate denied admission at the current timestamp unit.
    #[error("CG-GW-0003: rate limit exceeded for {caller} at unit {unit}")]
    RateLimitExceeded { caller: String, unit: u64 },

    /// Target name has no registered address.
    #[error("CG-GW-0004: target '{name}' is not registered")]
    NotRegistered { name: String },

    /// Target name is already bound; registration is write-once.
    #[error("CG-GW-0005: target '{name}' is already registered")]
    AlreadyExists { name: String },

    /// The invocation collaborator returned a non-zero status.
    #[error("CG-GW-0006: execution of {selector} failed with status {status}")]
    ExecutionFailed { selector: String, status: u32 },
}

impl GatewayError {
    /// Stable code for this error. Permanent and never reused.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "CG-GW-0001",
            Self::Authorization { .. } => "CG-GW-0002",
            Self::RateLimitExceeded { .. } => "CG-GW-0003",
            Self::NotRegistered { .. } => "CG-GW-0004",
            Self::AlreadyExists { .. } => "CG-GW-0005",
            Self::ExecutionFailed { .. } => "CG-GW-0006",
        }
    }

    /// True when the failure came from the invocation collaborator itself
    /// rather than from an admission or lookup check. Only these failures
    /// are worth retrying.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::ExecutionFailed { .. })
    }
}
