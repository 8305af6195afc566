//! Single-call dispatch: gate check, approval check, resolution, argument
//! packing, invocation, audit.
//!
//! A dispatch aborts on the first failure. Containment of failures into
//! per-step records is the batch and scenario layers' job, not this one's.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit::{fields, AuditKind, AuditSink};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;
use crate::ident::{CallerId, FunctionSelector};
use crate::invoker::{InvokeOutcome, PackedCall, SimulationBackend};

// ---------------------------------------------------------------------------
// CallDescriptor / CallResult
// ---------------------------------------------------------------------------

/// Input unit of work: one named call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub target: String,
    pub selector: FunctionSelector,
    pub args: Vec<u64>,
}

impl CallDescriptor {
    pub fn new(target: impl Into<String>, selector: impl Into<FunctionSelector>, args: Vec<u64>) -> Self {
        Self {
            target: target.into(),
            selector: selector.into(),
            args,
        }
    }
}

impl fmt::Display for CallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} ({} args)", self.target, self.selector, self.args.len())
    }
}

/// Output unit of work: one step's outcome, order-preserving in batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    pub payload: Vec<u64>,
    /// Rendered failure, leading with its stable code. Absent on success.
    pub error: Option<String>,
    /// True when the payload was served from the call cache.
    pub served_from_cache: bool,
}

impl CallResult {
    pub fn succeeded(payload: Vec<u64>) -> Self {
        Self {
            success: true,
            payload,
            error: None,
            served_from_cache: false,
        }
    }

    pub fn from_cache(payload: Vec<u64>) -> Self {
        Self {
            success: true,
            payload,
            error: None,
            served_from_cache: true,
        }
    }

    pub fn failed(error: &GatewayError) -> Self {
        Self {
            success: false,
            payload: Vec::new(),
            error: Some(error.to_string()),
            served_from_cache: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl<B: SimulationBackend> Gateway<B> {
    /// Execute one call end to end. Fails closed on the first denial.
    ///
    /// Returns the raw payload; callers needing the collaborator's cost
    /// figure go through the simulation surface instead.
    pub fn call(&mut self, descriptor: &CallDescriptor, caller: &CallerId) -> GatewayResult<Vec<u64>> {
        self.admit(caller)?;
        self.dispatch_admitted(descriptor, caller)
            .map(|outcome| outcome.payload)
    }

    /// Run the access gate once for `caller`, translating a deny.
    pub(crate) fn admit(&mut self, caller: &CallerId) -> GatewayResult<()> {
        let unit = self.clock.current_unit();
        if self
            .gate
            .permit(caller, unit, self.roles.as_ref(), &mut self.audit)
        {
            Ok(())
        } else {
            Err(GatewayError::RateLimitExceeded {
                caller: caller.to_string(),
                unit,
            })
        }
    }

    /// Dispatch past the gate: approval, resolution, packing, invocation,
    /// audit. Shared by the single-call, batch, and simulation paths.
    pub(crate) fn dispatch_admitted(
        &mut self,
        descriptor: &CallDescriptor,
        caller: &CallerId,
    ) -> GatewayResult<InvokeOutcome> {
        if descriptor.selector.is_blank() {
            return Err(GatewayError::Validation {
                detail: "function selector must not be blank".to_string(),
            });
        }
        if !self.registry.is_approved(&descriptor.target, caller) {
            return Err(GatewayError::Authorization {
                detail: format!("{caller} is not approved for '{}'", descriptor.target),
            });
        }
        let address = self.registry.resolve(&descriptor.target)?;

        let packed = PackedCall::pack(descriptor.selector.clone(), &descriptor.args);
        let outcome = self.backend.invoke(&address, &packed);
        if !outcome.is_success() {
            return Err(GatewayError::ExecutionFailed {
                selector: descriptor.selector.to_string(),
                status: outcome.status,
            });
        }

        self.audit.emit(
            AuditKind::CallCompleted,
            fields([
                ("target", descriptor.target.clone()),
                ("selector", descriptor.selector.to_string()),
                ("caller", caller.to_string()),
            ]),
        );
        Ok(outcome)
    }
}
