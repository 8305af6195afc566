//! Hooked simulation around the dispatcher: step logging, captured events,
//! and the collaborator-supplied cost estimate, folded into a structured
//! report.
//!
//! The engine drives the real dispatcher, so `simulate` and `simulate_full`
//! commit real side effects; they are dry runs in the sense of structured
//! observation, not isolation. `simulate_isolated` brackets one call with a
//! state snapshot, and `run_scenario` does the same for whole sequences.
//! Failures are contained into the report, never propagated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dispatcher::{CallDescriptor, CallResult};
use crate::gateway::Gateway;
use crate::ident::CallerId;
use crate::invoker::SimulationBackend;

// ---------------------------------------------------------------------------
// CallHooks
// ---------------------------------------------------------------------------

/// Optional observation hooks, invoked synchronously in a fixed order:
/// pre, dispatch, post. The post hook only fires on success, with the
/// returned payload.
#[derive(Default)]
pub struct CallHooks<'a> {
    pub pre: Option<&'a mut dyn FnMut(&CallDescriptor)>,
    pub post: Option<&'a mut dyn FnMut(&[u64])>,
}

impl<'a> CallHooks<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_pre(pre: &'a mut dyn FnMut(&CallDescriptor)) -> Self {
        Self {
            pre: Some(pre),
            post: None,
        }
    }

    pub fn with_post(post: &'a mut dyn FnMut(&[u64])) -> Self {
        Self {
            pre: None,
            post: Some(post),
        }
    }
}

impl fmt::Debug for CallHooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHooks")
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Phase a logged step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    PreCall,
    PostCall,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreCall => f.write_str("pre_call"),
            Self::PostCall => f.write_str("post_call"),
        }
    }
}

/// One logged pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub phase: StepPhase,
    pub detail: String,
}

/// Event captured during a simulated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub name: String,
    pub payload: Vec<u64>,
}

/// Structured outcome of one simulated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub result: CallResult,
    pub steps: Vec<SimulationStep>,
    pub events: Vec<SimulationEvent>,
    /// Opaque figure from the invocation collaborator; zero on failure.
    pub cost_estimate: u64,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

impl<B: SimulationBackend> Gateway<B> {
    /// Simulate one call through the real dispatcher, returning its result.
    pub fn simulate(
        &mut self,
        descriptor: &CallDescriptor,
        caller: &CallerId,
        hooks: &mut CallHooks<'_>,
    ) -> CallResult {
        self.simulate_full(descriptor, caller, hooks).result
    }

    /// Simulate one call and capture the full report: ordered steps, the
    /// derived event, and the collaborator's cost estimate.
    pub fn simulate_full(
        &mut self,
        descriptor: &CallDescriptor,
        caller: &CallerId,
        hooks: &mut CallHooks<'_>,
    ) -> SimulationReport {
        if let Some(pre) = hooks.pre.as_mut() {
            pre(descriptor);
        }
        let mut steps = vec![SimulationStep {
            phase: StepPhase::PreCall,
            detail: descriptor.to_string(),
        }];

        let (result, cost_estimate) = match self
            .admit(caller)
            .and_then(|()| self.dispatch_admitted(descriptor, caller))
        {
            Ok(outcome) => {
                let cost = outcome.cost_estimate;
                (CallResult::succeeded(outcome.payload), cost)
            }
            Err(err) => (CallResult::failed(&err), 0),
        };

        let detail = if result.success {
            format!("payload: {:?}", result.payload)
        } else {
            result.error.clone().unwrap_or_default()
        };
        steps.push(SimulationStep {
            phase: StepPhase::PostCall,
            detail,
        });
        if result.success {
            if let Some(post) = hooks.post.as_mut() {
                post(&result.payload);
            }
        }

        let events = vec![SimulationEvent {
            name: format!("simulated:{}", descriptor.selector.as_str()),
            payload: result.payload.clone(),
        }];

        SimulationReport {
            result,
            steps,
            events,
            cost_estimate,
        }
    }

    /// Simulate one call with its target's state restored afterwards, so
    /// nothing commits. An unresolvable target has no state to bracket and
    /// falls through to a plain (failing) simulation.
    pub fn simulate_isolated(
        &mut self,
        descriptor: &CallDescriptor,
        caller: &CallerId,
        hooks: &mut CallHooks<'_>,
    ) -> SimulationReport {
        match self.registry.resolve(&descriptor.target) {
            Ok(address) => {
                let snapshot = self.backend.state_snapshot(&address);
                let report = self.simulate_full(descriptor, caller, hooks);
                self.backend.state_restore(&address, &snapshot);
                report
            }
            Err(_) => self.simulate_full(descriptor, caller, hooks),
        }
    }
}
