//! Scenario orchestration: an ordered sequence of simulated calls evaluated
//! as one unit, bracketed by state snapshots so the run commits nothing.
//!
//! Execution is never fail-fast: every step runs and appears in the result,
//! and the overall verdict is the logical AND of per-step successes. Steps
//! within a scenario observe each other's writes; the bracket restores every
//! referenced target only after the last step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dispatcher::CallDescriptor;
use crate::gateway::Gateway;
use crate::ident::{CallerId, TargetAddress};
use crate::invoker::SimulationBackend;
use crate::simulation::{CallHooks, SimulationReport};
use crate::snapshot::StateSnapshot;

/// Aggregated outcome of one scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// One report per step, in input order.
    pub reports: Vec<SimulationReport>,
    /// True iff every step succeeded.
    pub success: bool,
}

impl ScenarioResult {
    pub fn failed_steps(&self) -> Vec<usize> {
        self.reports
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.result.success)
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of per-step cost estimates.
    pub fn total_cost_estimate(&self) -> u64 {
        self.reports
            .iter()
            .map(|r| r.cost_estimate)
            .fold(0, u64::saturating_add)
    }
}

impl<B: SimulationBackend> Gateway<B> {
    /// Run every step through `simulate_full` with the same hooks, restore
    /// all referenced targets, and aggregate the verdict.
    ///
    /// Snapshots are taken for each distinct resolvable target named by the
    /// steps before the first step runs, and restored unconditionally after
    /// the last; there is no early exit between the two points.
    pub fn run_scenario(
        &mut self,
        steps: &[CallDescriptor],
        caller: &CallerId,
        hooks: &mut CallHooks<'_>,
    ) -> ScenarioResult {
        let snapshots = self.capture_scenario_state(steps);

        let mut reports = Vec::with_capacity(steps.len());
        for descriptor in steps {
            reports.push(self.simulate_full(descriptor, caller, hooks));
        }
        let success = reports.iter().all(|r| r.result.success);

        for (address, snapshot) in &snapshots {
            self.backend.state_restore(address, snapshot);
        }

        ScenarioResult { reports, success }
    }

    fn capture_scenario_state(
        &self,
        steps: &[CallDescriptor],
    ) -> Vec<(TargetAddress, StateSnapshot)> {
        let names: BTreeSet<&str> = steps.iter().map(|d| d.target.as_str()).collect();
        names
            .into_iter()
            .filter_map(|name| self.registry.resolve(name).ok())
            .map(|address| (address, self.backend.state_snapshot(&address)))
            .collect()
    }
}
