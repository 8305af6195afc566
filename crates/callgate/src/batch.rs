//! Ordered batch execution: one gate admission per batch, per-step
//! fingerprint caching, bounded retry, and per-step failure isolation.
//!
//! Every step runs; a failing step lands in its own result record and the
//! batch carries on. Output length and order always match the input.

use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;
use crate::dispatcher::{CallDescriptor, CallResult};
use crate::error::GatewayResult;
use crate::gateway::Gateway;
use crate::ident::CallerId;
use crate::invoker::SimulationBackend;

/// Per-batch execution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Consult and fill the call cache.
    pub use_cache: bool,
    /// Additional attempts per step after a genuine invocation failure.
    pub retry_budget: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            retry_budget: 0,
        }
    }
}

impl BatchOptions {
    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            retry_budget: 0,
        }
    }

    pub fn with_retries(retry_budget: u32) -> Self {
        Self {
            use_cache: true,
            retry_budget,
        }
    }
}

impl<B: SimulationBackend> Gateway<B> {
    /// Run an ordered list of calls under a single gate admission.
    ///
    /// The gate is consulted exactly once: a deny fails the whole batch with
    /// `RateLimitExceeded` before any step runs. Past admission, failures
    /// are contained per step.
    pub fn run_batch(
        &mut self,
        calls: &[CallDescriptor],
        caller: &CallerId,
        options: BatchOptions,
    ) -> GatewayResult<Vec<CallResult>> {
        self.admit(caller)?;

        let mut results = Vec::with_capacity(calls.len());
        for descriptor in calls {
            results.push(self.run_step(descriptor, caller, options));
        }
        Ok(results)
    }

    fn run_step(
        &mut self,
        descriptor: &CallDescriptor,
        caller: &CallerId,
        options: BatchOptions,
    ) -> CallResult {
        let key = CacheKey::new(
            descriptor.target.clone(),
            descriptor.selector.clone(),
            &descriptor.args,
        );

        if options.use_cache {
            if let Some(payload) = self.cache.lookup(&key) {
                return CallResult::from_cache(payload.to_vec());
            }
        }

        let mut attempts_left = options.retry_budget;
        loop {
            match self.dispatch_admitted(descriptor, caller) {
                Ok(outcome) => {
                    if options.use_cache {
                        self.cache.insert(key, outcome.payload.clone());
                    }
                    return CallResult::succeeded(outcome.payload);
                }
                Err(err) if err.is_execution_failure() && attempts_left > 0 => {
                    attempts_left -= 1;
                }
                Err(err) => {
                    // Deterministic denials are never retried; for exhausted
                    // budgets this is the last observed failure.
                    return CallResult::failed(&err);
                }
            }
        }
    }
}
