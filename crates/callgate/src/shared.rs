//! Thread-safe handle over a gateway.
//!
//! The core state machines are single-threaded and deterministic;
//! `SharedGateway` serializes every operation behind one mutex. Operations
//! on the same caller, target, or cache key are thereby serialized, which
//! the admission counters require; cross-key parallelism is not exploited.

use std::sync::{Arc, Mutex};

use crate::batch::BatchOptions;
use crate::dispatcher::{CallDescriptor, CallResult};
use crate::error::GatewayResult;
use crate::gateway::Gateway;
use crate::ident::{CallerId, TargetAddress};
use crate::invoker::SimulationBackend;
use crate::scenario::ScenarioResult;
use crate::simulation::{CallHooks, SimulationReport};

/// Clonable, `Send + Sync` handle serializing access to one `Gateway`.
pub struct SharedGateway<B: SimulationBackend + Send> {
    inner: Arc<Mutex<Gateway<B>>>,
}

impl<B: SimulationBackend + Send> Clone for SharedGateway<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SimulationBackend + Send> SharedGateway<B> {
    pub fn new(gateway: Gateway<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gateway)),
        }
    }

    /// Run `f` with exclusive access to the gateway. A poisoned lock is
    /// recovered: the state machines keep their invariants on every exit
    /// path, so the data is usable after a panicked holder.
    pub fn with<R>(&self, f: impl FnOnce(&mut Gateway<B>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn register(
        &self,
        caller: &CallerId,
        name: &str,
        address: TargetAddress,
    ) -> GatewayResult<()> {
        self.with(|gw| gw.register(caller, name, address))
    }

    pub fn approve(&self, caller: &CallerId, name: &str, approved: &CallerId) -> GatewayResult<()> {
        self.with(|gw| gw.approve(caller, name, approved))
    }

    pub fn revoke(&self, caller: &CallerId, name: &str, revoked: &CallerId) -> GatewayResult<()> {
        self.with(|gw| gw.revoke(caller, name, revoked))
    }

    pub fn call(&self, descriptor: &CallDescriptor, caller: &CallerId) -> GatewayResult<Vec<u64>> {
        self.with(|gw| gw.call(descriptor, caller))
    }

    pub fn run_batch(
        &self,
        calls: &[CallDescriptor],
        caller: &CallerId,
        options: BatchOptions,
    ) -> GatewayResult<Vec<CallResult>> {
        self.with(|gw| gw.run_batch(calls, caller, options))
    }

    pub fn simulate_full(
        &self,
        descriptor: &CallDescriptor,
        caller: &CallerId,
        hooks: &mut CallHooks<'_>,
    ) -> SimulationReport {
        self.with(|gw| gw.simulate_full(descriptor, caller, hooks))
    }

    pub fn run_scenario(
        &self,
        steps: &[CallDescriptor],
        caller: &CallerId,
        hooks: &mut CallHooks<'_>,
    ) -> ScenarioResult {
        self.with(|gw| gw.run_scenario(steps, caller, hooks))
    }

    pub fn set_global_limit(&self, caller: &CallerId, new_limit: u64) -> GatewayResult<()> {
        self.with(|gw| gw.set_global_limit(caller, new_limit))
    }
}
