//! Invocation collaborator: the boundary where a resolved call leaves the
//! gateway.
//!
//! `ContractInvoker` is the only seam through which target code runs. The
//! in-memory implementation drives per-target key-value state through
//! programmable handlers; `FaultInjector` decorates any invoker to fail
//! selected selectors, which is the supported fault-injection point for
//! simulations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::{FunctionSelector, TargetAddress};
use crate::snapshot::{StateAccess, StateSnapshot};

/// Status value reported for a successful invocation.
pub const INVOKE_OK: u32 = 0;

/// Status reported by `InMemoryInvoker` when no handler is bound.
pub const STATUS_UNKNOWN_FUNCTION: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// PackedCall — wire form of a call
// ---------------------------------------------------------------------------

/// Argument sequence packed for the wire.
///
/// The body trims trailing zero words as a size optimization, and the
/// declared argument count makes the trim lossless: `unpack` restores
/// exactly the original sequence, including legitimate trailing zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedCall {
    pub selector: FunctionSelector,
    /// Declared length of the original argument sequence.
    pub arg_count: u32,
    /// Argument words with trailing zeros trimmed.
    pub words: Vec<u64>,
}

impl PackedCall {
    pub fn pack(selector: FunctionSelector, args: &[u64]) -> Self {
        let last_nonzero = args.iter().rposition(|w| *w != 0);
        let body_len = last_nonzero.map_or(0, |i| i + 1);
        Self {
            selector,
            arg_count: args.len() as u32,
            words: args[..body_len].to_vec(),
        }
    }

    /// Restore the original argument sequence.
    pub fn unpack(&self) -> Vec<u64> {
        let mut args = self.words.clone();
        args.resize(self.arg_count as usize, 0);
        args
    }
}

impl fmt::Display for PackedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} args, {} words)",
            self.selector,
            self.arg_count,
            self.words.len()
        )
    }
}

// ---------------------------------------------------------------------------
// InvokeOutcome
// ---------------------------------------------------------------------------

/// Result of one invocation. Status zero means success; the cost estimate is
/// an opaque figure supplied by the collaborator, never computed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeOutcome {
    pub status: u32,
    pub payload: Vec<u64>,
    pub cost_estimate: u64,
}

impl InvokeOutcome {
    pub fn success(payload: Vec<u64>, cost_estimate: u64) -> Self {
        Self {
            status: INVOKE_OK,
            payload,
            cost_estimate,
        }
    }

    pub fn failure(status: u32) -> Self {
        Self {
            status: status.max(1),
            payload: Vec::new(),
            cost_estimate: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == INVOKE_OK
    }
}

/// Synchronous, bounded execution of a packed call against an address.
pub trait ContractInvoker {
    fn invoke(&mut self, address: &TargetAddress, call: &PackedCall) -> InvokeOutcome;
}

/// Backend a gateway runs against: invocation plus observable state, so
/// simulations can be bracketed by snapshots.
pub trait SimulationBackend: ContractInvoker + StateAccess {}

impl<T: ContractInvoker + StateAccess> SimulationBackend for T {}

// ---------------------------------------------------------------------------
// InMemoryInvoker — reference backend
// ---------------------------------------------------------------------------

/// Handler bound to a selector: mutates the invoked target's state and
/// produces the outcome.
pub type InvokeHandler =
    Box<dyn FnMut(&mut BTreeMap<String, u64>, &[u64]) -> InvokeOutcome + Send>;

/// One recorded invocation, for assertions on call volume and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedInvocation {
    pub address: TargetAddress,
    pub selector: FunctionSelector,
    pub args: Vec<u64>,
}

/// In-memory backend: per-target key-value state, per-selector handlers,
/// and a log of every invocation.
#[derive(Default)]
pub struct InMemoryInvoker {
    handlers: BTreeMap<FunctionSelector, InvokeHandler>,
    state: BTreeMap<TargetAddress, BTreeMap<String, u64>>,
    log: Vec<RecordedInvocation>,
}

impl InMemoryInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to a selector. Rebinding replaces the previous handler.
    pub fn bind(&mut self, selector: FunctionSelector, handler: InvokeHandler) {
        self.handlers.insert(selector, handler);
    }

    /// Bind a handler that returns a fixed payload at a fixed cost without
    /// touching state.
    pub fn bind_constant(&mut self, selector: FunctionSelector, payload: Vec<u64>, cost: u64) {
        self.bind(
            selector,
            Box::new(move |_, _| InvokeOutcome::success(payload.clone(), cost)),
        );
    }

    pub fn invocations(&self) -> &[RecordedInvocation] {
        &self.log
    }

    pub fn invocation_count(&self, selector: &FunctionSelector) -> usize {
        self.log.iter().filter(|r| &r.selector == selector).count()
    }
}

impl fmt::Debug for InMemoryInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryInvoker")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("targets", &self.state.len())
            .field("invocations", &self.log.len())
            .finish()
    }
}

impl ContractInvoker for InMemoryInvoker {
    fn invoke(&mut self, address: &TargetAddress, call: &PackedCall) -> InvokeOutcome {
        let args = call.unpack();
        self.log.push(RecordedInvocation {
            address: *address,
            selector: call.selector.clone(),
            args: args.clone(),
        });

        let state = self.state.entry(*address).or_default();
        match self.handlers.get_mut(&call.selector) {
            Some(handler) => handler(state, &args),
            None => InvokeOutcome::failure(STATUS_UNKNOWN_FUNCTION),
        }
    }
}

impl StateAccess for InMemoryInvoker {
    fn state_snapshot(&self, target: &TargetAddress) -> StateSnapshot {
        StateSnapshot {
            target: *target,
            entries: self.state.get(target).cloned().unwrap_or_default(),
        }
    }

    fn state_restore(&mut self, target: &TargetAddress, snapshot: &StateSnapshot) {
        self.state.insert(*target, snapshot.entries.clone());
    }

    fn state_set(&mut self, target: &TargetAddress, key: &str, value: u64) {
        self.state
            .entry(*target)
            .or_default()
            .insert(key.to_string(), value);
    }

    fn state_get(&self, target: &TargetAddress, key: &str) -> Option<u64> {
        self.state.get(target).and_then(|s| s.get(key)).copied()
    }
}

// ---------------------------------------------------------------------------
// FaultInjector — invocation-boundary fault injection
// ---------------------------------------------------------------------------

/// Decorator failing selected selectors with a chosen non-zero status.
///
/// Faults compose with any backend, so simulations can induce failures
/// without reserving function names or touching target code.
#[derive(Debug)]
pub struct FaultInjector<I> {
    inner: I,
    faults: BTreeMap<FunctionSelector, u32>,
}

impl<I> FaultInjector<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            faults: BTreeMap::new(),
        }
    }

    /// Fail every invocation of `selector` with `status` (clamped non-zero).
    pub fn inject(&mut self, selector: FunctionSelector, status: u32) {
        self.faults.insert(selector, status.max(1));
    }

    pub fn clear(&mut self, selector: &FunctionSelector) {
        self.faults.remove(selector);
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.inner
    }
}

impl<I: ContractInvoker> ContractInvoker for FaultInjector<I> {
    fn invoke(&mut self, address: &TargetAddress, call: &PackedCall) -> InvokeOutcome {
        if let Some(status) = self.faults.get(&call.selector) {
            return InvokeOutcome::failure(*status);
        }
        self.inner.invoke(address, call)
    }
}

impl<I: StateAccess> StateAccess for FaultInjector<I> {
    fn state_snapshot(&self, target: &TargetAddress) -> StateSnapshot {
        self.inner.state_snapshot(target)
    }

    fn state_restore(&mut self, target: &TargetAddress, snapshot: &StateSnapshot) {
        self.inner.state_restore(target, snapshot);
    }

    fn state_set(&mut self, target: &TargetAddress, key: &str, value: u64) {
        self.inner.state_set(target, key, value);
    }

    fn state_get(&self, target: &TargetAddress, key: &str) -> Option<u64> {
        self.inner.state_get(target, key)
    }
}
