//! Owning facade: one `Gateway` holds the registry, the access gate, the
//! call cache, the audit sink, and the collaborator seams, and exposes the
//! whole public surface. The dispatch, batch, simulation, and scenario
//! operations live in their own modules as further `impl Gateway` blocks.

use serde::{Deserialize, Serialize};

use crate::audit::{fields, AuditEvent, AuditKind, AuditSink, InMemoryAuditSink};
use crate::cache::CallCache;
use crate::clock::UnitClock;
use crate::error::{GatewayError, GatewayResult};
use crate::gate::{AccessGate, DEFAULT_GLOBAL_LIMIT, DEFAULT_PER_CALLER_LIMIT};
use crate::ident::{CallerId, TargetAddress};
use crate::invoker::SimulationBackend;
use crate::registry::TargetRegistry;
use crate::roles::{RoleStore, ROLE_TRUSTED_CALLER};
use crate::snapshot::StateSnapshot;

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

/// Construction-time parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Single designated admin identity for all mutating configuration.
    pub admin: CallerId,
    /// Per-caller admissions per timestamp unit.
    pub per_caller_limit: u64,
    /// Starting value for the adaptive global ceiling.
    pub initial_global_limit: u64,
    /// Role name exempting a caller from rate limiting.
    pub trusted_role: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            admin: CallerId::new("admin"),
            per_caller_limit: DEFAULT_PER_CALLER_LIMIT,
            initial_global_limit: DEFAULT_GLOBAL_LIMIT,
            trusted_role: ROLE_TRUSTED_CALLER.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Contract interaction gateway over a simulation-capable backend.
pub struct Gateway<B: SimulationBackend> {
    pub(crate) config: GatewayConfig,
    pub(crate) registry: TargetRegistry,
    pub(crate) gate: AccessGate,
    pub(crate) cache: CallCache,
    pub(crate) audit: InMemoryAuditSink,
    pub(crate) backend: B,
    pub(crate) roles: Box<dyn RoleStore + Send>,
    pub(crate) clock: Box<dyn UnitClock + Send>,
}

impl<B: SimulationBackend> Gateway<B> {
    pub fn new(
        config: GatewayConfig,
        backend: B,
        roles: impl RoleStore + Send + 'static,
        clock: impl UnitClock + Send + 'static,
    ) -> Self {
        let registry = TargetRegistry::new(config.admin.clone());
        let gate = AccessGate::new(
            config.per_caller_limit,
            config.initial_global_limit,
            config.trusted_role.clone(),
        );
        Self {
            config,
            registry,
            gate,
            cache: CallCache::new(),
            audit: InMemoryAuditSink::new(),
            backend,
            roles: Box::new(roles),
            clock: Box::new(clock),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn require_admin(&self, caller: &CallerId) -> GatewayResult<()> {
        if caller == self.registry.admin() {
            Ok(())
        } else {
            Err(GatewayError::Authorization {
                detail: format!("{caller} is not the gateway admin"),
            })
        }
    }

    // -- Registry surface ----------------------------------------------------

    pub fn register(
        &mut self,
        caller: &CallerId,
        name: &str,
        address: TargetAddress,
    ) -> GatewayResult<()> {
        self.registry.register(caller, name, address, &mut self.audit)
    }

    pub fn approve(
        &mut self,
        caller: &CallerId,
        name: &str,
        approved: &CallerId,
    ) -> GatewayResult<()> {
        self.registry.approve(caller, name, approved, &mut self.audit)
    }

    pub fn revoke(
        &mut self,
        caller: &CallerId,
        name: &str,
        revoked: &CallerId,
    ) -> GatewayResult<()> {
        self.registry.revoke(caller, name, revoked, &mut self.audit)
    }

    pub fn resolve(&self, name: &str) -> GatewayResult<TargetAddress> {
        self.registry.resolve(name)
    }

    pub fn is_approved(&self, name: &str, caller: &CallerId) -> bool {
        self.registry.is_approved(name, caller)
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    // -- Gate surface --------------------------------------------------------

    /// Admin entry point for the external control loop tuning the adaptive
    /// global ceiling.
    pub fn set_global_limit(&mut self, caller: &CallerId, new_limit: u64) -> GatewayResult<()> {
        self.require_admin(caller)?;
        self.gate.set_global_limit(new_limit, &mut self.audit);
        Ok(())
    }

    pub fn global_limit(&self) -> u64 {
        self.gate.global_limit()
    }

    pub fn per_caller_limit(&self) -> u64 {
        self.gate.per_caller_limit()
    }

    // -- Snapshot utility surface -------------------------------------------

    /// Capture the observable state of a registered target.
    pub fn snapshot_target(&self, name: &str) -> GatewayResult<StateSnapshot> {
        let address = self.registry.resolve(name)?;
        Ok(self.backend.state_snapshot(&address))
    }

    /// Restore a registered target to a previously captured state.
    /// Idempotent: repeated restores with no intervening writes are no-ops.
    pub fn restore_target(&mut self, name: &str, snapshot: &StateSnapshot) -> GatewayResult<()> {
        let address = self.registry.resolve(name)?;
        self.backend.state_restore(&address, snapshot);
        Ok(())
    }

    /// Point-write into a registered target's state, for constructing
    /// synthetic test states.
    pub fn set_target_state(&mut self, name: &str, key: &str, value: u64) -> GatewayResult<()> {
        let address = self.registry.resolve(name)?;
        self.backend.state_set(&address, key, value);
        Ok(())
    }

    // -- Cache surface -------------------------------------------------------

    /// Drop every cache entry for one target. Admin-gated; emits an audit
    /// event with the removal count.
    pub fn purge_target(&mut self, caller: &CallerId, name: &str) -> GatewayResult<usize> {
        self.require_admin(caller)?;
        let removed = self.cache.purge_target(name);
        self.audit.emit(
            AuditKind::CachePurged,
            fields([("target", name.to_string()), ("removed", removed.to_string())]),
        );
        Ok(removed)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    // -- Backend and audit access --------------------------------------------

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn audit_events(&self) -> &[AuditEvent] {
        self.audit.events()
    }

    /// Drain accumulated audit events, e.g. to forward them to an external
    /// append-only stream.
    pub fn drain_audit_events(&mut self) -> Vec<AuditEvent> {
        self.audit.drain_events()
    }
}
