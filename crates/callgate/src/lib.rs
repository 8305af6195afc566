//! Contract interaction gateway and simulation harness.
//!
//! One logical unit invokes functionality on another through a registry of
//! named targets, gated by per-target caller approval and a two-tier
//! (per-caller + global, adaptive) rate limiter, with batched, cached, and
//! retried execution. A hook-based simulation engine and a snapshot-bracketed
//! scenario runner validate call sequences before they are trusted.
//!
//! The pipeline for a single call:
//!
//! 1. **Admit** via [`gate::AccessGate`] (trusted-role bypass, per-caller
//!    bucket, adaptive global bucket)
//! 2. **Authorize** against the per-target approval set
//! 3. **Resolve** the symbolic name in [`registry::TargetRegistry`]
//! 4. **Pack** arguments losslessly ([`invoker::PackedCall`])
//! 5. **Invoke** through the [`invoker::ContractInvoker`] seam
//! 6. **Audit** into the append-only event stream
//!
//! Batches run under one admission with fingerprint caching and bounded
//! retry; scenarios aggregate simulated steps into a single verdict and
//! restore all touched state on exit.

#![forbid(unsafe_code)]

pub mod audit;
pub mod batch;
pub mod cache;
pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod gateway;
pub mod ident;
pub mod invoker;
pub mod registry;
pub mod roles;
pub mod scenario;
pub mod shared;
pub mod simulation;
pub mod snapshot;

pub use audit::{AuditEvent, AuditKind, AuditSink, InMemoryAuditSink};
pub use batch::BatchOptions;
pub use clock::{FixedClock, SystemUnitClock, UnitClock};
pub use dispatcher::{CallDescriptor, CallResult};
pub use error::{GatewayError, GatewayResult};
pub use fingerprint::ArgFingerprint;
pub use gate::AccessGate;
pub use gateway::{Gateway, GatewayConfig};
pub use ident::{CallerId, FunctionSelector, TargetAddress};
pub use invoker::{
    ContractInvoker, FaultInjector, InMemoryInvoker, InvokeOutcome, PackedCall, SimulationBackend,
};
pub use registry::TargetRegistry;
pub use roles::{RoleStore, StaticRoleStore, ROLE_TRUSTED_CALLER};
pub use scenario::ScenarioResult;
pub use shared::SharedGateway;
pub use simulation::{CallHooks, SimulationEvent, SimulationReport, SimulationStep};
pub use snapshot::{StateAccess, StateSnapshot};
