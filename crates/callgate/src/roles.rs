//! Access-control collaborator: role membership queries.
//!
//! The gateway consults the role store for exactly one purpose, the
//! trusted-caller rate-limit bypass. Role administration lives outside the
//! core; `StaticRoleStore` is the in-memory reference implementation used
//! for setup-time configuration and tests.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ident::CallerId;

/// Role exempting a caller from rate limiting.
pub const ROLE_TRUSTED_CALLER: &str = "trusted_caller";

/// Read-only role membership oracle.
pub trait RoleStore {
    fn has_role(&self, caller: &CallerId, role: &str) -> bool;
}

/// In-memory role store configured before traffic flows.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoleStore {
    grants: BTreeMap<CallerId, BTreeSet<String>>,
}

impl StaticRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, caller: CallerId, role: impl Into<String>) {
        self.grants.entry(caller).or_default().insert(role.into());
    }

    pub fn revoke(&mut self, caller: &CallerId, role: &str) {
        if let Some(roles) = self.grants.get_mut(caller) {
            roles.remove(role);
            if roles.is_empty() {
                self.grants.remove(caller);
            }
        }
    }
}

impl RoleStore for StaticRoleStore {
    fn has_role(&self, caller: &CallerId, role: &str) -> bool {
        self.grants
            .get(caller)
            .is_some_and(|roles| roles.contains(role))
    }
}
