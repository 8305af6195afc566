//! Named-target directory with per-target caller approval.
//!
//! Registration is write-once: a name resolves to at most one address for
//! its lifetime. All mutation requires the single designated admin identity
//! and emits audit events. Lookups are default-deny: an absent entry is
//! "not registered", never "open".

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::audit::{fields, AuditKind, AuditSink};
use crate::error::{GatewayError, GatewayResult};
use crate::ident::{CallerId, TargetAddress};

/// Symbolic-name → address directory plus approved-caller sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistry {
    admin: CallerId,
    targets: BTreeMap<String, TargetAddress>,
    approvals: BTreeMap<String, BTreeSet<CallerId>>,
}

impl TargetRegistry {
    pub fn new(admin: CallerId) -> Self {
        Self {
            admin,
            targets: BTreeMap::new(),
            approvals: BTreeMap::new(),
        }
    }

    pub fn admin(&self) -> &CallerId {
        &self.admin
    }

    fn require_admin(&self, caller: &CallerId) -> GatewayResult<()> {
        if caller == &self.admin {
            Ok(())
        } else {
            Err(GatewayError::Authorization {
                detail: format!("{caller} is not the registry admin"),
            })
        }
    }

    /// Bind `name` to `address`. Write-once: an existing binding is never
    /// overwritten.
    pub fn register(
        &mut self,
        caller: &CallerId,
        name: &str,
        address: TargetAddress,
        audit: &mut dyn AuditSink,
    ) -> GatewayResult<()> {
        self.require_admin(caller)?;
        if name.trim().is_empty() {
            return Err(GatewayError::Validation {
                detail: "target name must not be blank".to_string(),
            });
        }
        if address.is_zero() {
            return Err(GatewayError::Validation {
                detail: format!("target '{name}' must not bind the zero address"),
            });
        }
        if self.targets.contains_key(name) {
            return Err(GatewayError::AlreadyExists {
                name: name.to_string(),
            });
        }

        self.targets.insert(name.to_string(), address);
        audit.emit(
            AuditKind::TargetRegistered,
            fields([("target", name.to_string()), ("address", address.to_string())]),
        );
        Ok(())
    }

    /// Approve `approved` to call `name`. The target must already exist.
    pub fn approve(
        &mut self,
        caller: &CallerId,
        name: &str,
        approved: &CallerId,
        audit: &mut dyn AuditSink,
    ) -> GatewayResult<()> {
        self.require_admin(caller)?;
        if approved.is_blank() {
            return Err(GatewayError::Validation {
                detail: "approved caller must not be blank".to_string(),
            });
        }
        if !self.targets.contains_key(name) {
            return Err(GatewayError::NotRegistered {
                name: name.to_string(),
            });
        }

        self.approvals
            .entry(name.to_string())
            .or_default()
            .insert(approved.clone());
        audit.emit(
            AuditKind::CallerApproved,
            fields([("target", name.to_string()), ("caller", approved.to_string())]),
        );
        Ok(())
    }

    /// Revoke `revoked`'s approval for `name`. Revoking an absent approval
    /// is a no-op; the target must exist either way.
    pub fn revoke(
        &mut self,
        caller: &CallerId,
        name: &str,
        revoked: &CallerId,
        audit: &mut dyn AuditSink,
    ) -> GatewayResult<()> {
        self.require_admin(caller)?;
        if !self.targets.contains_key(name) {
            return Err(GatewayError::NotRegistered {
                name: name.to_string(),
            });
        }

        if let Some(callers) = self.approvals.get_mut(name) {
            callers.remove(revoked);
        }
        audit.emit(
            AuditKind::CallerRevoked,
            fields([("target", name.to_string()), ("caller", revoked.to_string())]),
        );
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> GatewayResult<TargetAddress> {
        self.targets
            .get(name)
            .copied()
            .ok_or_else(|| GatewayError::NotRegistered {
                name: name.to_string(),
            })
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Default-deny: unknown targets and unknown callers are unapproved.
    pub fn is_approved(&self, name: &str, caller: &CallerId) -> bool {
        self.approvals
            .get(name)
            .is_some_and(|callers| callers.contains(caller))
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    pub fn approved_callers(&self, name: &str) -> Vec<CallerId> {
        self.approvals
            .get(name)
            .map(|callers| callers.iter().cloned().collect())
            .unwrap_or_default()
    }
}
