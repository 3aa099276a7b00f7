//! # Role Directory
//!
//! Principal→role memberships plus the independent authorized-issuer flag.
//!
//! The flag and the issuer role bit are stored separately on purpose: an
//! administrator can suspend a principal's issuance rights by clearing the
//! flag while the historical role membership stays visible.
//!
//! ## Layers
//!
//! - [`RoleStore`] — the storage seam. The registry is generic over it;
//!   [`InMemoryRoleStore`] is the default and what snapshots restore into.
//! - [`RoleDirectory`] — administrator-gated operations over a store. Each
//!   accepted, state-changing call returns the [`RegistryEvent`] the
//!   registry must commit.
//! - [`AuthorizationContext`] — the caller identity, passed by reference
//!   into every registry operation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use sbt_core::Principal;

use crate::error::{RegistryError, RegistryResult, Requirement};
use crate::events::RegistryEvent;

// ─── Roles ───────────────────────────────────────────────────────────

/// A role a principal can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Governs roles, issuers, transfer mode, timelock, and burn approval.
    Administrator,
    /// May issue (with the flag) and mutate credentials.
    Issuer,
    /// Attestation authority.
    Attester,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Issuer, Role::Attester];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Administrator => "ADMINISTRATOR",
            Self::Issuer => "ISSUER",
            Self::Attester => "ATTESTER",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "issuer" => Ok(Self::Issuer),
            "attester" => Ok(Self::Attester),
            other => Err(format!("unknown role: {other:?}")),
        }
    }
}

// ─── Authorization Context ───────────────────────────────────────────

/// Identity of the principal making a registry call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationContext {
    caller: Principal,
}

impl AuthorizationContext {
    /// A context for calls made by `caller`.
    pub fn new(caller: Principal) -> Self {
        Self { caller }
    }

    /// The calling principal.
    pub fn caller(&self) -> &Principal {
        &self.caller
    }
}

impl From<Principal> for AuthorizationContext {
    fn from(caller: Principal) -> Self {
        Self::new(caller)
    }
}

// ─── Role Store ──────────────────────────────────────────────────────

/// Storage for role memberships and the authorized-issuer flag.
///
/// Mutators return whether anything changed.
pub trait RoleStore {
    /// Whether `principal` holds `role`.
    fn has_role(&self, role: Role, principal: &Principal) -> bool;

    /// Add `principal` to `role`.
    fn insert_role(&mut self, role: Role, principal: Principal) -> bool;

    /// Remove `principal` from `role`.
    fn remove_role(&mut self, role: Role, principal: &Principal) -> bool;

    /// Members of `role`, in address order.
    fn members(&self, role: Role) -> Vec<Principal>;

    /// Whether `principal` carries the authorized-issuer flag.
    fn is_authorized_issuer(&self, principal: &Principal) -> bool;

    /// Set or clear the authorized-issuer flag.
    fn set_authorized_issuer(&mut self, principal: Principal, authorized: bool) -> bool;

    /// All principals carrying the authorized-issuer flag, in address order.
    fn authorized_issuers(&self) -> Vec<Principal>;
}

/// Role storage held in ordered in-process maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryRoleStore {
    memberships: BTreeMap<Role, BTreeSet<Principal>>,
    authorized_issuers: BTreeSet<Principal>,
}

impl InMemoryRoleStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleStore for InMemoryRoleStore {
    fn has_role(&self, role: Role, principal: &Principal) -> bool {
        self.memberships
            .get(&role)
            .is_some_and(|members| members.contains(principal))
    }

    fn insert_role(&mut self, role: Role, principal: Principal) -> bool {
        self.memberships.entry(role).or_default().insert(principal)
    }

    fn remove_role(&mut self, role: Role, principal: &Principal) -> bool {
        let Some(members) = self.memberships.get_mut(&role) else {
            return false;
        };
        let removed = members.remove(principal);
        if members.is_empty() {
            self.memberships.remove(&role);
        }
        removed
    }

    fn members(&self, role: Role) -> Vec<Principal> {
        self.memberships
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn is_authorized_issuer(&self, principal: &Principal) -> bool {
        self.authorized_issuers.contains(principal)
    }

    fn set_authorized_issuer(&mut self, principal: Principal, authorized: bool) -> bool {
        if authorized {
            self.authorized_issuers.insert(principal)
        } else {
            self.authorized_issuers.remove(&principal)
        }
    }

    fn authorized_issuers(&self) -> Vec<Principal> {
        self.authorized_issuers.iter().copied().collect()
    }
}

// ─── Role Directory ──────────────────────────────────────────────────

/// Administrator-gated role management over a [`RoleStore`].
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory<R> {
    store: R,
}

impl<R: RoleStore> RoleDirectory<R> {
    /// Wrap a store.
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &R {
        &self.store
    }

    /// Consume the directory, returning the store.
    pub fn into_store(self) -> R {
        self.store
    }

    /// Public role lookup.
    pub fn has_role(&self, role: Role, principal: &Principal) -> bool {
        self.store.has_role(role, principal)
    }

    /// Public flag lookup.
    pub fn is_authorized_issuer(&self, principal: &Principal) -> bool {
        self.store.is_authorized_issuer(principal)
    }

    /// Fail unless the caller holds `role`.
    pub fn require_role(&self, ctx: &AuthorizationContext, role: Role) -> RegistryResult<()> {
        if self.store.has_role(role, ctx.caller()) {
            Ok(())
        } else {
            Err(RegistryError::unauthorized(ctx.caller(), Requirement::Role(role)))
        }
    }

    /// Fail unless the caller holds both the issuer role and the flag.
    pub fn require_authorized_issuer(&self, ctx: &AuthorizationContext) -> RegistryResult<()> {
        let caller = ctx.caller();
        if self.store.has_role(Role::Issuer, caller) && self.store.is_authorized_issuer(caller) {
            Ok(())
        } else {
            Err(RegistryError::unauthorized(caller, Requirement::AuthorizedIssuer))
        }
    }

    /// Whether the caller is an administrator.
    pub fn is_administrator(&self, ctx: &AuthorizationContext) -> bool {
        self.store.has_role(Role::Administrator, ctx.caller())
    }

    /// Seed a membership without authorization or events (genesis/restore).
    pub(crate) fn seed_role(&mut self, role: Role, principal: Principal) {
        self.store.insert_role(role, principal);
    }

    /// Seed the flag without authorization or events (genesis/restore).
    pub(crate) fn seed_authorized_issuer(&mut self, principal: Principal) {
        self.store.set_authorized_issuer(principal, true);
    }

    /// Grant `role` to `principal`. Granting a held role is a no-op.
    pub fn grant_role(
        &mut self,
        ctx: &AuthorizationContext,
        role: Role,
        principal: Principal,
    ) -> RegistryResult<Option<RegistryEvent>> {
        self.require_role(ctx, Role::Administrator)?;
        if principal.is_null() {
            return Err(RegistryError::NullPrincipal);
        }
        if !self.store.insert_role(role, principal) {
            return Ok(None);
        }
        Ok(Some(RegistryEvent::RoleGranted {
            role,
            principal,
            by: *ctx.caller(),
        }))
    }

    /// Revoke `role` from `principal`. Revoking an absent role is a no-op.
    ///
    /// The last administrator cannot be removed.
    pub fn revoke_role(
        &mut self,
        ctx: &AuthorizationContext,
        role: Role,
        principal: Principal,
    ) -> RegistryResult<Option<RegistryEvent>> {
        self.require_role(ctx, Role::Administrator)?;
        if !self.store.has_role(role, &principal) {
            return Ok(None);
        }
        if role == Role::Administrator && self.store.members(Role::Administrator).len() == 1 {
            return Err(RegistryError::LastAdministrator(principal));
        }
        self.store.remove_role(role, &principal);
        Ok(Some(RegistryEvent::RoleRevoked {
            role,
            principal,
            by: *ctx.caller(),
        }))
    }

    /// Set the issuer role and the authorized-issuer flag together.
    pub fn authorize_issuer(
        &mut self,
        ctx: &AuthorizationContext,
        principal: Principal,
    ) -> RegistryResult<RegistryEvent> {
        self.require_role(ctx, Role::Administrator)?;
        if principal.is_null() {
            return Err(RegistryError::NullPrincipal);
        }
        if self.store.is_authorized_issuer(&principal) {
            return Err(RegistryError::AlreadyAuthorized(principal));
        }
        self.store.insert_role(Role::Issuer, principal);
        self.store.set_authorized_issuer(principal, true);
        Ok(RegistryEvent::IssuerAuthorized {
            principal,
            by: *ctx.caller(),
        })
    }

    /// Clear the authorized-issuer flag. The issuer role bit is retained.
    pub fn revoke_issuer(
        &mut self,
        ctx: &AuthorizationContext,
        principal: Principal,
    ) -> RegistryResult<RegistryEvent> {
        self.require_role(ctx, Role::Administrator)?;
        if !self.store.is_authorized_issuer(&principal) {
            return Err(RegistryError::NotAuthorized(principal));
        }
        self.store.set_authorized_issuer(principal, false);
        Ok(RegistryEvent::IssuerRevoked {
            principal,
            by: *ctx.caller(),
        })
    }
}
