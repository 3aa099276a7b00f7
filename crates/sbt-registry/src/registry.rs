//! # Credential Registry
//!
//! The façade every caller goes through. It owns the role directory, the
//! credential store, the indices, the transfer gate, and burn governance,
//! and it commits one event per accepted mutation to its [`EventSink`].
//!
//! ## Control flow
//!
//! ```text
//! call ──▶ authorization ──▶ validation ──▶ store mutation ──▶ index update ──▶ commit
//! ```
//!
//! Every precondition is checked before the first write. A rejected call
//! returns an error with the store, the indices and the sink untouched.
//!
//! ## Concurrency
//!
//! Mutations take `&mut self` and reads take `&self`. The registry holds no
//! locks of its own; callers sharing it across threads wrap it in theirs.

use tracing::debug;
use uuid::Uuid;

use sbt_core::{
    CategoryId, Clock, ContentRef, CredentialId, Principal, SystemClock, Timestamp,
    ValidationError,
};

use crate::burn::{BurnEligibility, BurnGovernance, BurnPath, BurnRequest};
use crate::config::{ConfigError, RegistryConfig};
use crate::credential::{Credential, CredentialStatus};
use crate::error::{RegistryError, RegistryResult, Requirement};
use crate::events::{EventEnvelope, EventSink, MemorySink, RegistryEvent};
use crate::index::{count_issued_between, scan_issued_between, DateRange, MultiIndex, Page};
use crate::roles::{AuthorizationContext, InMemoryRoleStore, Role, RoleDirectory, RoleStore};
use crate::store::{CategoryTable, CredentialStore};
use crate::transfer::{TransferGate, TransferOutcome};

/// The soulbound credential registry.
#[derive(Debug)]
pub struct CredentialRegistry<R = InMemoryRoleStore, E = MemorySink, C = SystemClock> {
    pub(crate) roles: RoleDirectory<R>,
    pub(crate) store: CredentialStore,
    pub(crate) categories: CategoryTable,
    pub(crate) index: MultiIndex,
    pub(crate) transfer: TransferGate,
    pub(crate) burns: BurnGovernance,
    pub(crate) sink: E,
    pub(crate) clock: C,
    pub(crate) sequence: u64,
}

impl<R: RoleStore, E: EventSink, C: Clock> CredentialRegistry<R, E, C> {
    /// Build an empty registry governed by `config`.
    ///
    /// The configured administrators are seeded into `roles` directly; no
    /// events are committed for genesis state.
    pub fn new(config: &RegistryConfig, roles: R, sink: E, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut roles = RoleDirectory::new(roles);
        for admin in &config.administrators {
            roles.seed_role(Role::Administrator, *admin);
        }
        Ok(Self {
            roles,
            store: CredentialStore::new(),
            categories: CategoryTable::new(),
            index: MultiIndex::new(),
            transfer: TransferGate::new(config.transfer_mode),
            burns: BurnGovernance::new(config.burn_timelock_secs),
            sink,
            clock,
            sequence: 0,
        })
    }

    pub(crate) fn commit(&mut self, event: RegistryEvent) {
        self.sequence = self.sequence.saturating_add(1);
        let envelope = EventEnvelope {
            sequence: self.sequence,
            event_id: Uuid::new_v4(),
            committed_at: self.clock.now(),
            event,
        };
        self.sink.record(&envelope);
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The event sink.
    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// Mutable access to the event sink.
    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    /// The clock used for timestamps and timelock evaluation.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The role directory.
    pub fn roles(&self) -> &RoleDirectory<R> {
        &self.roles
    }

    /// The secondary indices.
    pub fn index(&self) -> &MultiIndex {
        &self.index
    }

    /// Number of events committed so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    // ── Credential lifecycle ─────────────────────────────────────────

    /// Issue a new pending credential to `holder`.
    ///
    /// Requires the issuer role together with the authorized-issuer flag.
    pub fn issue(
        &mut self,
        ctx: &AuthorizationContext,
        holder: Principal,
        category_id: u64,
        grade: u8,
        content_ref: impl Into<String>,
    ) -> RegistryResult<CredentialId> {
        self.roles.require_authorized_issuer(ctx)?;
        if holder.is_null() {
            return Err(ValidationError::InvalidHolder.into());
        }
        let category_id = CategoryId::new(category_id)?;
        let content_ref = ContentRef::new(content_ref)?;
        let (id, following) = self.store.peek_allocation()?;

        let issuer = *ctx.caller();
        let credential = Credential::new_issued(
            id,
            holder,
            issuer,
            category_id,
            grade,
            content_ref.clone(),
            self.clock.now(),
        );
        self.index.insert(&credential);
        self.store.insert_allocated(credential, following);

        debug!(credential = %id, holder = %holder, issuer = %issuer, "credential issued");
        self.commit(RegistryEvent::CredentialIssued {
            id,
            holder,
            issuer,
            category_id,
            grade,
            content_ref,
        });
        Ok(id)
    }

    /// Mark a pending credential verified.
    pub fn verify(&mut self, ctx: &AuthorizationContext, id: CredentialId) -> RegistryResult<()> {
        self.roles.require_role(ctx, Role::Issuer)?;
        self.apply_verify(ctx, id)
    }

    pub(crate) fn apply_verify(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
    ) -> RegistryResult<()> {
        let credential = self.store.get_mut(id)?;
        let before = credential.status();
        credential.verify()?;
        self.index.move_status(id, before, CredentialStatus::Verified);

        debug!(credential = %id, caller = %ctx.caller(), "credential verified");
        self.commit(RegistryEvent::CredentialVerified {
            id,
            by: *ctx.caller(),
        });
        Ok(())
    }

    /// Replace a credential's grade. Returns the new version.
    pub fn update(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
        grade: u8,
        reason: &str,
    ) -> RegistryResult<u32> {
        self.roles.require_role(ctx, Role::Issuer)?;
        let now = self.clock.now();
        let credential = self.store.get_mut(id)?;
        credential.update(grade, reason, now)?;
        let version = credential.version;

        debug!(credential = %id, version, caller = %ctx.caller(), "credential updated");
        self.commit(RegistryEvent::CredentialUpdated {
            id,
            grade,
            version,
            reason: reason.to_string(),
            by: *ctx.caller(),
        });
        Ok(version)
    }

    /// Revoke a credential. Returns the new version.
    pub fn revoke(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
        reason: &str,
    ) -> RegistryResult<u32> {
        self.roles.require_role(ctx, Role::Issuer)?;
        let credential = self.store.get_mut(id)?;
        let before = credential.revoke(reason)?;
        let version = credential.version;
        self.index.move_status(id, before, CredentialStatus::Revoked);

        debug!(credential = %id, version, caller = %ctx.caller(), "credential revoked");
        self.commit(RegistryEvent::CredentialRevoked {
            id,
            reason: reason.to_string(),
            version,
            by: *ctx.caller(),
        });
        Ok(version)
    }

    /// Public read of one credential.
    pub fn read(&self, id: CredentialId) -> RegistryResult<&Credential> {
        self.store.get(id)
    }

    /// Whether a live credential with this id exists.
    pub fn exists(&self, id: CredentialId) -> bool {
        self.store.contains(id)
    }

    /// Ids ever allocated, including burned ones.
    pub fn total_issued(&self) -> u64 {
        self.store.total_issued()
    }

    /// Credentials currently stored.
    pub fn total_live(&self) -> usize {
        self.store.len()
    }

    // ── Categories ───────────────────────────────────────────────────

    /// Set or overwrite a category's display name.
    pub fn set_category_name(
        &mut self,
        ctx: &AuthorizationContext,
        category_id: u64,
        name: impl Into<String>,
    ) -> RegistryResult<()> {
        self.roles.require_authorized_issuer(ctx)?;
        let category_id = CategoryId::new(category_id)?;
        let name = validated_name(name.into())?;
        self.apply_category_name(ctx, category_id, name);
        Ok(())
    }

    pub(crate) fn apply_category_name(
        &mut self,
        ctx: &AuthorizationContext,
        category_id: CategoryId,
        name: String,
    ) {
        self.categories.set(category_id, name.clone());
        debug!(category = %category_id, caller = %ctx.caller(), "category named");
        self.commit(RegistryEvent::CategoryNamed {
            category_id,
            name,
            by: *ctx.caller(),
        });
    }

    /// Public read of a category's name.
    pub fn category_name(&self, category_id: CategoryId) -> RegistryResult<&str> {
        self.categories.name(category_id)
    }

    /// All named categories in id order.
    pub fn categories(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.categories.iter()
    }

    // ── Roles ────────────────────────────────────────────────────────

    /// Grant `role`. Returns `false` if it was already held.
    pub fn grant_role(
        &mut self,
        ctx: &AuthorizationContext,
        role: Role,
        principal: Principal,
    ) -> RegistryResult<bool> {
        match self.roles.grant_role(ctx, role, principal)? {
            Some(event) => {
                self.commit(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Revoke `role`. Returns `false` if it was not held.
    pub fn revoke_role(
        &mut self,
        ctx: &AuthorizationContext,
        role: Role,
        principal: Principal,
    ) -> RegistryResult<bool> {
        match self.roles.revoke_role(ctx, role, principal)? {
            Some(event) => {
                self.commit(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Public role lookup.
    pub fn has_role(&self, role: Role, principal: &Principal) -> bool {
        self.roles.has_role(role, principal)
    }

    /// Public authorized-issuer flag lookup.
    pub fn is_authorized_issuer(&self, principal: &Principal) -> bool {
        self.roles.is_authorized_issuer(principal)
    }

    /// Grant the issuer role and set the authorized-issuer flag.
    pub fn authorize_issuer(
        &mut self,
        ctx: &AuthorizationContext,
        principal: Principal,
    ) -> RegistryResult<()> {
        let event = self.roles.authorize_issuer(ctx, principal)?;
        self.commit(event);
        Ok(())
    }

    /// Clear the authorized-issuer flag, keeping the role bit.
    pub fn revoke_issuer(
        &mut self,
        ctx: &AuthorizationContext,
        principal: Principal,
    ) -> RegistryResult<()> {
        let event = self.roles.revoke_issuer(ctx, principal)?;
        self.commit(event);
        Ok(())
    }

    // ── Transfer ─────────────────────────────────────────────────────

    /// Set the global transfer switch. Commits an event even if unchanged.
    pub fn set_transfer_mode(
        &mut self,
        ctx: &AuthorizationContext,
        enabled: bool,
    ) -> RegistryResult<()> {
        self.roles.require_role(ctx, Role::Administrator)?;
        self.transfer.set_enabled(enabled);
        self.commit(RegistryEvent::TransferModeChanged {
            enabled,
            by: *ctx.caller(),
        });
        Ok(())
    }

    /// Whether transfer mode is on.
    pub fn transfer_mode(&self) -> bool {
        self.transfer.is_enabled()
    }

    /// Holder consents to `mover` moving this credential once.
    pub fn grant_transfer_consent(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
        mover: Principal,
    ) -> RegistryResult<()> {
        let holder = self.require_holder(ctx, id)?;
        if mover.is_null() {
            return Err(RegistryError::NullPrincipal);
        }
        self.transfer.grant(id, mover);
        self.commit(RegistryEvent::TransferConsentGranted { id, holder, mover });
        Ok(())
    }

    /// Holder withdraws consent. Returns whether one was outstanding.
    pub fn revoke_transfer_consent(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
    ) -> RegistryResult<bool> {
        let holder = self.require_holder(ctx, id)?;
        let withdrawn = self.transfer.withdraw(id);
        if withdrawn {
            self.commit(RegistryEvent::TransferConsentRevoked { id, holder });
        }
        Ok(withdrawn)
    }

    /// The principal currently holding consent for `id`.
    pub fn transfer_consent(&self, id: CredentialId) -> Option<&Principal> {
        self.transfer.consent(id)
    }

    /// Attempt to move `id` to `new_holder` through the transfer gate.
    ///
    /// Unmet gate conditions are reported as [`TransferOutcome::Denied`];
    /// errors are reserved for unknown ids and unusable new holders.
    pub fn transfer(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
        new_holder: Principal,
    ) -> RegistryResult<TransferOutcome> {
        let credential = self.store.get(id)?;
        if new_holder.is_null() || credential.is_held_by(&new_holder) {
            return Err(ValidationError::InvalidHolder.into());
        }
        if let Err(reason) = self.transfer.evaluate(credential, ctx.caller()) {
            debug!(credential = %id, caller = %ctx.caller(), %reason, "transfer denied");
            return Ok(TransferOutcome::Denied { reason });
        }
        let from = credential.holder;

        self.store.get_mut(id)?.holder = new_holder;
        self.index.move_holder(id, from, new_holder);
        self.transfer.withdraw(id);

        debug!(credential = %id, from = %from, to = %new_holder, "credential transferred");
        self.commit(RegistryEvent::CredentialTransferred {
            id,
            from,
            to: new_holder,
            by: *ctx.caller(),
        });
        Ok(TransferOutcome::Applied {
            id,
            from,
            to: new_holder,
        })
    }

    fn require_holder(
        &self,
        ctx: &AuthorizationContext,
        id: CredentialId,
    ) -> RegistryResult<Principal> {
        let credential = self.store.get(id)?;
        if !credential.is_held_by(ctx.caller()) {
            return Err(RegistryError::unauthorized(ctx.caller(), Requirement::Holder));
        }
        Ok(credential.holder)
    }

    // ── Burn governance ──────────────────────────────────────────────

    /// Issuer of record asks for `id` to be burned.
    pub fn request_burn(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
        reason: &str,
    ) -> RegistryResult<()> {
        let credential = self.store.get(id)?;
        if !credential.is_issued_by(ctx.caller()) {
            return Err(RegistryError::unauthorized(
                ctx.caller(),
                Requirement::IssuerOfRecord,
            ));
        }
        let now = self.clock.now();
        self.burns.open(id, *ctx.caller(), reason, now)?;

        debug!(credential = %id, caller = %ctx.caller(), "burn requested");
        self.commit(RegistryEvent::BurnRequested {
            id,
            reason: reason.to_string(),
            by: *ctx.caller(),
        });
        Ok(())
    }

    /// Administrator approves an outstanding burn request.
    pub fn approve_burn(&mut self, ctx: &AuthorizationContext, id: CredentialId) -> RegistryResult<()> {
        self.roles.require_role(ctx, Role::Administrator)?;
        self.apply_approve_burn(ctx, id)
    }

    pub(crate) fn apply_approve_burn(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
    ) -> RegistryResult<()> {
        self.store.get(id)?;
        self.burns.approve(id)?;
        debug!(credential = %id, caller = %ctx.caller(), "burn approved");
        self.commit(RegistryEvent::BurnApproved {
            id,
            by: *ctx.caller(),
        });
        Ok(())
    }

    /// Withdraw a burn request. Returns whether one was cleared.
    ///
    /// Allowed for the issuer of record or an administrator.
    pub fn cancel_burn(&mut self, ctx: &AuthorizationContext, id: CredentialId) -> RegistryResult<bool> {
        let is_admin = self.roles.is_administrator(ctx);
        match self.store.get(id) {
            Ok(credential) => {
                if !is_admin && !credential.is_issued_by(ctx.caller()) {
                    return Err(RegistryError::unauthorized(
                        ctx.caller(),
                        Requirement::AdministratorOrIssuerOfRecord,
                    ));
                }
            }
            Err(err) if !is_admin => return Err(err),
            Err(_) => {}
        }
        let cleared = self.burns.clear(id).is_some();
        if cleared {
            debug!(credential = %id, caller = %ctx.caller(), "burn request cancelled");
            self.commit(RegistryEvent::BurnCancelled {
                id,
                by: *ctx.caller(),
            });
        }
        Ok(cleared)
    }

    /// Irreversibly delete a credential.
    ///
    /// Administrators burn immediately. Anyone else needs a request that is
    /// approved or older than the current timelock.
    pub fn burn(
        &mut self,
        ctx: &AuthorizationContext,
        id: CredentialId,
        reason: &str,
    ) -> RegistryResult<BurnPath> {
        self.store.get(id)?;
        let eligibility = self
            .burns
            .evaluate(id, self.roles.is_administrator(ctx), self.clock.now());
        let Some(path) = eligibility.path() else {
            return Err(RegistryError::unauthorized(
                ctx.caller(),
                Requirement::BurnClearance,
            ));
        };

        let credential = self.store.remove(id)?;
        self.index.remove(&credential);
        self.burns.clear(id);
        self.transfer.withdraw(id);

        debug!(credential = %id, %path, caller = %ctx.caller(), "credential burned");
        self.commit(RegistryEvent::CredentialBurned {
            id,
            reason: reason.to_string(),
            path,
            by: *ctx.caller(),
        });
        Ok(path)
    }

    /// Set the burn timelock. Returns the previous duration.
    pub fn set_burn_timelock(&mut self, ctx: &AuthorizationContext, secs: u64) -> RegistryResult<u64> {
        self.roles.require_role(ctx, Role::Administrator)?;
        let previous_secs = self.burns.set_timelock(secs);
        self.commit(RegistryEvent::BurnTimelockChanged {
            previous_secs,
            secs,
            by: *ctx.caller(),
        });
        Ok(previous_secs)
    }

    /// Current burn timelock in seconds.
    pub fn burn_timelock_secs(&self) -> u64 {
        self.burns.timelock_secs()
    }

    /// The live burn request for `id`.
    pub fn burn_request(&self, id: CredentialId) -> Option<&BurnRequest> {
        self.burns.request(id)
    }

    /// How a burn of `id` by this caller would be evaluated right now.
    pub fn burn_eligibility(
        &self,
        ctx: &AuthorizationContext,
        id: CredentialId,
    ) -> RegistryResult<BurnEligibility> {
        self.store.get(id)?;
        Ok(self
            .burns
            .evaluate(id, self.roles.is_administrator(ctx), self.clock.now()))
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Credentials in `status`, ascending id.
    pub fn page_by_status(&self, status: CredentialStatus, offset: usize, limit: usize) -> Page {
        self.index.page_by_status(status, offset, limit)
    }

    /// Number of credentials in `status`.
    pub fn count_by_status(&self, status: CredentialStatus) -> usize {
        self.index.count_by_status(status)
    }

    /// Credentials held by `holder`, ascending id.
    pub fn page_by_holder(&self, holder: &Principal, offset: usize, limit: usize) -> Page {
        self.index.page_by_holder(holder, offset, limit)
    }

    /// Number of credentials held by `holder`.
    pub fn count_by_holder(&self, holder: &Principal) -> usize {
        self.index.count_by_holder(holder)
    }

    /// Credentials issued by `issuer`, ascending id.
    pub fn page_by_issuer(&self, issuer: &Principal, offset: usize, limit: usize) -> Page {
        self.index.page_by_issuer(issuer, offset, limit)
    }

    /// Number of credentials issued by `issuer`.
    pub fn count_by_issuer(&self, issuer: &Principal) -> usize {
        self.index.count_by_issuer(issuer)
    }

    /// Credentials in `category`, ascending id.
    pub fn page_by_category(&self, category: CategoryId, offset: usize, limit: usize) -> Page {
        self.index.page_by_category(category, offset, limit)
    }

    /// Number of credentials in `category`.
    pub fn count_by_category(&self, category: CategoryId) -> usize {
        self.index.count_by_category(category)
    }

    /// Credentials issued within `[from, to]`, ascending id.
    pub fn page_issued_between(
        &self,
        from: Timestamp,
        to: Timestamp,
        offset: usize,
        limit: usize,
    ) -> RegistryResult<Page> {
        let range = DateRange::new(from, to)?;
        Ok(scan_issued_between(self.store.iter(), range, offset, limit))
    }

    /// Number of credentials issued within `[from, to]`.
    pub fn count_issued_between(&self, from: Timestamp, to: Timestamp) -> RegistryResult<usize> {
        let range = DateRange::new(from, to)?;
        Ok(count_issued_between(self.store.iter(), range))
    }
}

pub(crate) fn validated_name(name: String) -> RegistryResult<String> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    Ok(name)
}
