//! # Batch Façade
//!
//! Bulk variants of single-item operations. There is no batch issuance.
//!
//! Two failure policies apply:
//!
//! - **Uniform** (`verify_batch`, `set_category_names_batch`): every item
//!   is validated before anything is written. One bad item rejects the
//!   whole call with no change.
//! - **Partial** (`request_burn_batch`, `approve_burn_batch`,
//!   `cancel_burn_batch`, `burn_batch`): items whose own preconditions fail
//!   are skipped and reported in a [`BatchReport`]. Caller-level
//!   authorization still fails the whole call up front.
//!
//! Accepted items commit one event each, exactly as the single-item call
//! would.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use sbt_core::{CategoryId, Clock, CredentialId};

use crate::error::{RegistryError, RegistryResult};
use crate::events::EventSink;
use crate::registry::{validated_name, CredentialRegistry};
use crate::roles::{AuthorizationContext, Role, RoleStore};

/// An item a partial batch did not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    /// The skipped credential.
    pub id: CredentialId,
    /// Why it was skipped.
    pub error: RegistryError,
}

/// What a partial batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Ids applied, in input order.
    pub applied: Vec<CredentialId>,
    /// Ids skipped, in input order.
    pub skipped: Vec<SkippedItem>,
}

impl BatchReport {
    /// Whether every item was applied.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    fn record(&mut self, operation: &'static str, id: CredentialId, result: RegistryResult<()>) {
        match result {
            Ok(()) => self.applied.push(id),
            Err(error) => {
                debug!(operation, credential = %id, %error, "batch item skipped");
                self.skipped.push(SkippedItem { id, error });
            }
        }
    }
}

fn require_items<T>(items: &[T]) -> RegistryResult<()> {
    if items.is_empty() {
        return Err(RegistryError::EmptyBatch);
    }
    Ok(())
}

impl<R: RoleStore, E: EventSink, C: Clock> CredentialRegistry<R, E, C> {
    /// Verify every id, or none.
    ///
    /// Fails on the first missing, revoked, already verified, or repeated id.
    pub fn verify_batch(
        &mut self,
        ctx: &AuthorizationContext,
        ids: &[CredentialId],
    ) -> RegistryResult<()> {
        self.roles.require_role(ctx, Role::Issuer)?;
        require_items(ids)?;

        let mut seen = BTreeSet::new();
        for &id in ids {
            if !seen.insert(id) {
                warn!(credential = %id, "duplicate id in verify batch");
                return Err(RegistryError::DuplicateId(id));
            }
            let checked = self.store.get(id).and_then(|c| c.ensure_verifiable());
            if let Err(error) = checked {
                warn!(credential = %id, %error, "verify batch rejected");
                return Err(error);
            }
        }

        for &id in ids {
            self.apply_verify(ctx, id)?;
        }
        Ok(())
    }

    /// Name every category, or none.
    ///
    /// A category repeated in the batch is applied once with its last name.
    pub fn set_category_names_batch<S: AsRef<str>>(
        &mut self,
        ctx: &AuthorizationContext,
        category_ids: &[u64],
        names: &[S],
    ) -> RegistryResult<()> {
        self.roles.require_authorized_issuer(ctx)?;
        require_items(category_ids)?;
        if category_ids.len() != names.len() {
            return Err(RegistryError::LengthMismatch {
                ids: category_ids.len(),
                values: names.len(),
            });
        }

        let mut pending: BTreeMap<CategoryId, String> = BTreeMap::new();
        for (&raw, name) in category_ids.iter().zip(names) {
            let validated = CategoryId::new(raw)
                .map_err(RegistryError::from)
                .and_then(|id| Ok((id, validated_name(name.as_ref().to_string())?)));
            let (id, name) = match validated {
                Ok(item) => item,
                Err(error) => {
                    warn!(category = raw, %error, "category batch rejected");
                    return Err(error);
                }
            };
            if pending.insert(id, name).is_some() {
                warn!(category = %id, "duplicate category in batch, last name wins");
            }
        }

        for (id, name) in pending {
            self.apply_category_name(ctx, id, name);
        }
        Ok(())
    }

    /// Request burns, skipping ids the caller did not issue or that are
    /// already requested.
    pub fn request_burn_batch(
        &mut self,
        ctx: &AuthorizationContext,
        ids: &[CredentialId],
        reason: &str,
    ) -> RegistryResult<BatchReport> {
        require_items(ids)?;
        let mut report = BatchReport::default();
        for &id in ids {
            let result = self.request_burn(ctx, id, reason);
            report.record("request_burn", id, result);
        }
        Ok(report)
    }

    /// Approve burns, skipping ids with no live request.
    ///
    /// The caller must be an administrator.
    pub fn approve_burn_batch(
        &mut self,
        ctx: &AuthorizationContext,
        ids: &[CredentialId],
    ) -> RegistryResult<BatchReport> {
        self.roles.require_role(ctx, Role::Administrator)?;
        require_items(ids)?;
        let mut report = BatchReport::default();
        for &id in ids {
            let result = self.apply_approve_burn(ctx, id);
            report.record("approve_burn", id, result);
        }
        Ok(report)
    }

    /// Cancel burn requests, skipping ids with nothing to cancel or that
    /// the caller may not cancel.
    pub fn cancel_burn_batch(
        &mut self,
        ctx: &AuthorizationContext,
        ids: &[CredentialId],
    ) -> RegistryResult<BatchReport> {
        require_items(ids)?;
        let mut report = BatchReport::default();
        for &id in ids {
            let result = self.cancel_burn(ctx, id).and_then(|cleared| {
                if cleared {
                    Ok(())
                } else {
                    Err(RegistryError::NoRequest(id))
                }
            });
            report.record("cancel_burn", id, result);
        }
        Ok(report)
    }

    /// Burn every id governance has cleared, skipping the rest.
    pub fn burn_batch(
        &mut self,
        ctx: &AuthorizationContext,
        ids: &[CredentialId],
        reason: &str,
    ) -> RegistryResult<BatchReport> {
        require_items(ids)?;
        let mut report = BatchReport::default();
        for &id in ids {
            let result = self.burn(ctx, id, reason).map(|_| ());
            report.record("burn", id, result);
        }
        Ok(report)
    }
}
