//! # Registry Events
//!
//! The append-only record of accepted mutations. The registry commits
//! exactly one [`RegistryEvent`] per accepted state-changing call and none
//! on rejection. Each event is wrapped in an [`EventEnvelope`] carrying a
//! per-registry sequence number, a unique id, and the commit time, and is
//! handed to an [`EventSink`].
//!
//! The sink stands in for the ledger substrate. [`MemorySink`] keeps
//! envelopes for inspection; [`TracingSink`] writes them to the log and
//! counts them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sbt_core::{CategoryId, ContentRef, CredentialId, Principal, Timestamp};

use crate::burn::BurnPath;
use crate::roles::Role;

/// An accepted registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A credential was issued.
    CredentialIssued {
        /// New credential id.
        id: CredentialId,
        /// Owner of the credential.
        holder: Principal,
        /// Issuer of record.
        issuer: Principal,
        /// Category.
        category_id: CategoryId,
        /// Initial grade.
        grade: u8,
        /// Off-registry content pointer.
        content_ref: ContentRef,
    },
    /// A credential was verified.
    CredentialVerified {
        /// Credential id.
        id: CredentialId,
        /// Verifying issuer.
        by: Principal,
    },
    /// A credential's grade was updated.
    CredentialUpdated {
        /// Credential id.
        id: CredentialId,
        /// New grade.
        grade: u8,
        /// Version after the update.
        version: u32,
        /// Stated reason.
        reason: String,
        /// Updating issuer.
        by: Principal,
    },
    /// A credential was revoked.
    CredentialRevoked {
        /// Credential id.
        id: CredentialId,
        /// Stated reason.
        reason: String,
        /// Version after the revocation.
        version: u32,
        /// Revoking issuer.
        by: Principal,
    },
    /// Ownership moved through the transfer gate.
    CredentialTransferred {
        /// Credential id.
        id: CredentialId,
        /// Previous holder.
        from: Principal,
        /// New holder.
        to: Principal,
        /// Mover (issuer of record).
        by: Principal,
    },
    /// A holder granted single-use transfer consent.
    TransferConsentGranted {
        /// Credential id.
        id: CredentialId,
        /// Consenting holder.
        holder: Principal,
        /// Principal allowed to move the credential.
        mover: Principal,
    },
    /// A holder withdrew transfer consent.
    TransferConsentRevoked {
        /// Credential id.
        id: CredentialId,
        /// Withdrawing holder.
        holder: Principal,
    },
    /// A category name was set or overwritten.
    CategoryNamed {
        /// Category id.
        category_id: CategoryId,
        /// New name.
        name: String,
        /// Naming issuer.
        by: Principal,
    },
    /// An issuer of record asked for a credential to be burned.
    BurnRequested {
        /// Credential id.
        id: CredentialId,
        /// Stated reason.
        reason: String,
        /// Requesting issuer.
        by: Principal,
    },
    /// An administrator approved a burn request.
    BurnApproved {
        /// Credential id.
        id: CredentialId,
        /// Approving administrator.
        by: Principal,
    },
    /// A burn request was withdrawn.
    BurnCancelled {
        /// Credential id.
        id: CredentialId,
        /// Cancelling principal.
        by: Principal,
    },
    /// A credential was irreversibly deleted.
    CredentialBurned {
        /// Credential id.
        id: CredentialId,
        /// Stated reason.
        reason: String,
        /// Which governance path cleared the burn.
        path: BurnPath,
        /// Executing principal.
        by: Principal,
    },
    /// The global transfer switch was set.
    TransferModeChanged {
        /// New value.
        enabled: bool,
        /// Administrator.
        by: Principal,
    },
    /// The burn timelock duration was changed.
    BurnTimelockChanged {
        /// Duration before the change.
        previous_secs: u64,
        /// Duration after the change.
        secs: u64,
        /// Administrator.
        by: Principal,
    },
    /// A principal was made an authorized issuer.
    IssuerAuthorized {
        /// The new issuer.
        principal: Principal,
        /// Administrator.
        by: Principal,
    },
    /// A principal's issuance rights were suspended.
    IssuerRevoked {
        /// The suspended issuer.
        principal: Principal,
        /// Administrator.
        by: Principal,
    },
    /// A role was granted.
    RoleGranted {
        /// Role.
        role: Role,
        /// Grantee.
        principal: Principal,
        /// Administrator.
        by: Principal,
    },
    /// A role was revoked.
    RoleRevoked {
        /// Role.
        role: Role,
        /// Former member.
        principal: Principal,
        /// Administrator.
        by: Principal,
    },
}

impl RegistryEvent {
    /// Stable snake_case name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialIssued { .. } => "credential_issued",
            Self::CredentialVerified { .. } => "credential_verified",
            Self::CredentialUpdated { .. } => "credential_updated",
            Self::CredentialRevoked { .. } => "credential_revoked",
            Self::CredentialTransferred { .. } => "credential_transferred",
            Self::TransferConsentGranted { .. } => "transfer_consent_granted",
            Self::TransferConsentRevoked { .. } => "transfer_consent_revoked",
            Self::CategoryNamed { .. } => "category_named",
            Self::BurnRequested { .. } => "burn_requested",
            Self::BurnApproved { .. } => "burn_approved",
            Self::BurnCancelled { .. } => "burn_cancelled",
            Self::CredentialBurned { .. } => "credential_burned",
            Self::TransferModeChanged { .. } => "transfer_mode_changed",
            Self::BurnTimelockChanged { .. } => "burn_timelock_changed",
            Self::IssuerAuthorized { .. } => "issuer_authorized",
            Self::IssuerRevoked { .. } => "issuer_revoked",
            Self::RoleGranted { .. } => "role_granted",
            Self::RoleRevoked { .. } => "role_revoked",
        }
    }

    /// The credential this event concerns, if any.
    pub fn credential_id(&self) -> Option<CredentialId> {
        match self {
            Self::CredentialIssued { id, .. }
            | Self::CredentialVerified { id, .. }
            | Self::CredentialUpdated { id, .. }
            | Self::CredentialRevoked { id, .. }
            | Self::CredentialTransferred { id, .. }
            | Self::TransferConsentGranted { id, .. }
            | Self::TransferConsentRevoked { id, .. }
            | Self::BurnRequested { id, .. }
            | Self::BurnApproved { id, .. }
            | Self::BurnCancelled { id, .. }
            | Self::CredentialBurned { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// A committed event with its ledger metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Position in this registry's event stream, from 1.
    pub sequence: u64,
    /// Globally unique event id.
    pub event_id: Uuid,
    /// When the mutation was committed.
    pub committed_at: Timestamp,
    /// The mutation.
    pub event: RegistryEvent,
}

/// Receiver of committed events.
pub trait EventSink {
    /// Record one committed event. Called exactly once per accepted mutation.
    fn record(&mut self, envelope: &EventEnvelope);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, envelope: &EventEnvelope) {
        (**self).record(envelope);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&mut self, envelope: &EventEnvelope) {
        (**self).record(envelope);
    }
}

/// Keeps every committed envelope in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<EventEnvelope>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelopes in commit order.
    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Event kinds in commit order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.event.kind()).collect()
    }

    /// Number of committed events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The most recent envelope.
    pub fn last(&self) -> Option<&EventEnvelope> {
        self.events.last()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, envelope: &EventEnvelope) {
        self.events.push(envelope.clone());
    }
}

/// Logs each committed event and counts it under
/// `sbt_registry_events_total{kind}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, envelope: &EventEnvelope) {
        let kind = envelope.event.kind();
        tracing::info!(
            sequence = envelope.sequence,
            event_id = %envelope.event_id,
            committed_at = %envelope.committed_at,
            kind,
            credential = ?envelope.event.credential_id().map(|id| id.get()),
            "registry event committed"
        );
        metrics::counter!("sbt_registry_events_total", "kind" => kind).increment(1);
    }
}
