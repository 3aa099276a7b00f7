//! # Registry Snapshot
//!
//! A serializable image of the whole registry state: records, categories,
//! roles, pending governance, switches, and counters. Indices are not
//! persisted; [`CredentialRegistry::restore`] rebuilds them from the
//! records, so a restored registry answers every page query exactly as the
//! registry that produced the image.
//!
//! Restoring validates the image before building anything:
//!
//! - record ids are unique and below the id counter;
//! - no live record has a null holder;
//! - every burn request and transfer consent names a live record;
//! - at least one administrator remains.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sbt_core::{CategoryId, Clock, CredentialId, Principal};

use crate::burn::{BurnGovernance, BurnRequest};
use crate::credential::Credential;
use crate::events::EventSink;
use crate::index::MultiIndex;
use crate::registry::CredentialRegistry;
use crate::roles::{Role, RoleDirectory, RoleStore};
use crate::store::{CategoryTable, CredentialStore};
use crate::transfer::TransferGate;

/// Current snapshot layout version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A named category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Category id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// Members of one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMembers {
    /// The role.
    pub role: Role,
    /// Its members in address order.
    pub members: Vec<Principal>,
}

/// A live burn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequestEntry {
    /// Credential id.
    pub id: CredentialId,
    /// The request.
    #[serde(flatten)]
    pub request: BurnRequest,
}

/// An outstanding transfer consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentEntry {
    /// Credential id.
    pub id: CredentialId,
    /// Principal allowed to move it.
    pub mover: Principal,
}

/// Full registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Layout version, [`SNAPSHOT_FORMAT_VERSION`] when written.
    pub format_version: u32,
    /// Next id to allocate.
    pub next_id: CredentialId,
    /// Events committed so far.
    pub sequence: u64,
    /// Global transfer switch.
    pub transfer_mode: bool,
    /// Burn timelock in seconds.
    pub burn_timelock_secs: u64,
    /// Live records in id order.
    pub credentials: Vec<Credential>,
    /// Named categories in id order.
    pub categories: Vec<CategoryEntry>,
    /// Role memberships; roles without members are omitted.
    pub roles: Vec<RoleMembers>,
    /// Principals carrying the authorized-issuer flag.
    pub authorized_issuers: Vec<Principal>,
    /// Live burn requests in id order.
    pub burn_requests: Vec<BurnRequestEntry>,
    /// Outstanding transfer consents in id order.
    pub transfer_consents: Vec<ConsentEntry>,
}

impl RegistrySnapshot {
    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON and check the layout version.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.format_version));
        }
        Ok(snapshot)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json()?).map_err(io_err)
    }

    /// Read from `path`.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.next_id < CredentialId::FIRST {
            return Err(SnapshotError::InvalidIdCounter(self.next_id));
        }
        let mut ids = BTreeSet::new();
        for credential in &self.credentials {
            if credential.id < CredentialId::FIRST {
                return Err(SnapshotError::ReservedCredentialId(credential.id));
            }
            if !ids.insert(credential.id) {
                return Err(SnapshotError::DuplicateCredential(credential.id));
            }
            if credential.id >= self.next_id {
                return Err(SnapshotError::IdCounterBehind {
                    id: credential.id,
                    next_id: self.next_id,
                });
            }
            if credential.holder.is_null() {
                return Err(SnapshotError::NullHolder(credential.id));
            }
        }
        if let Some(entry) = self.burn_requests.iter().find(|e| !ids.contains(&e.id)) {
            return Err(SnapshotError::OrphanBurnRequest(entry.id));
        }
        if let Some(entry) = self.transfer_consents.iter().find(|e| !ids.contains(&e.id)) {
            return Err(SnapshotError::OrphanConsent(entry.id));
        }
        let has_admin = self
            .roles
            .iter()
            .any(|r| r.role == Role::Administrator && !r.members.is_empty());
        if !has_admin {
            return Err(SnapshotError::NoAdministrators);
        }
        Ok(())
    }
}

/// Snapshot persistence and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),
    #[error("id counter {0} is below the first credential id")]
    InvalidIdCounter(CredentialId),
    #[error("credential id {0} is reserved")]
    ReservedCredentialId(CredentialId),
    #[error("credential {0} appears more than once")]
    DuplicateCredential(CredentialId),
    #[error("credential {id} is not below the id counter {next_id}")]
    IdCounterBehind { id: CredentialId, next_id: CredentialId },
    #[error("credential {0} has a null holder")]
    NullHolder(CredentialId),
    #[error("burn request for unknown credential {0}")]
    OrphanBurnRequest(CredentialId),
    #[error("transfer consent for unknown credential {0}")]
    OrphanConsent(CredentialId),
    #[error("snapshot has no administrator")]
    NoAdministrators,
}

impl<R: RoleStore, E: EventSink, C: Clock> CredentialRegistry<R, E, C> {
    /// Capture the full state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let role_store = self.roles.store();
        RegistrySnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_id: self.store.next_id(),
            sequence: self.sequence,
            transfer_mode: self.transfer.is_enabled(),
            burn_timelock_secs: self.burns.timelock_secs(),
            credentials: self.store.records().values().cloned().collect(),
            categories: self
                .categories
                .names()
                .iter()
                .map(|(id, name)| CategoryEntry {
                    id: *id,
                    name: name.clone(),
                })
                .collect(),
            roles: Role::ALL
                .iter()
                .map(|&role| RoleMembers {
                    role,
                    members: role_store.members(role),
                })
                .filter(|r| !r.members.is_empty())
                .collect(),
            authorized_issuers: role_store.authorized_issuers(),
            burn_requests: self
                .burns
                .requests()
                .map(|(id, request)| BurnRequestEntry {
                    id,
                    request: request.clone(),
                })
                .collect(),
            transfer_consents: self
                .transfer
                .consents()
                .map(|(id, mover)| ConsentEntry { id, mover: *mover })
                .collect(),
        }
    }

    /// Rebuild a registry from a snapshot into fresh role storage.
    ///
    /// `roles` should be empty; snapshot memberships are added to it.
    pub fn restore(
        snapshot: RegistrySnapshot,
        roles: R,
        sink: E,
        clock: C,
    ) -> Result<Self, SnapshotError> {
        snapshot.validate()?;

        let mut roles = RoleDirectory::new(roles);
        for entry in &snapshot.roles {
            for member in &entry.members {
                roles.seed_role(entry.role, *member);
            }
        }
        for principal in &snapshot.authorized_issuers {
            roles.seed_authorized_issuer(*principal);
        }

        let records: BTreeMap<CredentialId, Credential> = snapshot
            .credentials
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let index = MultiIndex::rebuild(records.values());
        let categories = snapshot
            .categories
            .into_iter()
            .map(|entry| (entry.id, entry.name))
            .collect();
        let requests = snapshot
            .burn_requests
            .into_iter()
            .map(|entry| (entry.id, entry.request))
            .collect();
        let consents = snapshot
            .transfer_consents
            .into_iter()
            .map(|entry| (entry.id, entry.mover))
            .collect();

        Ok(Self {
            roles,
            store: CredentialStore::from_parts(records, snapshot.next_id),
            categories: CategoryTable::from_names(categories),
            index,
            transfer: TransferGate::from_parts(snapshot.transfer_mode, consents),
            burns: BurnGovernance::from_parts(requests, snapshot.burn_timelock_secs),
            sink,
            clock,
            sequence: snapshot.sequence,
        })
    }
}
