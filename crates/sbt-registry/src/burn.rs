//! # Burn Governance — Two-Path Timelock/Approval Protocol
//!
//! Gates irreversible deletion of a credential behind dual control.
//!
//! ## States (per credential)
//!
//! ```text
//! NoRequest ──request──▶ Requested ──approve──▶ Approved
//!     ▲                    │    │                  │
//!     └────cancel──────────┘    └──burn──▶ Executed ◀──burn──┘
//! ```
//!
//! ## Paths
//!
//! - **Immediate** — an administrator burns, with or without a request.
//! - **Institution** — a request exists and is either approved by an
//!   administrator or older than the current timelock.
//!
//! ## Timelock
//!
//! The timelock is a predicate, `now >= requested_at + timelock`, evaluated
//! only when a burn is attempted. There is no sweep and no timer; an
//! elapsed request simply waits. The duration is read at burn time, so
//! changing it moves the deadline of every outstanding request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sbt_core::{CredentialId, Principal, Timestamp};

use crate::error::{RegistryError, RegistryResult};

/// Default burn timelock: three days.
pub const DEFAULT_BURN_TIMELOCK_SECS: u64 = 3 * 24 * 60 * 60;

/// A live request to burn one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequest {
    /// When the request was made.
    pub requested_at: Timestamp,
    /// Business reason given by the issuer.
    pub reason: String,
    /// Whether an administrator approved it.
    pub approved: bool,
    /// The issuer of record who asked.
    pub requested_by: Principal,
}

/// The governance path that cleared a burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnPath {
    /// Administrator-initiated.
    Immediate,
    /// Request approved by an administrator.
    Approved,
    /// Request older than the timelock.
    TimelockElapsed,
}

impl std::fmt::Display for BurnPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Immediate => "IMMEDIATE",
            Self::Approved => "APPROVED",
            Self::TimelockElapsed => "TIMELOCK_ELAPSED",
        };
        f.write_str(s)
    }
}

/// Whether a burn would be permitted right now, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BurnEligibility {
    /// A burn would succeed along this path.
    Allowed {
        /// The clearing path.
        path: BurnPath,
    },
    /// A request exists but is neither approved nor past its deadline.
    Pending {
        /// When the timelock elapses under the current duration, or `None`
        /// if the deadline is beyond the representable range.
        unlocks_at: Option<Timestamp>,
    },
    /// No request exists and the caller is not an administrator.
    NotRequested,
}

impl BurnEligibility {
    /// The clearing path, if allowed.
    pub fn path(&self) -> Option<BurnPath> {
        match self {
            Self::Allowed { path } => Some(*path),
            _ => None,
        }
    }
}

/// Outstanding burn requests and the global timelock.
#[derive(Debug, Clone)]
pub struct BurnGovernance {
    requests: BTreeMap<CredentialId, BurnRequest>,
    timelock_secs: u64,
}

impl Default for BurnGovernance {
    fn default() -> Self {
        Self::new(DEFAULT_BURN_TIMELOCK_SECS)
    }
}

impl BurnGovernance {
    /// No requests, the given timelock.
    pub fn new(timelock_secs: u64) -> Self {
        Self {
            requests: BTreeMap::new(),
            timelock_secs,
        }
    }

    pub(crate) fn from_parts(requests: BTreeMap<CredentialId, BurnRequest>, timelock_secs: u64) -> Self {
        Self {
            requests,
            timelock_secs,
        }
    }

    /// Current timelock duration in seconds.
    pub fn timelock_secs(&self) -> u64 {
        self.timelock_secs
    }

    /// Replace the timelock; returns the previous value.
    pub(crate) fn set_timelock(&mut self, secs: u64) -> u64 {
        std::mem::replace(&mut self.timelock_secs, secs)
    }

    /// The live request for `id`.
    pub fn request(&self, id: CredentialId) -> Option<&BurnRequest> {
        self.requests.get(&id)
    }

    /// All live requests in id order.
    pub fn requests(&self) -> impl Iterator<Item = (CredentialId, &BurnRequest)> {
        self.requests.iter().map(|(id, r)| (*id, r))
    }

    pub(crate) fn open(
        &mut self,
        id: CredentialId,
        requested_by: Principal,
        reason: &str,
        now: Timestamp,
    ) -> RegistryResult<()> {
        if self.requests.contains_key(&id) {
            return Err(RegistryError::AlreadyRequested(id));
        }
        self.requests.insert(
            id,
            BurnRequest {
                requested_at: now,
                reason: reason.to_string(),
                approved: false,
                requested_by,
            },
        );
        Ok(())
    }

    pub(crate) fn approve(&mut self, id: CredentialId) -> RegistryResult<()> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(RegistryError::NoRequest(id))?;
        request.approved = true;
        Ok(())
    }

    /// Remove the request, if any.
    pub(crate) fn clear(&mut self, id: CredentialId) -> Option<BurnRequest> {
        self.requests.remove(&id)
    }

    /// Evaluate the burn predicate for a caller at `now`.
    pub fn evaluate(&self, id: CredentialId, caller_is_admin: bool, now: Timestamp) -> BurnEligibility {
        if caller_is_admin {
            return BurnEligibility::Allowed {
                path: BurnPath::Immediate,
            };
        }
        let Some(request) = self.requests.get(&id) else {
            return BurnEligibility::NotRequested;
        };
        if request.approved {
            return BurnEligibility::Allowed {
                path: BurnPath::Approved,
            };
        }
        let unlocks_at = request.requested_at.checked_add_secs(self.timelock_secs);
        match unlocks_at {
            Some(deadline) if now >= deadline => BurnEligibility::Allowed {
                path: BurnPath::TimelockElapsed,
            },
            _ => BurnEligibility::Pending { unlocks_at },
        }
    }
}
