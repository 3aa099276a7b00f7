//! # Credential Lifecycle State Machine
//!
//! Models a single soulbound credential record and the transitions an
//! issuer can apply to it.
//!
//! ## States
//!
//! ```text
//! Pending ──▶ Verified
//!    │            │
//!    └────┬───────┘
//!         ▼
//!      Revoked        (terminal for verification, not for deletion)
//!
//! any state ──burn──▶ (record removed)
//! ```
//!
//! The status is derived from the `verified`/`revoked` flags rather than
//! stored, so the two can never disagree. Once `revoked` is set, `verify`
//! and `update` are rejected forever.
//!
//! ## Versioning
//!
//! `version` starts at 1 and increases by exactly one per accepted `update`
//! or `revoke`. Verification does not touch it.
//!
//! Every transition validates first and mutates only on success, so a
//! rejected call leaves the record untouched.

use serde::{Deserialize, Serialize};

use sbt_core::{CategoryId, ContentRef, CredentialId, Principal, Timestamp};

use crate::error::{RegistryError, RegistryResult};

// ─── Status ──────────────────────────────────────────────────────────

/// The verification status of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CredentialStatus {
    /// Issued, awaiting verification.
    Pending,
    /// Verified by an issuer.
    Verified,
    /// Revoked (terminal for verification).
    Revoked,
}

impl CredentialStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [CredentialStatus; 3] = [
        CredentialStatus::Pending,
        CredentialStatus::Verified,
        CredentialStatus::Revoked,
    ];
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CredentialStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "revoked" => Ok(Self::Revoked),
            other => Err(format!("unknown credential status: {other:?}")),
        }
    }
}

// ─── Credential ──────────────────────────────────────────────────────

/// A credential record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Sequential identifier, immutable.
    pub id: CredentialId,
    /// Current owner.
    pub holder: Principal,
    /// Issuer of record.
    pub issuer: Principal,
    /// Category, never 0.
    pub category_id: CategoryId,
    /// When the credential was issued.
    pub issued_at: Timestamp,
    /// Grade or score.
    pub grade: u8,
    /// Whether an issuer has verified it.
    pub verified: bool,
    /// Whether it has been revoked.
    pub revoked: bool,
    /// Reason given at revocation.
    pub revocation_reason: Option<String>,
    /// Mutation counter, from 1.
    pub version: u32,
    /// When the grade was last updated.
    pub last_update_at: Option<Timestamp>,
    /// Reason given at the last update.
    pub update_reason: Option<String>,
    /// Off-registry content pointer.
    pub content_ref: ContentRef,
}

impl Credential {
    /// A freshly issued, pending credential at version 1.
    pub fn new_issued(
        id: CredentialId,
        holder: Principal,
        issuer: Principal,
        category_id: CategoryId,
        grade: u8,
        content_ref: ContentRef,
        issued_at: Timestamp,
    ) -> Self {
        Self {
            id,
            holder,
            issuer,
            category_id,
            issued_at,
            grade,
            verified: false,
            revoked: false,
            revocation_reason: None,
            version: 1,
            last_update_at: None,
            update_reason: None,
            content_ref,
        }
    }

    /// Derived lifecycle status.
    pub fn status(&self) -> CredentialStatus {
        if self.revoked {
            CredentialStatus::Revoked
        } else if self.verified {
            CredentialStatus::Verified
        } else {
            CredentialStatus::Pending
        }
    }

    /// Whether `principal` is the issuer of record.
    pub fn is_issued_by(&self, principal: &Principal) -> bool {
        self.issuer == *principal
    }

    /// Whether `principal` is the current holder.
    pub fn is_held_by(&self, principal: &Principal) -> bool {
        self.holder == *principal
    }

    /// Check that `verify` would be accepted.
    pub fn ensure_verifiable(&self) -> RegistryResult<()> {
        if self.revoked {
            return Err(RegistryError::Revoked(self.id));
        }
        if self.verified {
            return Err(RegistryError::AlreadyVerified(self.id));
        }
        Ok(())
    }

    /// Mark verified (PENDING → VERIFIED).
    pub(crate) fn verify(&mut self) -> RegistryResult<()> {
        self.ensure_verifiable()?;
        self.verified = true;
        Ok(())
    }

    /// Replace the grade. Rejected once revoked.
    pub(crate) fn update(&mut self, grade: u8, reason: &str, now: Timestamp) -> RegistryResult<()> {
        if self.revoked {
            return Err(RegistryError::Revoked(self.id));
        }
        let version = self.next_version()?;
        self.grade = grade;
        self.version = version;
        self.last_update_at = Some(now);
        self.update_reason = Some(reason.to_string());
        Ok(())
    }

    /// Revoke (PENDING | VERIFIED → REVOKED). Returns the status before.
    pub(crate) fn revoke(&mut self, reason: &str) -> RegistryResult<CredentialStatus> {
        if self.revoked {
            return Err(RegistryError::AlreadyRevoked(self.id));
        }
        let version = self.next_version()?;
        let before = self.status();
        self.revoked = true;
        self.revocation_reason = Some(reason.to_string());
        self.version = version;
        Ok(before)
    }

    fn next_version(&self) -> RegistryResult<u32> {
        self.version
            .checked_add(1)
            .ok_or(RegistryError::VersionExhausted(self.id))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_credential() -> Credential {
        Credential::new_issued(
            CredentialId::FIRST,
            Principal::from_low_u64_be(0x40),
            Principal::from_low_u64_be(0x15),
            CategoryId::new(3).unwrap(),
            85,
            ContentRef::new("r1").unwrap(),
            Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        )
    }

    fn later() -> Timestamp {
        Timestamp::from_epoch_secs(1_700_000_500).unwrap()
    }

    // ── Happy path ───────────────────────────────────────────────────

    #[test]
    fn test_new_credential_is_pending_v1() {
        let c = make_credential();
        assert_eq!(c.status(), CredentialStatus::Pending);
        assert_eq!(c.version, 1);
        assert!(c.last_update_at.is_none());
    }

    #[test]
    fn test_verify_then_update_keeps_verified() {
        let mut c = make_credential();
        c.verify().unwrap();
        assert_eq!(c.status(), CredentialStatus::Verified);
        assert_eq!(c.version, 1);

        c.update(90, "correction", later()).unwrap();
        assert_eq!(c.grade, 90);
        assert_eq!(c.version, 2);
        assert_eq!(c.status(), CredentialStatus::Verified);
        assert_eq!(c.last_update_at, Some(later()));
        assert_eq!(c.update_reason.as_deref(), Some("correction"));
    }

    #[test]
    fn test_revoke_from_pending_and_verified() {
        let mut pending = make_credential();
        assert_eq!(pending.revoke("fraud").unwrap(), CredentialStatus::Pending);
        assert_eq!(pending.status(), CredentialStatus::Revoked);

        let mut verified = make_credential();
        verified.verify().unwrap();
        assert_eq!(verified.revoke("fraud").unwrap(), CredentialStatus::Verified);
        assert_eq!(verified.version, 2);
        assert_eq!(verified.revocation_reason.as_deref(), Some("fraud"));
    }

    // ── Rejections ───────────────────────────────────────────────────

    #[test]
    fn test_cannot_verify_twice() {
        let mut c = make_credential();
        c.verify().unwrap();
        assert_eq!(c.verify(), Err(RegistryError::AlreadyVerified(c.id)));
    }

    #[test]
    fn test_revoked_never_verifies_again() {
        let mut c = make_credential();
        c.revoke("fraud").unwrap();
        assert_eq!(c.verify(), Err(RegistryError::Revoked(c.id)));
        assert!(!c.verified);
        assert_eq!(c.status(), CredentialStatus::Revoked);
    }

    #[test]
    fn test_revoked_rejects_update_without_side_effects() {
        let mut c = make_credential();
        c.revoke("fraud").unwrap();
        let before = c.clone();
        assert_eq!(c.update(99, "late", later()), Err(RegistryError::Revoked(c.id)));
        assert_eq!(c, before);
    }

    #[test]
    fn test_cannot_revoke_twice() {
        let mut c = make_credential();
        c.revoke("a").unwrap();
        assert_eq!(c.revoke("b"), Err(RegistryError::AlreadyRevoked(c.id)));
        assert_eq!(c.version, 2);
        assert_eq!(c.revocation_reason.as_deref(), Some("a"));
    }

    #[test]
    fn test_version_exhaustion_rejects_without_mutation() {
        let mut c = make_credential();
        c.version = u32::MAX;
        assert_eq!(
            c.update(1, "overflow", later()),
            Err(RegistryError::VersionExhausted(c.id))
        );
        assert_eq!(c.grade, 85);
    }

    // ── Version monotonicity ─────────────────────────────────────────

    #[test]
    fn test_version_increments_once_per_mutation() {
        let mut c = make_credential();
        for expected in 2..=6u32 {
            c.update(expected as u8, "bump", later()).unwrap();
            assert_eq!(c.version, expected);
        }
        c.revoke("done").unwrap();
        assert_eq!(c.version, 7);
    }

    // ── Display / parse ──────────────────────────────────────────────

    #[test]
    fn test_status_display_and_parse() {
        for status in CredentialStatus::ALL {
            let parsed: CredentialStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("burned".parse::<CredentialStatus>().is_err());
    }

    #[test]
    fn test_credential_serialization() {
        let c = make_credential();
        let json = serde_json::to_string(&c).unwrap();
        let parsed: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
    }
}
