//! # Transfer Gate
//!
//! Credentials are soulbound: ownership never moves by default. The gate
//! opens a single narrow path, and only when all three conditions hold:
//!
//! 1. the global transfer mode is enabled (administrator switch);
//! 2. the current holder has granted single-use consent to the mover;
//! 3. the mover is the credential's issuer of record.
//!
//! An arbitrary third party is refused even with consent. A refused move
//! is reported as [`TransferOutcome::Denied`] with the first unmet
//! condition, never as a silent no-op.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sbt_core::{CredentialId, Principal};

use crate::credential::Credential;

/// Why a transfer was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    /// The global transfer switch is off.
    TransferModeDisabled,
    /// The holder has not consented to any mover.
    NoConsent,
    /// The holder consented to someone else.
    ConsentMismatch {
        /// Who the consent names.
        granted_to: Principal,
    },
    /// The mover did not issue this credential.
    NotIssuerOfRecord,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransferModeDisabled => f.write_str("transfer mode is disabled"),
            Self::NoConsent => f.write_str("holder has not granted transfer consent"),
            Self::ConsentMismatch { granted_to } => {
                write!(f, "holder consented to {granted_to}, not the caller")
            }
            Self::NotIssuerOfRecord => f.write_str("mover is not the issuer of record"),
        }
    }
}

/// Result of a guarded ownership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Ownership moved.
    Applied {
        /// Credential id.
        id: CredentialId,
        /// Previous holder.
        from: Principal,
        /// New holder.
        to: Principal,
    },
    /// Nothing changed.
    Denied {
        /// The first unmet condition.
        reason: DenialReason,
    },
}

impl TransferOutcome {
    /// Whether ownership moved.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Transfer switch and outstanding single-use consents.
#[derive(Debug, Clone, Default)]
pub struct TransferGate {
    enabled: bool,
    consents: BTreeMap<CredentialId, Principal>,
}

impl TransferGate {
    /// A gate with the given mode and no consents.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            consents: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(enabled: bool, consents: BTreeMap<CredentialId, Principal>) -> Self {
        Self { enabled, consents }
    }

    /// Whether transfer mode is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The principal currently holding consent for `id`.
    pub fn consent(&self, id: CredentialId) -> Option<&Principal> {
        self.consents.get(&id)
    }

    /// All outstanding consents in id order.
    pub fn consents(&self) -> impl Iterator<Item = (CredentialId, &Principal)> {
        self.consents.iter().map(|(id, p)| (*id, p))
    }

    /// Record consent, replacing any previous one.
    pub(crate) fn grant(&mut self, id: CredentialId, mover: Principal) {
        self.consents.insert(id, mover);
    }

    /// Drop consent; returns whether one existed.
    pub(crate) fn withdraw(&mut self, id: CredentialId) -> bool {
        self.consents.remove(&id).is_some()
    }

    /// Check the three conditions for `mover` moving `credential`.
    pub fn evaluate(&self, credential: &Credential, mover: &Principal) -> Result<(), DenialReason> {
        if !self.enabled {
            return Err(DenialReason::TransferModeDisabled);
        }
        match self.consents.get(&credential.id) {
            None => return Err(DenialReason::NoConsent),
            Some(granted_to) if granted_to != mover => {
                return Err(DenialReason::ConsentMismatch {
                    granted_to: *granted_to,
                })
            }
            Some(_) => {}
        }
        if !credential.is_issued_by(mover) {
            return Err(DenialReason::NotIssuerOfRecord);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbt_core::{CategoryId, ContentRef, Timestamp};

    fn holder() -> Principal {
        Principal::from_low_u64_be(0x40)
    }

    fn issuer() -> Principal {
        Principal::from_low_u64_be(0x15)
    }

    fn stranger() -> Principal {
        Principal::from_low_u64_be(0x99)
    }

    fn credential() -> Credential {
        Credential::new_issued(
            CredentialId::new(1),
            holder(),
            issuer(),
            CategoryId::new(1).unwrap(),
            70,
            ContentRef::new("r").unwrap(),
            Timestamp::from_epoch_secs(0).unwrap(),
        )
    }

    #[test]
    fn test_default_gate_is_closed() {
        let gate = TransferGate::default();
        assert!(!gate.is_enabled());
        assert_eq!(
            gate.evaluate(&credential(), &issuer()),
            Err(DenialReason::TransferModeDisabled)
        );
    }

    #[test]
    fn test_enabled_without_consent_is_denied() {
        let gate = TransferGate::new(true);
        assert_eq!(
            gate.evaluate(&credential(), &issuer()),
            Err(DenialReason::NoConsent)
        );
    }

    #[test]
    fn test_consent_to_a_different_mover_is_denied() {
        let mut gate = TransferGate::new(true);
        gate.grant(CredentialId::new(1), stranger());
        assert_eq!(
            gate.evaluate(&credential(), &issuer()),
            Err(DenialReason::ConsentMismatch {
                granted_to: stranger()
            })
        );
    }

    #[test]
    fn test_third_party_with_consent_is_denied() {
        let mut gate = TransferGate::new(true);
        gate.grant(CredentialId::new(1), stranger());
        assert_eq!(
            gate.evaluate(&credential(), &stranger()),
            Err(DenialReason::NotIssuerOfRecord)
        );
    }

    #[test]
    fn test_all_conditions_met() {
        let mut gate = TransferGate::new(true);
        gate.grant(CredentialId::new(1), issuer());
        assert_eq!(gate.evaluate(&credential(), &issuer()), Ok(()));
    }

    #[test]
    fn test_consent_withdraw() {
        let mut gate = TransferGate::new(true);
        gate.grant(CredentialId::new(1), issuer());
        assert!(gate.withdraw(CredentialId::new(1)));
        assert!(!gate.withdraw(CredentialId::new(1)));
        assert!(gate.consent(CredentialId::new(1)).is_none());
    }

    #[test]
    fn test_denial_reason_messages() {
        assert_eq!(
            DenialReason::TransferModeDisabled.to_string(),
            "transfer mode is disabled"
        );
        assert!(DenialReason::ConsentMismatch {
            granted_to: stranger()
        }
        .to_string()
        .contains("0x0000000000000000000000000000000000000099"));
    }
}
