//! # Registry Errors
//!
//! Every rejected registry call returns a [`RegistryError`]. Errors are
//! synchronous and typed; the registry never retries. A rejected
//! single-item call leaves the credential and every index untouched.
//!
//! Variants group into four kinds, exposed through [`RegistryError::kind`]:
//!
//! | Kind | Variants |
//! |---|---|
//! | `Authorization` | `Unauthorized` |
//! | `NotFound` | `NotFound`, `CategoryNotFound` |
//! | `StateConflict` | `AlreadyVerified`, `Revoked`, `AlreadyRevoked`, `AlreadyRequested`, `NoRequest`, `AlreadyAuthorized`, `NotAuthorized`, `LastAdministrator`, `VersionExhausted`, `IdSpaceExhausted` |
//! | `Validation` | `Validation`, `NullPrincipal`, `EmptyBatch`, `LengthMismatch`, `DuplicateId`, `InvalidRange` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sbt_core::{CategoryId, CredentialId, Principal, Timestamp, ValidationError};

use crate::roles::Role;

/// The coarse class of a registry failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing role, flag, or ownership of record.
    Authorization,
    /// Unknown credential or category.
    NotFound,
    /// The entity is in a state that forbids the operation.
    StateConflict,
    /// The input itself is malformed.
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authorization => "AUTHORIZATION",
            Self::NotFound => "NOT_FOUND",
            Self::StateConflict => "STATE_CONFLICT",
            Self::Validation => "VALIDATION",
        };
        f.write_str(s)
    }
}

/// What the caller would have needed for the call to be authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    /// Membership of the given role.
    Role(Role),
    /// Issuer role together with the authorized-issuer flag.
    AuthorizedIssuer,
    /// Being the principal that issued the credential.
    IssuerOfRecord,
    /// Being the credential's current holder.
    Holder,
    /// Administrator role, or being the issuer of record.
    AdministratorOrIssuerOfRecord,
    /// Administrator role, or a burn request that is approved or past its
    /// timelock.
    BurnClearance,
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role {role}"),
            Self::AuthorizedIssuer => f.write_str("authorized issuer"),
            Self::IssuerOfRecord => f.write_str("issuer of record"),
            Self::Holder => f.write_str("current holder"),
            Self::AdministratorOrIssuerOfRecord => {
                f.write_str("administrator or issuer of record")
            }
            Self::BurnClearance => {
                f.write_str("administrator, or an approved or timelock-elapsed burn request")
            }
        }
    }
}

/// Failure of a registry operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller does not satisfy the operation's authorization rule.
    #[error("{caller} is not authorized: requires {requirement}")]
    Unauthorized {
        /// Who made the call.
        caller: Principal,
        /// What was required.
        requirement: Requirement,
    },

    /// No credential with this id exists (never issued, or burned).
    #[error("credential {0} not found")]
    NotFound(CredentialId),

    /// The category has never been named.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    /// `verify` on an already verified credential.
    #[error("credential {0} is already verified")]
    AlreadyVerified(CredentialId),

    /// The credential is revoked and the operation requires it not to be.
    #[error("credential {0} is revoked")]
    Revoked(CredentialId),

    /// `revoke` on an already revoked credential.
    #[error("credential {0} is already revoked")]
    AlreadyRevoked(CredentialId),

    /// A burn request is already live for this credential.
    #[error("burn already requested for credential {0}")]
    AlreadyRequested(CredentialId),

    /// No burn request is live for this credential.
    #[error("no burn request for credential {0}")]
    NoRequest(CredentialId),

    /// The principal already holds the authorized-issuer flag.
    #[error("{0} is already an authorized issuer")]
    AlreadyAuthorized(Principal),

    /// The principal does not hold the authorized-issuer flag.
    #[error("{0} is not an authorized issuer")]
    NotAuthorized(Principal),

    /// Revoking this administrator would leave the registry without one.
    #[error("{0} is the last administrator")]
    LastAdministrator(Principal),

    /// The credential's version counter cannot be incremented further.
    #[error("credential {0} version counter exhausted")]
    VersionExhausted(CredentialId),

    /// No further credential ids can be allocated.
    #[error("credential id space exhausted")]
    IdSpaceExhausted,

    /// An input value failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A principal argument is the null address where a real one is needed.
    #[error("principal must not be the null address")]
    NullPrincipal,

    /// A batch call was given no items.
    #[error("batch must contain at least one item")]
    EmptyBatch,

    /// Parallel batch inputs differ in length.
    #[error("batch length mismatch: {ids} ids, {values} values")]
    LengthMismatch {
        /// Number of ids supplied.
        ids: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// The same id appears twice in a batch that applies uniformly.
    #[error("credential {0} appears more than once in batch")]
    DuplicateId(CredentialId),

    /// A date range whose start is after its end.
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange {
        /// Range start.
        from: Timestamp,
        /// Range end.
        to: Timestamp,
    },
}

impl RegistryError {
    /// The coarse class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::NotFound(_) | Self::CategoryNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyVerified(_)
            | Self::Revoked(_)
            | Self::AlreadyRevoked(_)
            | Self::AlreadyRequested(_)
            | Self::NoRequest(_)
            | Self::AlreadyAuthorized(_)
            | Self::NotAuthorized(_)
            | Self::LastAdministrator(_)
            | Self::VersionExhausted(_)
            | Self::IdSpaceExhausted => ErrorKind::StateConflict,
            Self::Validation(_)
            | Self::NullPrincipal
            | Self::EmptyBatch
            | Self::LengthMismatch { .. }
            | Self::DuplicateId(_)
            | Self::InvalidRange { .. } => ErrorKind::Validation,
        }
    }

    pub(crate) fn unauthorized(caller: &Principal, requirement: Requirement) -> Self {
        Self::Unauthorized {
            caller: *caller,
            requirement,
        }
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let p = Principal::from_low_u64_be(1);
        let id = CredentialId::new(1);
        assert_eq!(
            RegistryError::unauthorized(&p, Requirement::IssuerOfRecord).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(RegistryError::NotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(RegistryError::AlreadyRequested(id).kind(), ErrorKind::StateConflict);
        assert_eq!(RegistryError::AlreadyAuthorized(p).kind(), ErrorKind::StateConflict);
        assert_eq!(
            RegistryError::from(ValidationError::InvalidCategory).kind(),
            ErrorKind::Validation
        );
        assert_eq!(RegistryError::EmptyBatch.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unauthorized_message_names_requirement() {
        let p = Principal::from_low_u64_be(2);
        let err = RegistryError::unauthorized(&p, Requirement::Role(Role::Administrator));
        let msg = err.to_string();
        assert!(msg.contains("0x0000000000000000000000000000000000000002"));
        assert!(msg.contains("ADMINISTRATOR"));
    }
}
