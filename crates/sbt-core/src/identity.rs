//! # Identity Newtypes
//!
//! Domain-primitive newtypes for every identifier the registry handles.
//! Each is a distinct type: a [`CategoryId`] cannot stand in for a
//! [`CredentialId`], and a raw `u64` cannot stand in for either.
//!
//! ## Validation
//!
//! - [`Principal`] parses a 20-byte ledger address (`0x` + 40 hex digits).
//!   The all-zero address is representable, since the ledger uses it as
//!   "nobody", but it is never accepted as a holder.
//! - [`CategoryId`] rejects `0`, which is reserved.
//! - [`ContentRef`] rejects the empty string.
//! - [`CredentialId`] is allocated by the registry and always valid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implement `Deserialize` for newtypes with a validating `FromStr`/`new`,
/// so that invalid values are rejected at deserialization time rather than
/// silently accepted from a snapshot or config file.
macro_rules! impl_validating_deserialize {
    ($ty:ident, $raw:ty, $ctor:path) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <$raw>::deserialize(deserializer)?;
                $ctor(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

const ADDRESS_LEN: usize = 20;

/// A ledger account address: the identity of a holder, issuer, or operator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal([u8; ADDRESS_LEN]);

impl Principal {
    /// Address width in bytes.
    pub const LEN: usize = ADDRESS_LEN;

    /// The null principal (all-zero address).
    pub const NULL: Principal = Principal([0u8; Principal::LEN]);

    /// Build a principal from raw address bytes.
    pub const fn from_bytes(bytes: [u8; Principal::LEN]) -> Self {
        Self(bytes)
    }

    /// Build a principal whose low 8 bytes hold `n` big-endian.
    ///
    /// Handy for fixtures and local tooling where addresses are just labels.
    pub fn from_low_u64_be(n: u64) -> Self {
        let mut bytes = [0u8; Principal::LEN];
        bytes[Principal::LEN - 8..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != Principal::LEN * 2 {
            return Err(ValidationError::MalformedPrincipal {
                input: s.to_string(),
                reason: format!(
                    "expected {} hex digits, got {}",
                    Principal::LEN * 2,
                    digits.len()
                ),
            });
        }
        let mut bytes = [0u8; Principal::LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| {
            ValidationError::MalformedPrincipal {
                input: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self(bytes))
    }

    /// Whether this is the null principal.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; Principal::LEN]
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; Principal::LEN] {
        &self.0
    }

    fn parse_owned(s: String) -> Result<Self, ValidationError> {
        Self::parse(&s)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({self})")
    }
}

impl FromStr for Principal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Principal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl_validating_deserialize!(Principal, String, Principal::parse_owned);

// ---------------------------------------------------------------------------
// CredentialId
// ---------------------------------------------------------------------------

/// Sequential credential identifier, allocated from 1 by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(u64);

impl CredentialId {
    /// The first identifier the registry hands out.
    pub const FIRST: CredentialId = CredentialId(1);

    /// Wrap a raw identifier, e.g. one supplied by a caller for lookup.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The identifier after this one, or `None` on counter exhaustion.
    pub fn checked_next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CredentialId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for CredentialId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

// ---------------------------------------------------------------------------
// CategoryId
// ---------------------------------------------------------------------------

/// Credential category identifier. `0` is reserved and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryId(u64);

impl CategoryId {
    /// Validate and wrap a raw category id.
    pub fn new(raw: u64) -> Result<Self, ValidationError> {
        if raw == 0 {
            return Err(ValidationError::InvalidCategory);
        }
        Ok(Self(raw))
    }

    /// The raw numeric value.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl_validating_deserialize!(CategoryId, u64, CategoryId::new);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for CategoryId {
    type Error = ValidationError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

// ---------------------------------------------------------------------------
// ContentRef
// ---------------------------------------------------------------------------

/// Opaque pointer to the credential's off-registry content (e.g. a CID).
///
/// The registry never resolves it; it only guarantees it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    /// Validate and wrap a content pointer.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(Self(raw))
    }

    /// Borrow the pointer text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn new_owned(raw: String) -> Result<Self, ValidationError> {
        Self::new(raw)
    }
}

impl_validating_deserialize!(ContentRef, String, ContentRef::new_owned);

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Principal ────────────────────────────────────────────────────

    #[test]
    fn test_principal_parse_with_and_without_prefix() {
        let a = Principal::parse("0x00000000000000000000000000000000000000ff").unwrap();
        let b = Principal::parse("00000000000000000000000000000000000000FF").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Principal::from_low_u64_be(255));
    }

    #[test]
    fn test_principal_display_is_lowercase_prefixed() {
        let p = Principal::from_low_u64_be(0xabcd);
        assert_eq!(p.to_string(), "0x000000000000000000000000000000000000abcd");
    }

    #[test]
    fn test_principal_rejects_wrong_length() {
        let err = Principal::parse("0x1234").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPrincipal { .. }));
    }

    #[test]
    fn test_principal_rejects_non_hex() {
        let err = Principal::parse("0xzz00000000000000000000000000000000000000").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPrincipal { .. }));
    }

    #[test]
    fn test_null_principal() {
        assert!(Principal::NULL.is_null());
        assert!(Principal::from_low_u64_be(0).is_null());
        assert!(!Principal::from_low_u64_be(1).is_null());
    }

    #[test]
    fn test_principal_serde_as_string() {
        let p = Principal::from_low_u64_be(7);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"0x0000000000000000000000000000000000000007\"");
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_principal_deserialize_rejects_garbage() {
        let result: Result<Principal, _> = serde_json::from_str("\"not-an-address\"");
        assert!(result.is_err());
    }

    // ── CredentialId ─────────────────────────────────────────────────

    #[test]
    fn test_credential_id_sequence() {
        let first = CredentialId::FIRST;
        assert_eq!(first.get(), 1);
        assert_eq!(first.checked_next(), Some(CredentialId::new(2)));
        assert_eq!(CredentialId::new(u64::MAX).checked_next(), None);
    }

    // ── CategoryId ───────────────────────────────────────────────────

    #[test]
    fn test_category_zero_is_rejected() {
        assert_eq!(CategoryId::new(0), Err(ValidationError::InvalidCategory));
        assert_eq!(CategoryId::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_category_deserialize_rejects_zero() {
        let result: Result<CategoryId, _> = serde_json::from_str("0");
        assert!(result.is_err());
        let ok: CategoryId = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
    }

    // ── ContentRef ───────────────────────────────────────────────────

    #[test]
    fn test_content_ref_rejects_empty() {
        assert_eq!(ContentRef::new(""), Err(ValidationError::EmptyContent));
        assert_eq!(ContentRef::new("ipfs://bafy").unwrap().as_str(), "ipfs://bafy");
    }
}
