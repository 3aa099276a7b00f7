//! # sbt-core — Foundational Types for the Credential Registry
//!
//! The leaf of the workspace DAG. Every other `sbt-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `Principal`, `CredentialId`,
//!    `CategoryId`, `ContentRef` are distinct types with validated
//!    constructors. A category id cannot be passed where a credential id is
//!    expected, and the reserved values (the null principal, category `0`)
//!    are rejected where they are not allowed.
//!
//! 2. **UTC-only timestamps.** `Timestamp` is seconds-precision UTC, which is
//!    the resolution the burn timelock is evaluated at.
//!
//! 3. **Time is injected.** Nothing in the registry reads the wall clock
//!    directly; it asks a [`Clock`]. Tests drive a [`ManualClock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sbt-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{CategoryId, ContentRef, CredentialId, Principal};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
