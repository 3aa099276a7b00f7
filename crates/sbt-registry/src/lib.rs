//! # sbt-registry — Soulbound Credential Registry
//!
//! Manages the lifecycle of non-transferable credentials, each owned by one
//! holder and issued by an authorized issuer.
//!
//! ## Components
//!
//! | Module | Concern |
//! |---|---|
//! | [`roles`] | Role memberships, the authorized-issuer flag, caller context |
//! | [`credential`] | Record layout and the PENDING → VERIFIED → REVOKED machine |
//! | [`store`] | Canonical record table, id allocation, category names |
//! | [`index`] | Status / holder / issuer / category indices and the date scan |
//! | [`transfer`] | Global switch and single-use consent gating ownership moves |
//! | [`burn`] | Timelock / approval governance over irreversible deletion |
//! | [`batch`] | Bulk verify, burn, and category-name operations |
//! | [`events`] | Committed events and the sink seam |
//! | [`config`] | YAML + environment configuration |
//! | [`snapshot`] | Whole-state persistence and restore |
//! | [`registry`] | The [`CredentialRegistry`] façade tying it together |
//!
//! ## Example
//!
//! ```
//! use sbt_core::{ManualClock, Principal};
//! use sbt_registry::{
//!     AuthorizationContext, CredentialRegistry, CredentialStatus, InMemoryRoleStore,
//!     MemorySink, RegistryConfig,
//! };
//!
//! let admin = Principal::from_low_u64_be(0xad);
//! let issuer = Principal::from_low_u64_be(0x15);
//! let holder = Principal::from_low_u64_be(0x40);
//! let config = RegistryConfig { administrators: vec![admin], ..Default::default() };
//!
//! let mut registry = CredentialRegistry::new(
//!     &config,
//!     InMemoryRoleStore::new(),
//!     MemorySink::new(),
//!     ManualClock::at_epoch(1_700_000_000),
//! )?;
//! registry.authorize_issuer(&AuthorizationContext::new(admin), issuer)?;
//!
//! let as_issuer = AuthorizationContext::new(issuer);
//! let id = registry.issue(&as_issuer, holder, 3, 85, "ipfs://r1")?;
//! registry.verify(&as_issuer, id)?;
//! assert_eq!(registry.read(id)?.status(), CredentialStatus::Verified);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod burn;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod index;
pub mod registry;
pub mod roles;
pub mod snapshot;
pub mod store;
pub mod transfer;

pub use batch::{BatchReport, SkippedItem};
pub use burn::{BurnEligibility, BurnPath, BurnRequest, DEFAULT_BURN_TIMELOCK_SECS};
pub use config::{ConfigError, RegistryConfig};
pub use credential::{Credential, CredentialStatus};
pub use error::{ErrorKind, RegistryError, RegistryResult, Requirement};
pub use events::{EventEnvelope, EventSink, MemorySink, RegistryEvent, TracingSink};
pub use index::{DateRange, Page};
pub use registry::CredentialRegistry;
pub use roles::{AuthorizationContext, InMemoryRoleStore, Role, RoleStore};
pub use snapshot::{RegistrySnapshot, SnapshotError};
pub use transfer::{DenialReason, TransferOutcome};
