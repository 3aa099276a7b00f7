//! # sbt-cli — Operator CLI for the Credential Registry
//!
//! Drives a [`sbt_registry::CredentialRegistry`] persisted as a JSON
//! snapshot file. Each invocation loads the snapshot, applies one
//! operation as the `--as` principal, and writes the snapshot back only if
//! the operation committed something.
//!
//! ## Subcommands
//!
//! - `sbt init` — Create a new state file from configuration.
//! - `sbt role` — Grant, revoke, and check role memberships.
//! - `sbt issuer` — Authorize or suspend issuers.
//! - `sbt category` — Name and look up categories.
//! - `sbt credential` — Issue, verify, update, revoke, show.
//! - `sbt transfer` — Transfer mode, holder consent, guarded moves.
//! - `sbt burn` — Request, approve, cancel, execute, timelock, status.
//! - `sbt query` — Paged index queries.
//!
//! ```bash
//! sbt init --admin 0x00000000000000000000000000000000000000ad
//! sbt --as 0x…ad issuer authorize 0x…15
//! sbt --as 0x…15 credential issue --holder 0x…40 --category 3 --grade 85 --content-ref r1
//! sbt query holder 0x…40 --limit 20
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; registry semantics live in `sbt-registry`.
//! - Handlers return a process exit code; errors are logged by `main`.

pub mod burn;
pub mod category;
pub mod credential;
pub mod init;
pub mod query;
pub mod role;
pub mod session;
pub mod transfer;

pub use session::{CliRegistry, Session, DEFAULT_STATE_PATH};
