//! # Credential Subcommand
//!
//! Lifecycle operations on individual credentials.
//!
//! - `issue`: authorized issuer; prints the new id.
//! - `verify`: issuer role; several `--id` flags verify as one
//!   all-or-nothing batch.
//! - `update` / `revoke`: issuer role; print the new version.
//! - `show`: public; prints the record as JSON.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use sbt_core::{CredentialId, Principal};
use sbt_registry::{Credential, CredentialStatus};

use crate::session::{print_json, rejected, Session};

/// Arguments for `sbt credential`.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    #[command(subcommand)]
    pub command: CredentialCommand,
}

/// Credential subcommands.
#[derive(Subcommand, Debug)]
pub enum CredentialCommand {
    /// Issue a new credential (PENDING).
    Issue {
        /// Holder address.
        #[arg(long)]
        holder: Principal,
        /// Category id (non-zero).
        #[arg(long)]
        category: u64,
        /// Grade or score.
        #[arg(long)]
        grade: u8,
        /// Off-registry content pointer.
        #[arg(long)]
        content_ref: String,
    },
    /// Verify credentials (PENDING → VERIFIED).
    Verify {
        /// Credential id. Repeatable.
        #[arg(long = "id", required = true)]
        ids: Vec<CredentialId>,
    },
    /// Replace a credential's grade.
    Update {
        /// Credential id.
        #[arg(long)]
        id: CredentialId,
        /// New grade.
        #[arg(long)]
        grade: u8,
        /// Reason for the change.
        #[arg(long)]
        reason: String,
    },
    /// Revoke a credential (→ REVOKED).
    Revoke {
        /// Credential id.
        #[arg(long)]
        id: CredentialId,
        /// Reason for revocation.
        #[arg(long)]
        reason: String,
    },
    /// Show a credential.
    Show {
        /// Credential id.
        #[arg(long)]
        id: CredentialId,
    },
}

#[derive(Serialize)]
struct CredentialView<'a> {
    status: CredentialStatus,
    #[serde(flatten)]
    credential: &'a Credential,
}

/// Execute `sbt credential`.
pub fn run_credential(args: &CredentialArgs, session: &Session) -> Result<u8> {
    match &args.command {
        CredentialCommand::Issue {
            holder,
            category,
            grade,
            content_ref,
        } => {
            let id = session.apply(|reg, ctx| {
                reg.issue(ctx, *holder, *category, *grade, content_ref.as_str())
            })?;
            println!("OK: issued credential {id} to {holder}");
        }
        CredentialCommand::Verify { ids } => {
            if let [id] = ids.as_slice() {
                session.apply(|reg, ctx| reg.verify(ctx, *id))?;
            } else {
                session.apply(|reg, ctx| reg.verify_batch(ctx, ids))?;
            }
            for id in ids {
                println!("OK: credential {id} VERIFIED");
            }
        }
        CredentialCommand::Update { id, grade, reason } => {
            let version = session.apply(|reg, ctx| reg.update(ctx, *id, *grade, reason))?;
            println!("OK: credential {id} grade {grade}, version {version}");
        }
        CredentialCommand::Revoke { id, reason } => {
            let version = session.apply(|reg, ctx| reg.revoke(ctx, *id, reason))?;
            println!("OK: credential {id} REVOKED, version {version}");
        }
        CredentialCommand::Show { id } => {
            let registry = session.open()?;
            let credential = registry.read(*id).map_err(rejected)?;
            print_json(&CredentialView {
                status: credential.status(),
                credential,
            })?;
        }
    }
    Ok(0)
}
