//! # Burn Subcommand
//!
//! Governed deletion. Several `--id` flags run the partial batch variant,
//! which applies what it can and lists what it skipped; the command then
//! exits 3 if anything was skipped.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use sbt_core::CredentialId;
use sbt_registry::{BatchReport, BurnEligibility, BurnRequest};

use crate::session::{print_json, rejected, Session};

/// Arguments for `sbt burn`.
#[derive(Args, Debug)]
pub struct BurnArgs {
    #[command(subcommand)]
    pub command: BurnCommand,
}

/// Burn subcommands.
#[derive(Subcommand, Debug)]
pub enum BurnCommand {
    /// Open burn requests as the issuer of record.
    Request {
        /// Credential id. Repeatable.
        #[arg(long = "id", required = true)]
        ids: Vec<CredentialId>,
        /// Reason recorded with the request.
        #[arg(long)]
        reason: String,
    },
    /// Approve outstanding requests (administrator).
    Approve {
        /// Credential id. Repeatable.
        #[arg(long = "id", required = true)]
        ids: Vec<CredentialId>,
    },
    /// Cancel outstanding requests.
    Cancel {
        /// Credential id. Repeatable.
        #[arg(long = "id", required = true)]
        ids: Vec<CredentialId>,
    },
    /// Burn credentials that governance has cleared.
    Execute {
        /// Credential id. Repeatable.
        #[arg(long = "id", required = true)]
        ids: Vec<CredentialId>,
        /// Reason recorded with the burn.
        #[arg(long)]
        reason: String,
    },
    /// Show or set the burn timelock.
    Timelock {
        /// New timelock in seconds (administrator). Omit to show.
        #[arg(long)]
        secs: Option<u64>,
    },
    /// Show the request and eligibility for one credential.
    Status {
        /// Credential id.
        #[arg(long)]
        id: CredentialId,
    },
}

#[derive(Serialize)]
struct BurnStatus<'a> {
    id: CredentialId,
    timelock_secs: u64,
    request: Option<&'a BurnRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eligibility: Option<BurnEligibility>,
}

/// Execute `sbt burn`.
pub fn run_burn(args: &BurnArgs, session: &Session) -> Result<u8> {
    match &args.command {
        BurnCommand::Request { ids, reason } => match ids.as_slice() {
            [id] => {
                session.apply(|reg, ctx| reg.request_burn(ctx, *id, reason))?;
                println!("OK: burn requested for credential {id}");
                Ok(0)
            }
            _ => {
                let report = session.apply(|reg, ctx| reg.request_burn_batch(ctx, ids, reason))?;
                Ok(print_report("requested", &report))
            }
        },
        BurnCommand::Approve { ids } => match ids.as_slice() {
            [id] => {
                session.apply(|reg, ctx| reg.approve_burn(ctx, *id))?;
                println!("OK: burn approved for credential {id}");
                Ok(0)
            }
            _ => {
                let report = session.apply(|reg, ctx| reg.approve_burn_batch(ctx, ids))?;
                Ok(print_report("approved", &report))
            }
        },
        BurnCommand::Cancel { ids } => match ids.as_slice() {
            [id] => {
                if session.apply(|reg, ctx| reg.cancel_burn(ctx, *id))? {
                    println!("OK: burn request cancelled for credential {id}");
                } else {
                    println!("OK: credential {id} had no burn request");
                }
                Ok(0)
            }
            _ => {
                let report = session.apply(|reg, ctx| reg.cancel_burn_batch(ctx, ids))?;
                Ok(print_report("cancelled", &report))
            }
        },
        BurnCommand::Execute { ids, reason } => match ids.as_slice() {
            [id] => {
                let path = session.apply(|reg, ctx| reg.burn(ctx, *id, reason))?;
                println!("OK: credential {id} burned ({path})");
                Ok(0)
            }
            _ => {
                let report = session.apply(|reg, ctx| reg.burn_batch(ctx, ids, reason))?;
                Ok(print_report("burned", &report))
            }
        },
        BurnCommand::Timelock { secs: Some(secs) } => {
            let previous = session.apply(|reg, ctx| reg.set_burn_timelock(ctx, *secs))?;
            println!("OK: burn timelock {secs}s (was {previous}s)");
            Ok(0)
        }
        BurnCommand::Timelock { secs: None } => {
            let registry = session.open()?;
            println!("{}", registry.burn_timelock_secs());
            Ok(0)
        }
        BurnCommand::Status { id } => {
            let registry = session.open()?;
            registry.read(*id).map_err(rejected)?;
            let eligibility = match session.caller {
                Some(_) => Some(
                    registry
                        .burn_eligibility(&session.context()?, *id)
                        .map_err(rejected)?,
                ),
                None => None,
            };
            print_json(&BurnStatus {
                id: *id,
                timelock_secs: registry.burn_timelock_secs(),
                request: registry.burn_request(*id),
                eligibility,
            })?;
            Ok(0)
        }
    }
}

fn print_report(verb: &str, report: &BatchReport) -> u8 {
    for id in &report.applied {
        println!("OK: credential {id} {verb}");
    }
    for item in &report.skipped {
        println!("SKIPPED: credential {} ({}: {})", item.id, item.error.kind(), item.error);
    }
    if report.is_complete() {
        0
    } else {
        3
    }
}
