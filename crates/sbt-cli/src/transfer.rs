//! # Transfer Subcommand
//!
//! - `sbt transfer mode on|off`: administrator.
//! - `sbt transfer consent --id <ID> --mover <P>`: current holder;
//!   `--withdraw` clears the consent instead.
//! - `sbt transfer move --id <ID> --to <P>`: exit 0 if applied, 2 if the
//!   gate denied it.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use sbt_core::{CredentialId, Principal};
use sbt_registry::TransferOutcome;

use crate::session::Session;

/// Arguments for `sbt transfer`.
#[derive(Args, Debug)]
pub struct TransferArgs {
    #[command(subcommand)]
    pub command: TransferCommand,
}

/// Transfer mode switch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    /// Transfers may be applied.
    On,
    /// Transfers are always denied.
    Off,
}

/// Transfer subcommands.
#[derive(Subcommand, Debug)]
pub enum TransferCommand {
    /// Set the global transfer switch.
    Mode {
        /// New value.
        #[arg(value_enum)]
        switch: Switch,
    },
    /// Grant or withdraw single-use transfer consent as the holder.
    Consent {
        /// Credential id.
        #[arg(long)]
        id: CredentialId,
        /// Principal allowed to move the credential.
        #[arg(long, required_unless_present = "withdraw")]
        mover: Option<Principal>,
        /// Withdraw the outstanding consent.
        #[arg(long, conflicts_with = "mover")]
        withdraw: bool,
    },
    /// Move a credential to a new holder.
    Move {
        /// Credential id.
        #[arg(long)]
        id: CredentialId,
        /// New holder address.
        #[arg(long)]
        to: Principal,
    },
}

/// Execute `sbt transfer`.
pub fn run_transfer(args: &TransferArgs, session: &Session) -> Result<u8> {
    match &args.command {
        TransferCommand::Mode { switch } => {
            let enabled = *switch == Switch::On;
            session.apply(|reg, ctx| reg.set_transfer_mode(ctx, enabled))?;
            println!("OK: transfer mode {}", if enabled { "enabled" } else { "disabled" });
            Ok(0)
        }
        TransferCommand::Consent {
            id,
            mover: Some(mover),
            withdraw: false,
        } => {
            session.apply(|reg, ctx| reg.grant_transfer_consent(ctx, *id, *mover))?;
            println!("OK: consented to {mover} moving credential {id}");
            Ok(0)
        }
        TransferCommand::Consent { id, .. } => {
            let withdrawn = session.apply(|reg, ctx| reg.revoke_transfer_consent(ctx, *id))?;
            if withdrawn {
                println!("OK: withdrew transfer consent for credential {id}");
            } else {
                println!("OK: credential {id} had no transfer consent");
            }
            Ok(0)
        }
        TransferCommand::Move { id, to } => {
            match session.apply(|reg, ctx| reg.transfer(ctx, *id, *to))? {
                TransferOutcome::Applied { id, from, to } => {
                    println!("OK: credential {id} moved from {from} to {to}");
                    Ok(0)
                }
                TransferOutcome::Denied { reason } => {
                    println!("DENIED: {reason}");
                    Ok(2)
                }
            }
        }
    }
}
