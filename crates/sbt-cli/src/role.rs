//! # Role and Issuer Subcommands
//!
//! - `sbt role grant|revoke <ROLE> <PRINCIPAL>`: administrator only.
//! - `sbt role check <ROLE> <PRINCIPAL>`: exit 0 if held, 1 if not.
//! - `sbt issuer authorize|revoke <PRINCIPAL>`: administrator only.

use anyhow::Result;
use clap::{Args, Subcommand};

use sbt_core::Principal;
use sbt_registry::Role;

use crate::session::Session;

/// Arguments for `sbt role`.
#[derive(Args, Debug)]
pub struct RoleArgs {
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands.
#[derive(Subcommand, Debug)]
pub enum RoleCommand {
    /// Grant a role (administrator, issuer, attester).
    Grant {
        /// Role name.
        role: Role,
        /// Grantee address.
        principal: Principal,
    },
    /// Revoke a role.
    Revoke {
        /// Role name.
        role: Role,
        /// Member address.
        principal: Principal,
    },
    /// Check whether a principal holds a role.
    Check {
        /// Role name.
        role: Role,
        /// Address to check.
        principal: Principal,
    },
}

/// Arguments for `sbt issuer`.
#[derive(Args, Debug)]
pub struct IssuerArgs {
    #[command(subcommand)]
    pub command: IssuerCommand,
}

/// Issuer subcommands.
#[derive(Subcommand, Debug)]
pub enum IssuerCommand {
    /// Grant the issuer role and the authorized-issuer flag.
    Authorize {
        /// Issuer address.
        principal: Principal,
    },
    /// Suspend issuance rights. The issuer role is kept.
    Revoke {
        /// Issuer address.
        principal: Principal,
    },
}

/// Execute `sbt role`.
pub fn run_role(args: &RoleArgs, session: &Session) -> Result<u8> {
    match &args.command {
        RoleCommand::Grant { role, principal } => {
            let changed = session.apply(|reg, ctx| reg.grant_role(ctx, *role, *principal))?;
            if changed {
                println!("OK: granted {role} to {principal}");
            } else {
                println!("OK: {principal} already holds {role}");
            }
            Ok(0)
        }
        RoleCommand::Revoke { role, principal } => {
            let changed = session.apply(|reg, ctx| reg.revoke_role(ctx, *role, *principal))?;
            if changed {
                println!("OK: revoked {role} from {principal}");
            } else {
                println!("OK: {principal} did not hold {role}");
            }
            Ok(0)
        }
        RoleCommand::Check { role, principal } => {
            let registry = session.open()?;
            let held = registry.has_role(*role, principal);
            let flag = registry.is_authorized_issuer(principal);
            println!("{principal} {role}: {}", if held { "yes" } else { "no" });
            if *role == Role::Issuer {
                println!("{principal} authorized issuer: {}", if flag { "yes" } else { "no" });
            }
            Ok(if held { 0 } else { 1 })
        }
    }
}

/// Execute `sbt issuer`.
pub fn run_issuer(args: &IssuerArgs, session: &Session) -> Result<u8> {
    match &args.command {
        IssuerCommand::Authorize { principal } => {
            session.apply(|reg, ctx| reg.authorize_issuer(ctx, *principal))?;
            println!("OK: {principal} is an authorized issuer");
        }
        IssuerCommand::Revoke { principal } => {
            session.apply(|reg, ctx| reg.revoke_issuer(ctx, *principal))?;
            println!("OK: suspended issuance rights for {principal}");
        }
    }
    Ok(0)
}
