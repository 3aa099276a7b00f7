//! # Query Subcommand
//!
//! Paginated public reads. Every subcommand prints one [`Page`] as JSON.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use sbt_core::{CategoryId, Principal, Timestamp};
use sbt_registry::{CredentialStatus, Page};

use crate::session::{parse_timestamp, print_json, rejected, Session};

/// Arguments for `sbt query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub command: QueryCommand,

    /// Entries to skip.
    #[arg(long, global = true, default_value_t = 0)]
    pub offset: usize,

    /// Maximum entries to return.
    #[arg(long, global = true, default_value_t = 50)]
    pub limit: usize,
}

/// Query subcommands.
#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Credentials in a status (pending, verified, revoked).
    Status { status: CredentialStatus },
    /// Credentials held by a principal.
    Holder { principal: Principal },
    /// Credentials issued by a principal.
    Issuer { principal: Principal },
    /// Credentials in a category.
    Category { id: u64 },
    /// Credentials issued within an inclusive time range.
    Dates {
        /// Range start, RFC 3339 or epoch seconds.
        #[arg(long, value_parser = parse_timestamp)]
        from: Timestamp,
        /// Range end, RFC 3339 or epoch seconds.
        #[arg(long, value_parser = parse_timestamp)]
        to: Timestamp,
    },
}

/// Execute `sbt query`.
pub fn run_query(args: &QueryArgs, session: &Session) -> Result<u8> {
    let registry = session.open()?;
    let (offset, limit) = (args.offset, args.limit);
    let page: Page = match &args.command {
        QueryCommand::Status { status } => registry.page_by_status(*status, offset, limit),
        QueryCommand::Holder { principal } => registry.page_by_holder(principal, offset, limit),
        QueryCommand::Issuer { principal } => registry.page_by_issuer(principal, offset, limit),
        QueryCommand::Category { id } => {
            let category = CategoryId::new(*id).context("invalid category id")?;
            registry.page_by_category(category, offset, limit)
        }
        QueryCommand::Dates { from, to } => registry
            .page_issued_between(*from, *to, offset, limit)
            .map_err(rejected)?,
    };
    print_json(&page)?;
    Ok(0)
}
