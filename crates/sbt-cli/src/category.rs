//! # Category Subcommand
//!
//! - `sbt category set --id <N> --name <NAME>`: authorized issuer. Repeat
//!   `--id`/`--name` pairs to name several categories in one batch.
//! - `sbt category show [--id <N>]`: public; lists every named category
//!   when no id is given.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use sbt_core::CategoryId;

use crate::session::{rejected, Session};

/// Arguments for `sbt category`.
#[derive(Args, Debug)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub command: CategoryCommand,
}

/// Category subcommands.
#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Set or overwrite category names.
    Set {
        /// Category id (non-zero). Repeatable.
        #[arg(long = "id", required = true)]
        ids: Vec<u64>,
        /// Display name, paired with `--id` by position.
        #[arg(long = "name", required = true)]
        names: Vec<String>,
    },
    /// Show one or all category names.
    Show {
        /// Category id.
        #[arg(long)]
        id: Option<u64>,
    },
}

/// Execute `sbt category`.
pub fn run_category(args: &CategoryArgs, session: &Session) -> Result<u8> {
    match &args.command {
        CategoryCommand::Set { ids, names } => {
            if let ([id], [name]) = (ids.as_slice(), names.as_slice()) {
                session.apply(|reg, ctx| reg.set_category_name(ctx, *id, name.as_str()))?;
            } else {
                session.apply(|reg, ctx| {
                    reg.set_category_names_batch(ctx, ids.as_slice(), names.as_slice())
                })?;
            }
            let plural = if ids.len() == 1 { "category" } else { "categories" };
            println!("OK: named {} {plural}", ids.len());
            Ok(0)
        }
        CategoryCommand::Show { id: Some(raw) } => {
            let registry = session.open()?;
            let id = CategoryId::new(*raw).context("invalid category id")?;
            let name = registry.category_name(id).map_err(rejected)?;
            println!("{id}: {name}");
            Ok(0)
        }
        CategoryCommand::Show { id: None } => {
            let registry = session.open()?;
            let mut any = false;
            for (id, name) in registry.categories() {
                println!("{id}: {name}");
                any = true;
            }
            if !any {
                println!("No categories named.");
            }
            Ok(0)
        }
    }
}
