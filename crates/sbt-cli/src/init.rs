//! # Init Subcommand
//!
//! Creates a fresh state file. Configuration comes from `--config` (YAML),
//! then `SBT_*` environment overrides, then `--admin` flags, which are
//! added to any configured administrators.

use anyhow::{bail, Context, Result};
use clap::Args;

use sbt_core::{Principal, SystemClock};
use sbt_registry::{CredentialRegistry, InMemoryRoleStore, RegistryConfig, TracingSink};

use crate::session::Session;

/// Arguments for `sbt init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Seed administrator. Repeatable.
    #[arg(long = "admin")]
    pub admins: Vec<Principal>,

    /// Initial burn timelock in seconds, overriding configuration.
    #[arg(long)]
    pub timelock_secs: Option<u64>,

    /// Overwrite an existing state file.
    #[arg(long)]
    pub force: bool,
}

/// Execute `sbt init`.
pub fn run_init(args: &InitArgs, session: &Session) -> Result<u8> {
    if session.state.exists() && !args.force {
        bail!(
            "state file already exists: {} (pass --force to overwrite)",
            session.state.display()
        );
    }

    let mut config = match &session.config {
        Some(path) => RegistryConfig::from_yaml_str(
            &std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
        )?,
        None => RegistryConfig::default(),
    };
    config.apply_env_overrides()?;
    for admin in &args.admins {
        if !config.administrators.contains(admin) {
            config.administrators.push(*admin);
        }
    }
    if let Some(secs) = args.timelock_secs {
        config.burn_timelock_secs = secs;
    }

    let registry =
        CredentialRegistry::new(&config, InMemoryRoleStore::new(), TracingSink, SystemClock)?;
    session.save(&registry)?;

    tracing::info!(
        state = %session.state.display(),
        administrators = config.administrators.len(),
        timelock_secs = config.burn_timelock_secs,
        "registry initialized"
    );
    println!(
        "OK: initialized registry at {} ({} administrator(s), burn timelock {}s)",
        session.state.display(),
        config.administrators.len(),
        config.burn_timelock_secs
    );
    Ok(0)
}
