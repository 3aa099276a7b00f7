//! # Session
//!
//! Global flags shared by every subcommand, and the load → apply → save
//! cycle against the state file.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use sbt_core::{Principal, SystemClock, Timestamp};
use sbt_registry::{
    AuthorizationContext, CredentialRegistry, InMemoryRoleStore, RegistryError, RegistryResult,
    RegistrySnapshot, TracingSink,
};

/// Default location of the registry state file.
pub const DEFAULT_STATE_PATH: &str = ".sbt/registry.json";

/// The registry as the CLI runs it: in-memory roles, events to the log,
/// wall-clock time.
pub type CliRegistry = CredentialRegistry<InMemoryRoleStore, TracingSink, SystemClock>;

/// Resolved global flags.
#[derive(Debug, Clone)]
pub struct Session {
    /// State file path.
    pub state: PathBuf,
    /// Configuration file, used by `init`.
    pub config: Option<PathBuf>,
    /// The principal commands run as.
    pub caller: Option<Principal>,
}

impl Session {
    /// A session on `state` with no caller.
    pub fn new(state: impl Into<PathBuf>) -> Self {
        Self {
            state: state.into(),
            config: None,
            caller: None,
        }
    }

    /// Set the calling principal.
    pub fn with_caller(mut self, caller: Principal) -> Self {
        self.caller = Some(caller);
        self
    }

    /// The caller as an authorization context.
    pub fn context(&self) -> Result<AuthorizationContext> {
        self.caller
            .map(AuthorizationContext::new)
            .context("this command needs a caller: pass --as <principal>")
    }

    /// Load the registry from the state file.
    pub fn open(&self) -> Result<CliRegistry> {
        let snapshot = RegistrySnapshot::load(&self.state).with_context(|| {
            format!(
                "failed to load registry state from {} (run `sbt init` first?)",
                self.state.display()
            )
        })?;
        CredentialRegistry::restore(snapshot, InMemoryRoleStore::new(), TracingSink, SystemClock)
            .with_context(|| format!("registry state in {} is inconsistent", self.state.display()))
    }

    /// Write the registry back to the state file.
    pub fn save(&self, registry: &CliRegistry) -> Result<()> {
        registry
            .snapshot()
            .save(&self.state)
            .with_context(|| format!("failed to save registry state to {}", self.state.display()))
    }

    /// Run one mutation as the caller and persist it if anything was
    /// committed.
    pub fn apply<T>(
        &self,
        op: impl FnOnce(&mut CliRegistry, &AuthorizationContext) -> RegistryResult<T>,
    ) -> Result<T> {
        let ctx = self.context()?;
        let mut registry = self.open()?;
        let before = registry.sequence();
        let value = op(&mut registry, &ctx).map_err(rejected)?;
        if registry.sequence() != before {
            self.save(&registry)?;
            tracing::debug!(
                events = registry.sequence() - before,
                state = %self.state.display(),
                "registry state saved"
            );
        }
        Ok(value)
    }
}

/// Convert a registry rejection into a CLI error naming its kind.
pub fn rejected(err: RegistryError) -> anyhow::Error {
    anyhow!("{} error: {err}", err.kind())
}

/// Parse a timestamp given as RFC 3339 (`Z` suffix) or epoch seconds.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    let parsed = match raw.parse::<i64>() {
        Ok(secs) => Timestamp::from_epoch_secs(secs),
        Err(_) => Timestamp::parse(raw),
    };
    parsed.map_err(|e| e.to_string())
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_both_forms() {
        assert_eq!(parse_timestamp("0").unwrap().epoch_secs(), 0);
        assert_eq!(
            parse_timestamp("2023-11-14T22:13:20Z").unwrap().epoch_secs(),
            1_700_000_000
        );
        assert!(parse_timestamp("2023-11-14T22:13:20+01:00").is_err());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn context_requires_caller() {
        let session = Session::new("unused.json");
        assert!(session.context().is_err());
        let session = session.with_caller(Principal::from_low_u64_be(1));
        assert_eq!(
            *session.context().unwrap().caller(),
            Principal::from_low_u64_be(1)
        );
    }

    #[test]
    fn open_missing_state_suggests_init() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(dir.path().join("absent.json"));
        let err = session.open().unwrap_err();
        assert!(format!("{err:#}").contains("sbt init"));
    }
}
