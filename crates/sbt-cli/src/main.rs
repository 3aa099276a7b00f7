//! # sbt CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Every handler loads the state file, runs one registry operation as the
//! `--as` principal, and writes the state back if it changed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sbt_cli::burn::{run_burn, BurnArgs};
use sbt_cli::category::{run_category, CategoryArgs};
use sbt_cli::credential::{run_credential, CredentialArgs};
use sbt_cli::init::{run_init, InitArgs};
use sbt_cli::query::{run_query, QueryArgs};
use sbt_cli::role::{run_issuer, run_role, IssuerArgs, RoleArgs};
use sbt_cli::transfer::{run_transfer, TransferArgs};
use sbt_cli::{Session, DEFAULT_STATE_PATH};
use sbt_core::Principal;

/// Soul-bound credential registry.
///
/// Issues, verifies, updates, revokes, transfers, and burns
/// non-transferable credentials held in a local state file.
#[derive(Parser, Debug)]
#[command(name = "sbt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the registry state file.
    #[arg(long, global = true, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Path to a YAML configuration file (read by `init`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Principal to run the command as.
    #[arg(long = "as", global = true)]
    caller: Option<Principal>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new registry state file.
    Init(InitArgs),

    /// Grant, revoke, and check roles.
    Role(RoleArgs),

    /// Authorize or suspend issuers.
    Issuer(IssuerArgs),

    /// Name categories and look names up.
    Category(CategoryArgs),

    /// Issue, verify, update, revoke, and show credentials.
    Credential(CredentialArgs),

    /// Transfer mode, holder consent, and holder changes.
    Transfer(TransferArgs),

    /// Burn requests, approvals, timelock, and execution.
    Burn(BurnArgs),

    /// Paginated credential queries.
    Query(QueryArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let session = Session {
        state: cli.state,
        config: cli.config,
        caller: cli.caller,
    };
    tracing::debug!(state = %session.state.display(), "sbt CLI starting");

    let result = match cli.command {
        Commands::Init(args) => run_init(&args, &session),
        Commands::Role(args) => run_role(&args, &session),
        Commands::Issuer(args) => run_issuer(&args, &session),
        Commands::Category(args) => run_category(&args, &session),
        Commands::Credential(args) => run_credential(&args, &session),
        Commands::Transfer(args) => run_transfer(&args, &session),
        Commands::Burn(args) => run_burn(&args, &session),
        Commands::Query(args) => run_query(&args, &session),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sbt_cli::burn::BurnCommand;
    use sbt_cli::credential::CredentialCommand;
    use sbt_cli::query::QueryCommand;
    use sbt_cli::transfer::{Switch, TransferCommand};

    const ADMIN: &str = "0x00000000000000000000000000000000000000ad";
    const HOLDER: &str = "0x0000000000000000000000000000000000000001";

    #[test]
    fn cli_parse_defaults() {
        let cli = Cli::try_parse_from(["sbt", "init", "--admin", ADMIN]).unwrap();
        assert_eq!(cli.state, PathBuf::from(DEFAULT_STATE_PATH));
        assert!(cli.caller.is_none());
        assert_eq!(cli.verbose, 0);
        if let Commands::Init(args) = cli.command {
            assert_eq!(args.admins.len(), 1);
            assert!(!args.force);
        } else {
            panic!("expected init");
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sbt", "credential", "show", "--id", "7", "--as", ADMIN, "--state", "x.json", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.state, PathBuf::from("x.json"));
        assert_eq!(cli.caller.unwrap().to_string(), ADMIN);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parse_credential_issue() {
        let cli = Cli::try_parse_from([
            "sbt",
            "credential",
            "issue",
            "--holder",
            HOLDER,
            "--category",
            "3",
            "--grade",
            "90",
            "--content-ref",
            "ipfs://cert",
        ])
        .unwrap();
        let Commands::Credential(args) = cli.command else {
            panic!("expected credential");
        };
        let CredentialCommand::Issue {
            category,
            grade,
            content_ref,
            ..
        } = args.command
        else {
            panic!("expected issue");
        };
        assert_eq!(category, 3);
        assert_eq!(grade, 90);
        assert_eq!(content_ref, "ipfs://cert");
    }

    #[test]
    fn cli_parse_rejects_bad_principal() {
        assert!(Cli::try_parse_from(["sbt", "role", "check", "issuer", "0x1234"]).is_err());
    }

    #[test]
    fn cli_parse_repeated_ids() {
        let cli = Cli::try_parse_from(["sbt", "burn", "approve", "--id", "1", "--id", "2"]).unwrap();
        let Commands::Burn(args) = cli.command else {
            panic!("expected burn");
        };
        let BurnCommand::Approve { ids } = args.command else {
            panic!("expected approve");
        };
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn cli_parse_transfer_mode() {
        let cli = Cli::try_parse_from(["sbt", "transfer", "mode", "on"]).unwrap();
        let Commands::Transfer(args) = cli.command else {
            panic!("expected transfer");
        };
        assert!(matches!(
            args.command,
            TransferCommand::Mode { switch: Switch::On }
        ));
    }

    #[test]
    fn cli_parse_consent_needs_mover_or_withdraw() {
        assert!(Cli::try_parse_from(["sbt", "transfer", "consent", "--id", "1"]).is_err());
        assert!(
            Cli::try_parse_from(["sbt", "transfer", "consent", "--id", "1", "--withdraw"]).is_ok()
        );
    }

    #[test]
    fn cli_parse_query_dates() {
        let cli = Cli::try_parse_from([
            "sbt",
            "query",
            "dates",
            "--from",
            "2023-11-14T00:00:00Z",
            "--to",
            "1700100000",
            "--limit",
            "10",
        ])
        .unwrap();
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.limit, 10);
        assert_eq!(args.offset, 0);
        let QueryCommand::Dates { to, .. } = args.command else {
            panic!("expected dates");
        };
        assert_eq!(to.epoch_secs(), 1_700_100_000);
    }

    #[test]
    fn cli_parse_query_status() {
        let cli = Cli::try_parse_from(["sbt", "query", "status", "verified"]).unwrap();
        assert!(matches!(cli.command, Commands::Query(_)));
        assert!(Cli::try_parse_from(["sbt", "query", "status", "burned"]).is_err());
    }
}
