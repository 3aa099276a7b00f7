//! End-to-end handler flows against a temporary state file.

use sbt_cli::burn::{run_burn, BurnArgs, BurnCommand};
use sbt_cli::category::{run_category, CategoryArgs, CategoryCommand};
use sbt_cli::credential::{run_credential, CredentialArgs, CredentialCommand};
use sbt_cli::init::{run_init, InitArgs};
use sbt_cli::query::{run_query, QueryArgs, QueryCommand};
use sbt_cli::role::{run_issuer, run_role, IssuerArgs, IssuerCommand, RoleArgs, RoleCommand};
use sbt_cli::transfer::{run_transfer, Switch, TransferArgs, TransferCommand};
use sbt_cli::Session;
use sbt_core::{CategoryId, CredentialId, Principal};
use sbt_registry::{CredentialStatus, Role};

fn admin() -> Principal {
    Principal::from_low_u64_be(0xad)
}

fn issuer() -> Principal {
    Principal::from_low_u64_be(0x15)
}

fn holder() -> Principal {
    Principal::from_low_u64_be(0x01)
}

fn id(n: u64) -> CredentialId {
    CredentialId::new(n)
}

fn fresh(dir: &tempfile::TempDir) -> Session {
    let session = Session::new(dir.path().join("registry.json"));
    run_init(
        &InitArgs {
            admins: vec![admin()],
            timelock_secs: None,
            force: false,
        },
        &session,
    )
    .expect("init");
    session
}

fn authorize(session: &Session, who: Principal) {
    let as_admin = session.clone().with_caller(admin());
    run_issuer(
        &IssuerArgs {
            command: IssuerCommand::Authorize { principal: who },
        },
        &as_admin,
    )
    .expect("authorize issuer");
}

fn issue(session: &Session, category: u64) {
    let as_issuer = session.clone().with_caller(issuer());
    run_credential(
        &CredentialArgs {
            command: CredentialCommand::Issue {
                holder: holder(),
                category,
                grade: 80,
                content_ref: "ipfs://cert".to_string(),
            },
        },
        &as_issuer,
    )
    .expect("issue");
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn issue_verify_update_revoke_persists_between_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    authorize(&session, issuer());
    issue(&session, 1);

    let as_issuer = session.clone().with_caller(issuer());
    let run = |command| run_credential(&CredentialArgs { command }, &as_issuer);
    assert_eq!(run(CredentialCommand::Verify { ids: vec![id(1)] }).expect("verify"), 0);
    assert_eq!(
        run(CredentialCommand::Update {
            id: id(1),
            grade: 95,
            reason: "regrade".to_string(),
        })
        .expect("update"),
        0
    );

    let registry = session.open().expect("open");
    let credential = registry.read(id(1)).expect("read");
    assert_eq!(credential.status(), CredentialStatus::Verified);
    assert_eq!(credential.grade, 95);
    assert_eq!(credential.version, 2);

    run(CredentialCommand::Revoke {
        id: id(1),
        reason: "fraud".to_string(),
    })
    .expect("revoke");
    let registry = session.open().expect("open");
    assert_eq!(registry.read(id(1)).expect("read").status(), CredentialStatus::Revoked);
}

#[test]
fn mutation_without_caller_fails_and_leaves_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    let before = std::fs::read_to_string(&session.state).expect("read state");

    let result = run_issuer(
        &IssuerArgs {
            command: IssuerCommand::Authorize { principal: issuer() },
        },
        &session,
    );
    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&session.state).expect("read state"), before);
}

#[test]
fn rejected_mutation_does_not_touch_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    let before = std::fs::read_to_string(&session.state).expect("read state");

    // Holder has no issuer rights.
    let as_holder = session.clone().with_caller(holder());
    let err = run_credential(
        &CredentialArgs {
            command: CredentialCommand::Issue {
                holder: holder(),
                category: 1,
                grade: 1,
                content_ref: "x".to_string(),
            },
        },
        &as_holder,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("AUTHORIZATION"));
    assert_eq!(std::fs::read_to_string(&session.state).expect("read state"), before);
}

// =========================================================================
// Roles and categories
// =========================================================================

#[test]
fn role_grant_and_check_exit_codes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    let as_admin = session.clone().with_caller(admin());

    let check = RoleArgs {
        command: RoleCommand::Check {
            role: Role::Attester,
            principal: holder(),
        },
    };
    assert_eq!(run_role(&check, &session).expect("check"), 1);

    let grant = RoleArgs {
        command: RoleCommand::Grant {
            role: Role::Attester,
            principal: holder(),
        },
    };
    assert_eq!(run_role(&grant, &as_admin).expect("grant"), 0);
    assert_eq!(run_role(&check, &session).expect("check"), 0);

    // Granting again is a no-op and still succeeds.
    assert_eq!(run_role(&grant, &as_admin).expect("grant again"), 0);
}

#[test]
fn category_set_single_and_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    authorize(&session, issuer());
    let as_issuer = session.clone().with_caller(issuer());

    run_category(
        &CategoryArgs {
            command: CategoryCommand::Set {
                ids: vec![1],
                names: vec!["Mathematics".to_string()],
            },
        },
        &as_issuer,
    )
    .expect("set one");
    run_category(
        &CategoryArgs {
            command: CategoryCommand::Set {
                ids: vec![2, 3],
                names: vec!["Physics".to_string(), "Chemistry".to_string()],
            },
        },
        &as_issuer,
    )
    .expect("set batch");

    let mismatched = run_category(
        &CategoryArgs {
            command: CategoryCommand::Set {
                ids: vec![4, 5],
                names: vec!["Biology".to_string()],
            },
        },
        &as_issuer,
    );
    assert!(mismatched.is_err());

    let registry = session.open().expect("open");
    let cat = |n| CategoryId::new(n).expect("category id");
    assert_eq!(registry.category_name(cat(1)).expect("name"), "Mathematics");
    assert_eq!(registry.category_name(cat(3)).expect("name"), "Chemistry");
    assert!(registry.category_name(cat(4)).is_err());
}

// =========================================================================
// Transfer
// =========================================================================

#[test]
fn transfer_denied_then_applied_with_consent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    authorize(&session, issuer());
    issue(&session, 1);
    let as_admin = session.clone().with_caller(admin());
    let as_holder = session.clone().with_caller(holder());
    let as_issuer = session.clone().with_caller(issuer());
    let target = Principal::from_low_u64_be(0x02);
    let mv = TransferArgs {
        command: TransferCommand::Move {
            id: id(1),
            to: target,
        },
    };

    // Mode off.
    assert_eq!(run_transfer(&mv, &as_issuer).expect("move"), 2);

    run_transfer(
        &TransferArgs {
            command: TransferCommand::Mode { switch: Switch::On },
        },
        &as_admin,
    )
    .expect("mode on");
    // No consent.
    assert_eq!(run_transfer(&mv, &as_issuer).expect("move"), 2);

    run_transfer(
        &TransferArgs {
            command: TransferCommand::Consent {
                id: id(1),
                mover: Some(issuer()),
                withdraw: false,
            },
        },
        &as_holder,
    )
    .expect("consent");
    assert_eq!(run_transfer(&mv, &as_issuer).expect("move"), 0);

    let registry = session.open().expect("open");
    assert_eq!(registry.read(id(1)).expect("read").holder, target);
    assert!(registry.transfer_consent(id(1)).is_none());
}

// =========================================================================
// Burn
// =========================================================================

#[test]
fn burn_request_approve_execute() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    authorize(&session, issuer());
    issue(&session, 1);
    issue(&session, 1);
    let as_admin = session.clone().with_caller(admin());
    let as_issuer = session.clone().with_caller(issuer());

    run_burn(
        &BurnArgs {
            command: BurnCommand::Request {
                ids: vec![id(1), id(2)],
                reason: "issued in error".to_string(),
            },
        },
        &as_issuer,
    )
    .expect("request");

    // Only id 1 is approved; id 2 is still inside the timelock.
    run_burn(
        &BurnArgs {
            command: BurnCommand::Approve { ids: vec![id(1)] },
        },
        &as_admin,
    )
    .expect("approve");

    let code = run_burn(
        &BurnArgs {
            command: BurnCommand::Execute {
                ids: vec![id(1), id(2)],
                reason: "cleanup".to_string(),
            },
        },
        &as_issuer,
    )
    .expect("execute");
    assert_eq!(code, 3);

    let registry = session.open().expect("open");
    assert!(!registry.exists(id(1)));
    assert!(registry.exists(id(2)));
    assert!(registry.burn_request(id(2)).is_some());
    assert_eq!(registry.total_issued(), 2);
}

#[test]
fn burn_timelock_show_and_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    let as_admin = session.clone().with_caller(admin());

    run_burn(
        &BurnArgs {
            command: BurnCommand::Timelock { secs: Some(600) },
        },
        &as_admin,
    )
    .expect("set timelock");
    assert_eq!(
        run_burn(
            &BurnArgs {
                command: BurnCommand::Timelock { secs: None },
            },
            &session,
        )
        .expect("show timelock"),
        0
    );
    assert_eq!(session.open().expect("open").burn_timelock_secs(), 600);
}

// =========================================================================
// Queries
// =========================================================================

#[test]
fn queries_run_without_caller() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = fresh(&dir);
    authorize(&session, issuer());
    issue(&session, 4);

    let query = |command| {
        run_query(
            &QueryArgs {
                command,
                offset: 0,
                limit: 10,
            },
            &session,
        )
    };
    assert_eq!(query(QueryCommand::Holder { principal: holder() }).expect("holder"), 0);
    assert_eq!(
        query(QueryCommand::Status {
            status: CredentialStatus::Pending
        })
        .expect("status"),
        0
    );
    assert!(query(QueryCommand::Category { id: 0 }).is_err());

    let registry = session.open().expect("open");
    assert_eq!(registry.count_by_holder(&holder()), 1);
    assert_eq!(
        registry.count_by_category(CategoryId::new(4).expect("category id")),
        1
    );
}
