//! # Credential Lifecycle Scenarios
//!
//! End-to-end flows through the public registry API: issuance and
//! verification, both burn paths, timelock boundaries, issuer suspension,
//! the transfer gate, and event accounting.

use sbt_core::{CategoryId, CredentialId, ManualClock, Principal, Timestamp};
use sbt_registry::{
    AuthorizationContext, BurnPath, CredentialRegistry, CredentialStatus, DenialReason,
    ErrorKind, InMemoryRoleStore, MemorySink, RegistryConfig, RegistryError, RegistrySnapshot,
    Requirement, Role, TransferOutcome,
};

type Registry = CredentialRegistry<InMemoryRoleStore, MemorySink, ManualClock>;

const T0: i64 = 1_700_000_000;

fn admin() -> Principal {
    Principal::from_low_u64_be(0xad)
}

fn issuer() -> Principal {
    Principal::from_low_u64_be(0x15)
}

fn holder() -> Principal {
    Principal::from_low_u64_be(0x40)
}

fn as_(p: Principal) -> AuthorizationContext {
    AuthorizationContext::new(p)
}

fn setup() -> (Registry, ManualClock) {
    let clock = ManualClock::at_epoch(T0);
    let config = RegistryConfig {
        administrators: vec![admin()],
        ..RegistryConfig::default()
    };
    let mut reg = CredentialRegistry::new(
        &config,
        InMemoryRoleStore::new(),
        MemorySink::new(),
        clock.clone(),
    )
    .expect("valid config");
    reg.authorize_issuer(&as_(admin()), issuer())
        .expect("authorize issuer");
    (reg, clock)
}

// =========================================================================
// Scenario A: issue → verify → update
// =========================================================================

#[test]
fn scenario_a_issue_verify_update() {
    let (mut reg, _) = setup();

    let id = reg.issue(&as_(issuer()), holder(), 3, 85, "r1").unwrap();
    assert_eq!(id, CredentialId::new(1));
    let c = reg.read(id).unwrap();
    assert_eq!(c.version, 1);
    assert_eq!(c.status(), CredentialStatus::Pending);

    reg.verify(&as_(issuer()), id).unwrap();
    assert_eq!(reg.read(id).unwrap().status(), CredentialStatus::Verified);

    assert_eq!(reg.update(&as_(issuer()), id, 90, "correction").unwrap(), 2);
    let c = reg.read(id).unwrap();
    assert_eq!(c.grade, 90);
    assert_eq!(c.version, 2);
    assert_eq!(c.status(), CredentialStatus::Verified);
}

// =========================================================================
// Scenario B: request → failed early burn → approve → burn
// =========================================================================

#[test]
fn scenario_b_approved_burn() {
    let (mut reg, _) = setup();
    let id = reg.issue(&as_(issuer()), holder(), 3, 85, "r1").unwrap();

    reg.request_burn(&as_(issuer()), id, "gdpr").unwrap();
    assert!(!reg.burn_request(id).unwrap().approved);

    let err = reg.burn(&as_(issuer()), id, "gdpr").unwrap_err();
    assert_eq!(
        err,
        RegistryError::Unauthorized {
            caller: issuer(),
            requirement: Requirement::BurnClearance,
        }
    );
    assert!(reg.exists(id));

    reg.approve_burn(&as_(admin()), id).unwrap();
    assert!(reg.exists(id), "approval alone does not delete");

    assert_eq!(reg.burn(&as_(issuer()), id, "gdpr").unwrap(), BurnPath::Approved);
    assert_eq!(reg.read(id), Err(RegistryError::NotFound(id)));
    assert!(reg.burn_request(id).is_none());
}

// =========================================================================
// Scenario C: timelock boundary
// =========================================================================

#[test]
fn scenario_c_timelock_boundary() {
    let (mut reg, clock) = setup();
    reg.set_burn_timelock(&as_(admin()), 3_600).unwrap();
    reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    let id = reg.issue(&as_(issuer()), holder(), 1, 20, "b").unwrap();
    assert_eq!(id.get(), 2);

    reg.request_burn(&as_(issuer()), id, "x").unwrap();

    clock.advance(3_599);
    let err = reg.burn(&as_(issuer()), id, "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    clock.advance(2);
    assert_eq!(
        reg.burn(&as_(issuer()), id, "x").unwrap(),
        BurnPath::TimelockElapsed
    );
    assert!(!reg.exists(id));
}

#[test]
fn timelock_change_after_request_moves_deadline() {
    let (mut reg, clock) = setup();
    let id = reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    reg.request_burn(&as_(issuer()), id, "x").unwrap();

    clock.advance(600);
    assert!(reg.burn(&as_(issuer()), id, "x").is_err());

    // Shortened below the elapsed time: the same request is now clear.
    reg.set_burn_timelock(&as_(admin()), 300).unwrap();
    assert_eq!(
        reg.burn(&as_(issuer()), id, "x").unwrap(),
        BurnPath::TimelockElapsed
    );
}

#[test]
fn administrator_burns_without_request() {
    let (mut reg, _) = setup();
    let id = reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    assert_eq!(reg.burn(&as_(admin()), id, "policy").unwrap(), BurnPath::Immediate);
    assert_eq!(reg.total_live(), 0);
    assert_eq!(reg.total_issued(), 1);
}

// =========================================================================
// Scenario D: issuer suspension
// =========================================================================

#[test]
fn scenario_d_issuer_suspension() {
    let (mut reg, _) = setup();

    assert_eq!(
        reg.authorize_issuer(&as_(admin()), issuer()),
        Err(RegistryError::AlreadyAuthorized(issuer()))
    );

    reg.revoke_issuer(&as_(admin()), issuer()).unwrap();
    let err = reg.issue(&as_(issuer()), holder(), 1, 1, "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(reg.has_role(Role::Issuer, &issuer()));
    assert!(!reg.is_authorized_issuer(&issuer()));
}

// =========================================================================
// Revocation is terminal for verification
// =========================================================================

#[test]
fn revoked_credential_never_verifies_or_updates() {
    let (mut reg, _) = setup();
    let id = reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    reg.revoke(&as_(issuer()), id, "fraud").unwrap();

    assert_eq!(reg.verify(&as_(issuer()), id), Err(RegistryError::Revoked(id)));
    assert_eq!(
        reg.update(&as_(issuer()), id, 99, "late"),
        Err(RegistryError::Revoked(id))
    );
    let c = reg.read(id).unwrap();
    assert!(!c.verified);
    assert_eq!(c.version, 2);
    assert_eq!(c.revocation_reason.as_deref(), Some("fraud"));
}

// =========================================================================
// Transfer gate
// =========================================================================

#[test]
fn transfer_needs_mode_consent_and_issuer_of_record() {
    let (mut reg, _) = setup();
    let id = reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    let next = Principal::from_low_u64_be(0x41);
    let stranger = Principal::from_low_u64_be(0x99);

    reg.set_transfer_mode(&as_(admin()), true).unwrap();
    reg.grant_transfer_consent(&as_(holder()), id, stranger).unwrap();

    // Consent names the stranger, but the stranger did not issue it.
    assert_eq!(
        reg.transfer(&as_(stranger), id, next).unwrap(),
        TransferOutcome::Denied {
            reason: DenialReason::NotIssuerOfRecord
        }
    );
    // The issuer did, but consent names someone else.
    assert_eq!(
        reg.transfer(&as_(issuer()), id, next).unwrap(),
        TransferOutcome::Denied {
            reason: DenialReason::ConsentMismatch {
                granted_to: stranger
            }
        }
    );

    reg.grant_transfer_consent(&as_(holder()), id, issuer()).unwrap();
    reg.set_transfer_mode(&as_(admin()), false).unwrap();
    assert_eq!(
        reg.transfer(&as_(issuer()), id, next).unwrap(),
        TransferOutcome::Denied {
            reason: DenialReason::TransferModeDisabled
        }
    );
    assert_eq!(reg.read(id).unwrap().holder, holder());

    reg.set_transfer_mode(&as_(admin()), true).unwrap();
    assert!(reg.transfer(&as_(issuer()), id, next).unwrap().is_applied());
    assert_eq!(reg.read(id).unwrap().holder, next);

    // Consent was consumed.
    let back = reg.transfer(&as_(issuer()), id, holder()).unwrap();
    assert_eq!(
        back,
        TransferOutcome::Denied {
            reason: DenialReason::NoConsent
        }
    );
}

#[test]
fn issuer_can_update_after_transfer() {
    let (mut reg, _) = setup();
    let id = reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    let next = Principal::from_low_u64_be(0x41);
    reg.set_transfer_mode(&as_(admin()), true).unwrap();
    reg.grant_transfer_consent(&as_(holder()), id, issuer()).unwrap();
    reg.transfer(&as_(issuer()), id, next).unwrap();

    reg.verify(&as_(issuer()), id).unwrap();
    assert_eq!(reg.update(&as_(issuer()), id, 11, "regrade").unwrap(), 2);
}

// =========================================================================
// Event accounting
// =========================================================================

#[test]
fn one_event_per_accepted_mutation() {
    let (mut reg, clock) = setup();
    reg.sink_mut().take();

    let id = reg.issue(&as_(issuer()), holder(), 1, 10, "a").unwrap();
    reg.verify(&as_(issuer()), id).unwrap();
    assert!(reg.verify(&as_(issuer()), id).is_err());
    reg.update(&as_(issuer()), id, 20, "fix").unwrap();
    reg.set_category_name(&as_(issuer()), 1, "Math").unwrap();
    assert!(!reg
        .grant_role(&as_(admin()), Role::Issuer, issuer())
        .unwrap());
    reg.request_burn(&as_(issuer()), id, "x").unwrap();
    assert!(reg.request_burn(&as_(issuer()), id, "x").is_err());
    clock.advance(1);
    reg.burn(&as_(admin()), id, "x").unwrap();

    assert_eq!(
        reg.sink().kinds(),
        vec![
            "credential_issued",
            "credential_verified",
            "credential_updated",
            "category_named",
            "burn_requested",
            "credential_burned",
        ]
    );
    let last = reg.sink().last().unwrap();
    assert_eq!(last.committed_at, Timestamp::from_epoch_secs(T0 + 1).unwrap());
    assert_eq!(last.event.credential_id(), Some(id));
}

// =========================================================================
// Indices after a mixed history, and snapshot fidelity
// =========================================================================

#[test]
fn snapshot_restore_reproduces_every_page() {
    let (mut reg, clock) = setup();
    let holders = [holder(), Principal::from_low_u64_be(0x41)];
    for n in 0..12u64 {
        clock.advance(10);
        let who = holders[(n % 2) as usize];
        reg.issue(&as_(issuer()), who, 1 + n % 3, n as u8, format!("r{n}"))
            .unwrap();
    }
    reg.verify_batch(&as_(issuer()), &[CredentialId::new(2), CredentialId::new(5)])
        .unwrap();
    reg.revoke(&as_(issuer()), CredentialId::new(7), "fraud").unwrap();
    reg.burn(&as_(admin()), CredentialId::new(9), "policy").unwrap();

    let json = reg.snapshot().to_json().unwrap();
    let restored: Registry = CredentialRegistry::restore(
        RegistrySnapshot::from_json(&json).unwrap(),
        InMemoryRoleStore::new(),
        MemorySink::new(),
        clock.clone(),
    )
    .unwrap();

    for status in CredentialStatus::ALL {
        for k in [1, 3, 5] {
            assert_eq!(
                reg.page_by_status(status, k, k),
                restored.page_by_status(status, k, k)
            );
        }
    }
    for who in &holders {
        assert_eq!(
            reg.page_by_holder(who, 0, 100),
            restored.page_by_holder(who, 0, 100)
        );
    }
    for raw in 1..=3 {
        let category = CategoryId::new(raw).unwrap();
        assert_eq!(
            reg.page_by_category(category, 0, 100),
            restored.page_by_category(category, 0, 100)
        );
    }
    assert_eq!(
        reg.page_by_issuer(&issuer(), 2, 4),
        restored.page_by_issuer(&issuer(), 2, 4)
    );

    let from = Timestamp::from_epoch_secs(T0 + 30).unwrap();
    let to = Timestamp::from_epoch_secs(T0 + 80).unwrap();
    let window = restored.page_issued_between(from, to, 0, 100).unwrap();
    assert_eq!(window, reg.page_issued_between(from, to, 0, 100).unwrap());
    let expected: Vec<CredentialId> = [3, 4, 5, 6, 7, 8]
        .into_iter()
        .map(CredentialId::new)
        .collect();
    assert_eq!(window.ids, expected);

    assert_eq!(restored.count_by_status(CredentialStatus::Verified), 2);
    assert_eq!(restored.count_by_status(CredentialStatus::Revoked), 1);
    assert_eq!(restored.count_by_issuer(&issuer()), 11);
}
