use chrono::{DateTime, Duration, TimeZone, Utc};
use rollcall_canonical::{ScanId, UserId};
use rollcall_core::{
    distance_meters, CheckInError, CheckInVerifier, CheckKind, CheckStatus, Coordinate,
    CredentialError, CreditReason, Event, EventSchedule, EventStatus, Identity, ScanLocation,
    ScanRequest, Settings, VerificationStatus,
};

fn make_venue() -> Coordinate {
    Coordinate::new(25.2048, 55.2708).unwrap()
}

fn make_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
}

fn make_now() -> DateTime<Utc> {
    make_start() + Duration::hours(1)
}

fn make_event(max_attendees: u32) -> Event {
    let start = make_start();
    let mut event = Event::new(
        "Rooftop meetup",
        UserId::parse("org:host").unwrap(),
        make_venue(),
        100.0,
        EventSchedule::between(start, start + Duration::hours(4)),
        max_attendees,
    )
    .unwrap();
    event.transition(EventStatus::Active).unwrap();
    event
}

fn make_verifier() -> CheckInVerifier {
    CheckInVerifier::from_settings(&Settings::default())
}

fn issue(verifier: &CheckInVerifier, event: &mut Event) -> String {
    verifier
        .authority()
        .refresh(event, make_start())
        .unwrap()
        .payload
        .clone()
}

fn make_scan(user: &str, payload: &str, at: Coordinate) -> ScanRequest {
    ScanRequest {
        scan_id: ScanId::generate(),
        raw_payload: payload.to_string(),
        location: ScanLocation {
            coordinate: at,
            accuracy_meters: Some(5.0),
        },
        identity: Identity {
            user_id: UserId::parse(user).unwrap(),
            name: user.to_string(),
            email: None,
            phone: None,
        },
    }
}

#[test]
fn accepted_check_in_appends_verified_attendee() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);

    let receipt = verifier
        .check_in(&mut event, &make_scan("user:alice", &payload, make_venue()), make_now())
        .unwrap();

    assert!(receipt.details.all_passed());
    assert_eq!(receipt.details.distance_meters, Some(0.0));
    assert_eq!(receipt.attendee.verification_status, VerificationStatus::Verified);
    assert!(receipt.attendee.is_eligible_for_draw);
    assert_eq!(receipt.attendee.scanned_at, make_now());
    assert_eq!(event.current_attendees(), 1);
    assert_eq!(event.attendees[0], receipt.attendee);
    assert_eq!(event.qr_credential.as_ref().unwrap().scans_used, 1);
    assert!(receipt.bonus.is_none());
}

#[test]
fn radius_boundary_is_inclusive() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    let scanner = Coordinate::new(25.2057, 55.2708).unwrap();
    let d = distance_meters(scanner, make_venue());
    assert!(d > 50.0 && d < 150.0);

    event.verification_radius_meters = d;
    let scan = make_scan("user:edge", &payload, scanner);
    assert!(verifier.precheck(&event.site(), &scan, make_now()).is_ok());

    event.verification_radius_meters = d - 1e-6;
    let rejection = verifier
        .check_in(&mut event, &scan, make_now())
        .unwrap_err();
    match rejection.error {
        CheckInError::TooFar { distance_meters } => assert_eq!(distance_meters, d),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(rejection.details.status(CheckKind::Credential), CheckStatus::Pass);
    assert_eq!(rejection.details.status(CheckKind::Location), CheckStatus::Fail);
    assert_eq!(rejection.details.status(CheckKind::Duplicate), CheckStatus::Skipped);
    assert_eq!(event.current_attendees(), 0);
}

#[test]
fn duplicate_user_is_rejected() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    let scan = make_scan("user:alice", &payload, make_venue());

    verifier.check_in(&mut event, &scan, make_now()).unwrap();
    let rejection = verifier
        .check_in(&mut event, &make_scan("user:alice", &payload, make_venue()), make_now())
        .unwrap_err();
    assert_eq!(rejection.error, CheckInError::AlreadyCheckedIn);
    assert_eq!(rejection.error.code(), "ALREADY_CHECKED_IN");
    assert_eq!(event.current_attendees(), 1);
}

#[test]
fn capacity_is_a_hard_ceiling() {
    let verifier = make_verifier();
    let mut event = make_event(3);
    let payload = issue(&verifier, &mut event);

    for i in 0..3 {
        let user = format!("user:{i}");
        verifier
            .check_in(&mut event, &make_scan(&user, &payload, make_venue()), make_now())
            .unwrap();
    }
    for i in 3..6 {
        let user = format!("user:{i}");
        let rejection = verifier
            .check_in(&mut event, &make_scan(&user, &payload, make_venue()), make_now())
            .unwrap_err();
        assert_eq!(rejection.error, CheckInError::EventFull);
    }
    assert_eq!(event.current_attendees(), 3);
}

#[test]
fn time_window_is_enforced() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);

    let early = make_start() - Duration::minutes(1);
    let rejection = verifier
        .check_in(&mut event, &make_scan("user:early", &payload, make_venue()), early)
        .unwrap_err();
    assert_eq!(rejection.error, CheckInError::OutsideEventWindow);
    assert_eq!(rejection.details.status(CheckKind::Capacity), CheckStatus::Pass);

    let end = event.schedule.ends_at();
    assert!(verifier
        .check_in(&mut event, &make_scan("user:last", &payload, make_venue()), end)
        .is_ok());
    assert_eq!(event.qr_credential.as_ref().unwrap().scans_used, 1);
}

#[test]
fn credential_failures_stop_the_pipeline() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let stale = issue(&verifier, &mut event);
    let fresh = issue(&verifier, &mut event);

    let rejection = verifier
        .check_in(&mut event, &make_scan("user:alice", &stale, make_venue()), make_now())
        .unwrap_err();
    assert_eq!(
        rejection.error,
        CheckInError::Credential {
            reason: CredentialError::Inactive
        }
    );
    assert_eq!(rejection.details.distance_meters, None);
    assert_eq!(rejection.details.status(CheckKind::Location), CheckStatus::Skipped);

    let rejection = verifier
        .check_in(&mut event, &make_scan("user:alice", "not a credential", make_venue()), make_now())
        .unwrap_err();
    assert_eq!(rejection.error.code(), "CREDENTIAL_MALFORMED");

    let mut other = make_event(10);
    let foreign = issue(&verifier, &mut other);
    let rejection = verifier
        .check_in(&mut event, &make_scan("user:alice", &foreign, make_venue()), make_now())
        .unwrap_err();
    assert_eq!(rejection.error.code(), "CREDENTIAL_WRONG_EVENT");

    assert!(verifier
        .check_in(&mut event, &make_scan("user:alice", &fresh, make_venue()), make_now())
        .is_ok());
}

#[test]
fn ended_event_refuses_scans() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    event.transition(EventStatus::Ended).unwrap();

    let rejection = verifier
        .check_in(&mut event, &make_scan("user:late", &payload, make_venue()), make_now())
        .unwrap_err();
    assert_eq!(
        rejection.error,
        CheckInError::Credential {
            reason: CredentialError::Inactive
        }
    );
    assert!(verifier.authority().refresh(&mut event, make_now()).is_err());
}

#[test]
fn draft_event_refuses_scans() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    event.status = EventStatus::Draft;

    let rejection = verifier
        .check_in(&mut event, &make_scan("user:early", &payload, make_venue()), make_now())
        .unwrap_err();
    assert_eq!(
        rejection.error,
        CheckInError::Credential {
            reason: CredentialError::Inactive
        }
    );
    assert!(event.attendees.is_empty());
    assert!(verifier.authority().refresh(&mut event, make_now()).is_err());
}

#[test]
fn admit_rechecks_status_after_precheck() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    let scan = make_scan("user:slow", &payload, make_venue());

    let prechecked = verifier.precheck(&event.site(), &scan, make_now()).unwrap();
    event.transition(EventStatus::Cancelled).unwrap();
    let rejection = verifier
        .admit(&mut event, &scan, prechecked, make_now())
        .unwrap_err();
    assert_eq!(rejection.error.code(), "CREDENTIAL_INACTIVE");
    assert!(event.attendees.is_empty());
}

#[test]
fn scan_limit_caps_successful_check_ins() {
    let settings = Settings {
        default_scan_limit: Some(2),
        ..Settings::default()
    };
    let verifier = CheckInVerifier::from_settings(&settings);
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);

    for user in ["user:a", "user:b"] {
        verifier
            .check_in(&mut event, &make_scan(user, &payload, make_venue()), make_now())
            .unwrap();
    }
    let rejection = verifier
        .check_in(&mut event, &make_scan("user:c", &payload, make_venue()), make_now())
        .unwrap_err();
    assert_eq!(
        rejection.error,
        CheckInError::Credential {
            reason: CredentialError::ScanLimitReached
        }
    );
}

#[test]
fn admit_revalidates_after_refresh() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    let scan = make_scan("user:slow", &payload, make_venue());

    let prechecked = verifier.precheck(&event.site(), &scan, make_now()).unwrap();
    assert_eq!(prechecked.details().status(CheckKind::Location), CheckStatus::Pass);
    issue(&verifier, &mut event);

    let rejection = verifier
        .admit(&mut event, &scan, prechecked, make_now())
        .unwrap_err();
    assert_eq!(rejection.error.code(), "CREDENTIAL_INACTIVE");
    assert_eq!(event.current_attendees(), 0);
}

#[test]
fn bonus_is_reported_when_configured() {
    let settings = Settings {
        check_in_bonus: 25,
        ..Settings::default()
    };
    let verifier = CheckInVerifier::from_settings(&settings);
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);

    let receipt = verifier
        .check_in(&mut event, &make_scan("user:alice", &payload, make_venue()), make_now())
        .unwrap();
    let bonus = receipt.bonus.unwrap();
    assert_eq!(bonus.amount, 25);
    assert_eq!(bonus.reason, CreditReason::CheckInBonus);
    assert_eq!(bonus.user_id.as_str(), "user:alice");
}

#[test]
fn verification_hashes_differ_per_attendee() {
    let verifier = make_verifier();
    let mut event = make_event(10);
    let payload = issue(&verifier, &mut event);
    for user in ["user:a", "user:b"] {
        verifier
            .check_in(&mut event, &make_scan(user, &payload, make_venue()), make_now())
            .unwrap();
    }
    assert_ne!(
        event.attendees[0].provenance.verification_hash,
        event.attendees[1].provenance.verification_hash
    );
}
