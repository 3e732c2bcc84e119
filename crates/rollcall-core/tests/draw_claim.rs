use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rollcall_canonical::{ScanId, UserId, WinnerId};
use rollcall_core::{
    claim_in_event, sweep_expired, CheckInError, CheckInVerifier, ClaimError, ClaimStatus,
    Coordinate, DrawEngine, DrawError, Event, EventSchedule, EventStatus, Identity, Ledger,
    Prize, PrizeType, ScanLocation, ScanRequest, Settings,
};
use std::collections::{HashMap, HashSet};

fn make_venue() -> Coordinate {
    Coordinate::new(51.5074, -0.1278).unwrap()
}

fn make_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 14, 12, 0, 0).unwrap()
}

fn make_draw_time() -> DateTime<Utc> {
    make_start() + Duration::hours(3)
}

fn make_event(max_attendees: u32) -> Event {
    let start = make_start();
    let mut event = Event::new(
        "Street fair",
        UserId::parse("org:fair").unwrap(),
        make_venue(),
        250.0,
        EventSchedule::between(start, start + Duration::hours(6)),
        max_attendees,
    )
    .unwrap();
    event.transition(EventStatus::Active).unwrap();
    event
}

fn make_scan(user: &str, payload: &str) -> ScanRequest {
    ScanRequest {
        scan_id: ScanId::generate(),
        raw_payload: payload.to_string(),
        location: ScanLocation {
            coordinate: make_venue(),
            accuracy_meters: None,
        },
        identity: Identity {
            user_id: UserId::parse(user).unwrap(),
            name: user.to_string(),
            email: None,
            phone: None,
        },
    }
}

/// Event with `n` checked-in attendees named `user:0 .. user:{n-1}`.
fn make_event_with_attendees(n: u32) -> Event {
    let verifier = CheckInVerifier::from_settings(&Settings::default());
    let mut event = make_event(n.max(1));
    let payload = verifier
        .authority()
        .refresh(&mut event, make_start())
        .unwrap()
        .payload
        .clone();
    for i in 0..n {
        verifier
            .check_in(
                &mut event,
                &make_scan(&format!("user:{i}"), &payload),
                make_start() + Duration::minutes(i64::from(i)),
            )
            .unwrap();
    }
    event
}

fn add_prize(event: &mut Event, title: &str, prize_type: PrizeType, value: u64, quantity: u32) {
    event
        .prizes
        .push(Prize::new(title, prize_type, value, quantity).unwrap());
}

#[test]
fn draw_assigns_pending_winners_with_deadlines() {
    let mut event = make_event_with_attendees(4);
    add_prize(&mut event, "Headphones", PrizeType::Physical, 120, 2);
    let engine = DrawEngine::default();

    let winners = engine
        .conduct_with_rng(&mut event, make_draw_time(), &mut StdRng::seed_from_u64(7))
        .unwrap();

    assert_eq!(winners.len(), 2);
    assert_eq!(event.winners, winners);
    assert_eq!(event.drawn_at, Some(make_draw_time()));
    for w in &winners {
        assert_eq!(w.claim_status, ClaimStatus::Pending);
        assert_eq!(w.claim_deadline, make_draw_time() + Duration::days(7));
        assert_eq!(w.selected_at, make_draw_time());
        assert_eq!(w.prize_title, "Headphones");
        assert!(w.claimed_at.is_none());
        assert!(event.attendee_for(&w.user_id).is_some());
    }
    assert_ne!(winners[0].user_id, winners[1].user_id);
    assert_ne!(winners[0].claim_code, winners[1].claim_code);
}

#[test]
fn second_draw_is_refused() {
    let mut event = make_event_with_attendees(3);
    add_prize(&mut event, "Mug", PrizeType::Physical, 5, 1);
    let engine = DrawEngine::default();

    engine.conduct(&mut event, make_draw_time()).unwrap();
    let before = event.winners.clone();
    assert_eq!(
        engine.conduct(&mut event, make_draw_time()),
        Err(DrawError::AlreadyDrawn)
    );
    assert_eq!(event.winners, before);
}

#[test]
fn draw_guards() {
    let engine = DrawEngine::default();

    let mut empty = make_event_with_attendees(0);
    add_prize(&mut empty, "Mug", PrizeType::Physical, 5, 1);
    assert_eq!(
        engine.conduct(&mut empty, make_draw_time()),
        Err(DrawError::NoEligibleAttendees)
    );

    let mut no_prizes = make_event_with_attendees(2);
    assert_eq!(
        engine.conduct(&mut no_prizes, make_draw_time()),
        Err(DrawError::NoActivePrizes)
    );
    add_prize(&mut no_prizes, "Retired", PrizeType::Voucher, 5, 1);
    no_prizes.prizes[0].is_active = false;
    assert_eq!(
        engine.conduct(&mut no_prizes, make_draw_time()),
        Err(DrawError::NoActivePrizes)
    );
    assert!(no_prizes.drawn_at.is_none());
}

#[test]
fn deadline_past_the_calendar_leaves_the_event_undrawn() {
    let mut event = make_event_with_attendees(2);
    add_prize(&mut event, "Mug", PrizeType::Physical, 5, 1);
    let engine = DrawEngine::new(Duration::days(1_000_000_000), 8);

    assert_eq!(
        engine.conduct(&mut event, make_draw_time()),
        Err(DrawError::DeadlineOutOfRange)
    );
    assert!(event.winners.is_empty());
    assert!(event.drawn_at.is_none());
}

#[test]
fn ineligible_attendees_never_win() {
    let mut event = make_event_with_attendees(3);
    event.attendees[0].is_eligible_for_draw = false;
    event.attendees[1].is_eligible_for_draw = false;
    let only = event.attendees[2].user_id.clone();
    add_prize(&mut event, "Voucher", PrizeType::Voucher, 10, 3);

    let winners = DrawEngine::default()
        .conduct(&mut event, make_draw_time())
        .unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].user_id, only);
}

#[test]
fn no_repeat_winners_without_multiple_wins() {
    let engine = DrawEngine::default();
    for seed in 0..50 {
        let mut event = make_event_with_attendees(5);
        add_prize(&mut event, "First", PrizeType::Currency, 100, 2);
        add_prize(&mut event, "Second", PrizeType::Physical, 50, 2);
        add_prize(&mut event, "Third", PrizeType::Voucher, 10, 3);

        let winners = engine
            .conduct_with_rng(&mut event, make_draw_time(), &mut StdRng::seed_from_u64(seed))
            .unwrap();

        assert_eq!(winners.len(), 5);
        let users: HashSet<_> = winners.iter().map(|w| w.user_id.clone()).collect();
        assert_eq!(users.len(), 5);
        let titles: Vec<_> = winners.iter().map(|w| w.prize_title.as_str()).collect();
        assert_eq!(titles, ["First", "First", "Second", "Second", "Third"]);
    }
}

#[test]
fn multiple_wins_only_exclude_within_a_prize() {
    let engine = DrawEngine::default();
    let mut event = make_event_with_attendees(3);
    event.draw_settings.allow_multiple_wins = true;
    for title in ["A", "B", "C"] {
        add_prize(&mut event, title, PrizeType::Service, 1, 3);
    }

    let winners = engine
        .conduct_with_rng(&mut event, make_draw_time(), &mut StdRng::seed_from_u64(11))
        .unwrap();

    assert_eq!(winners.len(), 9);
    for chunk in winners.chunks(3) {
        let users: HashSet<_> = chunk.iter().map(|w| w.user_id.clone()).collect();
        assert_eq!(users.len(), 3);
    }
    let codes: HashSet<_> = winners.iter().map(|w| w.claim_code.clone()).collect();
    assert_eq!(codes.len(), 9);
}

#[test]
fn single_slot_wins_are_uniform() {
    const TRIALS: usize = 20_000;
    let engine = DrawEngine::default();
    let mut base = make_event_with_attendees(4);
    add_prize(&mut base, "Ticket", PrizeType::Voucher, 1, 1);
    let mut rng = StdRng::seed_from_u64(2024);

    let mut counts: HashMap<UserId, usize> = HashMap::new();
    for _ in 0..TRIALS {
        let mut event = base.clone();
        let winners = engine
            .conduct_with_rng(&mut event, make_draw_time(), &mut rng)
            .unwrap();
        *counts.entry(winners[0].user_id.clone()).or_default() += 1;
    }

    assert_eq!(counts.len(), 4);
    let expected = TRIALS / 4;
    for (user, count) in counts {
        // about 8 standard deviations
        assert!(
            count.abs_diff(expected) < 500,
            "{user} won {count} times, expected about {expected}"
        );
    }
}

#[test]
fn reset_allows_a_redraw_until_a_claim() {
    let engine = DrawEngine::default();
    let mut event = make_event_with_attendees(3);
    add_prize(&mut event, "Mug", PrizeType::Physical, 5, 1);

    engine.conduct(&mut event, make_draw_time()).unwrap();
    let discarded = engine.reset(&mut event).unwrap();
    assert_eq!(discarded.len(), 1);
    assert!(event.winners.is_empty());
    assert!(event.drawn_at.is_none());

    let winners = engine.conduct(&mut event, make_draw_time()).unwrap();
    let code = winners[0].claim_code.to_string();
    claim_in_event(&mut event, &winners[0].id, &code, make_draw_time()).unwrap();
    assert_eq!(engine.reset(&mut event), Err(DrawError::ClaimsRecorded));
    assert_eq!(event.winners.len(), 1);
}

#[test]
fn claim_state_machine() {
    let mut event = make_event_with_attendees(2);
    add_prize(&mut event, "Coins", PrizeType::Currency, 500, 1);
    let winners = DrawEngine::default()
        .conduct(&mut event, make_draw_time())
        .unwrap();
    let winner = &winners[0];
    let at = make_draw_time() + Duration::days(1);

    assert_eq!(
        claim_in_event(&mut event, &WinnerId::generate(), "X", at),
        Err(ClaimError::WinnerNotFound)
    );
    assert_eq!(
        claim_in_event(&mut event, &winner.id, "NOTRIGHT", at),
        Err(ClaimError::CodeMismatch)
    );
    assert_eq!(
        event.winner(&winner.id).unwrap().claim_status,
        ClaimStatus::Pending
    );

    let lowercase = winner.claim_code.as_str().to_ascii_lowercase();
    let receipt = claim_in_event(&mut event, &winner.id, &lowercase, at).unwrap();
    assert_eq!(receipt.winner.claim_status, ClaimStatus::Claimed);
    assert_eq!(receipt.winner.claimed_at, Some(at));
    assert_eq!(event.winner(&winner.id), Some(&receipt.winner));

    let credit = receipt.ledger_credit().unwrap();
    assert_eq!(credit.user_id, winner.user_id);
    assert_eq!(credit.amount, 500);

    assert_eq!(
        claim_in_event(&mut event, &winner.id, winner.claim_code.as_str(), at),
        Err(ClaimError::AlreadyClaimed)
    );
    assert!(sweep_expired(&mut event, at + Duration::days(30)).is_empty());
    assert_eq!(
        event.winner(&winner.id).unwrap().claim_status,
        ClaimStatus::Claimed
    );
}

#[test]
fn expiry_beats_a_correct_code() {
    let mut event = make_event_with_attendees(2);
    add_prize(&mut event, "Scarf", PrizeType::Physical, 20, 2);
    let winners = DrawEngine::default()
        .conduct(&mut event, make_draw_time())
        .unwrap();
    let late = make_draw_time() + Duration::days(7) + Duration::seconds(1);

    assert_eq!(
        claim_in_event(&mut event, &winners[0].id, winners[0].claim_code.as_str(), late),
        Err(ClaimError::Expired)
    );
    // claim attempts never write the expired state
    assert_eq!(
        event.winner(&winners[0].id).unwrap().claim_status,
        ClaimStatus::Pending
    );

    let swept = sweep_expired(&mut event, late);
    assert_eq!(swept.len(), 2);
    assert!(event
        .winners
        .iter()
        .all(|w| w.claim_status == ClaimStatus::Expired));
    assert!(sweep_expired(&mut event, late).is_empty());
    assert_eq!(
        claim_in_event(&mut event, &winners[1].id, winners[1].claim_code.as_str(), late),
        Err(ClaimError::Expired)
    );
}

#[test]
fn sweep_leaves_unexpired_winners_pending() {
    let mut event = make_event_with_attendees(2);
    add_prize(&mut event, "Scarf", PrizeType::Physical, 20, 2);
    DrawEngine::default()
        .conduct(&mut event, make_draw_time())
        .unwrap();

    assert!(sweep_expired(&mut event, make_draw_time() + Duration::days(7)).is_empty());
    assert!(event
        .winners
        .iter()
        .all(|w| w.claim_status == ClaimStatus::Pending));
}

#[derive(Default)]
struct Wallets(HashMap<UserId, u64>);

impl Ledger for Wallets {
    type Error = std::convert::Infallible;

    fn credit(&mut self, user_id: &UserId, amount: u64) -> Result<(), Self::Error> {
        *self.0.entry(user_id.clone()).or_default() += amount;
        Ok(())
    }
}

#[test]
fn end_to_end_scenario() {
    let settings = Settings::default();
    let verifier = CheckInVerifier::from_settings(&settings);
    let engine = DrawEngine::from_settings(&settings);
    let mut wallets = Wallets::default();

    let mut event = make_event(2);
    add_prize(&mut event, "1000 coins", PrizeType::Currency, 1000, 1);
    let payload = verifier
        .authority()
        .refresh(&mut event, make_start())
        .unwrap()
        .payload
        .clone();
    let at = make_start() + Duration::minutes(30);

    verifier.check_in(&mut event, &make_scan("user:u1", &payload), at).unwrap();
    verifier.check_in(&mut event, &make_scan("user:u2", &payload), at).unwrap();
    let third = verifier
        .check_in(&mut event, &make_scan("user:u3", &payload), at)
        .unwrap_err();
    assert_eq!(third.error, CheckInError::EventFull);
    assert_eq!(event.current_attendees(), 2);

    let winners = engine.conduct(&mut event, make_draw_time()).unwrap();
    assert_eq!(winners.len(), 1);
    let winner = &winners[0];
    assert!(["user:u1", "user:u2"].contains(&winner.user_id.as_str()));

    let claim_at = make_draw_time() + Duration::hours(2);
    assert_eq!(
        claim_in_event(&mut event, &winner.id, "WRONGCODE", claim_at),
        Err(ClaimError::CodeMismatch)
    );
    let receipt =
        claim_in_event(&mut event, &winner.id, winner.claim_code.as_str(), claim_at).unwrap();
    assert_eq!(receipt.winner.claim_status, ClaimStatus::Claimed);
    if let Some(credit) = receipt.ledger_credit() {
        credit.apply(&mut wallets).unwrap();
    }
    assert_eq!(wallets.0.get(&winner.user_id), Some(&1000));

    assert_eq!(
        claim_in_event(&mut event, &winner.id, winner.claim_code.as_str(), claim_at),
        Err(ClaimError::AlreadyClaimed)
    );
}
