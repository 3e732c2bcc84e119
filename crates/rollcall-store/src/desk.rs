//! Per-event serialized operations over a store.

use chrono::{DateTime, Utc};
use rollcall_canonical::{EventId, PrizeId, WinnerId};
use rollcall_core::{
    claim_in_event, sweep_expired, CheckInReceipt, CheckInRejection, CheckInVerifier,
    ClaimError, ClaimReceipt, CoreError, DrawEngine, DrawError, Event, EventStatus, Prize,
    QrCredential, ScanRequest, Settings, StatusError, Winner,
};
use rollcall_journal::{AuditEntry, AuditKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use thiserror::Error;

use crate::audit::AuditSink;
use crate::error::StoreError;
use crate::traits::EventStore;

/// Errors returned by [`EventDesk`] operations.
#[derive(Error, Debug)]
pub enum DeskError {
    /// No event with this id in the store.
    #[error("event {0} not found")]
    NotFound(EventId),
    /// Persistence or audit failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Check-in refused.
    #[error(transparent)]
    CheckIn(#[from] CheckInRejection),
    /// Draw refused.
    #[error(transparent)]
    Draw(#[from] DrawError),
    /// Claim refused.
    #[error(transparent)]
    Claim(#[from] ClaimError),
    /// Status lifecycle violation.
    #[error(transparent)]
    Status(#[from] StatusError),
    /// Credential issuance failure.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// A thread panicked while holding an event lock.
    #[error("event lock poisoned")]
    Poisoned,
}

type Described = Option<(AuditKind, Value)>;

/// Serializes every mutation of an event behind that event's own lock.
///
/// Events are loaded from the store on first use and cached as
/// `Arc<Mutex<Event>>`. Operations on different events never contend beyond
/// the brief map lookup. Each mutation runs on a copy of the event. Its audit
/// entry is written first, then the store write, and only then does the copy
/// replace the cached event, all under the lock. A failed audit or store write
/// leaves the cached and stored event untouched, and journal order matches
/// the order mutations were applied.
///
/// The cache is never evicted: every event a desk touches stays loaded for the
/// desk's lifetime, ended and cancelled ones included. Long-lived hosts bound
/// memory by dropping the desk and opening a new one over the same store.
pub struct EventDesk<S: EventStore, A: AuditSink> {
    store: S,
    audit: A,
    verifier: CheckInVerifier,
    engine: DrawEngine,
    events: RwLock<HashMap<EventId, Arc<Mutex<Event>>>>,
}

impl<S: EventStore, A: AuditSink> EventDesk<S, A> {
    /// Creates a desk configured from `settings`.
    pub fn new(store: S, audit: A, settings: &Settings) -> Self {
        Self::with_components(
            store,
            audit,
            CheckInVerifier::from_settings(settings),
            DrawEngine::from_settings(settings),
        )
    }

    /// Creates a desk around explicit components.
    pub fn with_components(
        store: S,
        audit: A,
        verifier: CheckInVerifier,
        engine: DrawEngine,
    ) -> Self {
        Self {
            store,
            audit,
            verifier,
            engine,
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Underlying audit sink.
    pub fn audit(&self) -> &A {
        &self.audit
    }

    fn handle(&self, id: &EventId) -> Result<Arc<Mutex<Event>>, DeskError> {
        if let Some(handle) = self.events.read().map_err(|_| DeskError::Poisoned)?.get(id) {
            return Ok(Arc::clone(handle));
        }
        let mut events = self.events.write().map_err(|_| DeskError::Poisoned)?;
        if let Some(handle) = events.get(id) {
            return Ok(Arc::clone(handle));
        }
        let event = self
            .store
            .get(id)?
            .ok_or_else(|| DeskError::NotFound(id.clone()))?;
        let handle = Arc::new(Mutex::new(event));
        events.insert(id.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    fn lock(handle: &Mutex<Event>) -> Result<MutexGuard<'_, Event>, DeskError> {
        handle.lock().map_err(|_| DeskError::Poisoned)
    }

    fn record(
        &self,
        kind: AuditKind,
        event_id: &EventId,
        now: DateTime<Utc>,
        payload: Value,
    ) -> Result<(), DeskError> {
        self.audit.record(AuditEntry {
            kind,
            event_id: event_id.clone(),
            occurred_at: now,
            payload,
        })?;
        Ok(())
    }

    /// Runs `op` on a copy of the event under its lock, audits whatever
    /// `describe` reports for the outcome, then persists a successful copy.
    fn apply<T>(
        &self,
        id: &EventId,
        now: DateTime<Utc>,
        op: impl FnOnce(&mut Event) -> Result<T, DeskError>,
        describe: impl FnOnce(&Result<T, DeskError>) -> Described,
    ) -> Result<T, DeskError> {
        self.apply_if(id, now, op, |_| true, describe)
    }

    /// Like [`apply`](Self::apply), but a successful outcome is only persisted
    /// when `changed` says the copy differs from the stored event.
    fn apply_if<T>(
        &self,
        id: &EventId,
        now: DateTime<Utc>,
        op: impl FnOnce(&mut Event) -> Result<T, DeskError>,
        changed: impl FnOnce(&T) -> bool,
        describe: impl FnOnce(&Result<T, DeskError>) -> Described,
    ) -> Result<T, DeskError> {
        let handle = self.handle(id)?;
        let mut event = Self::lock(&handle)?;
        let mut working = event.clone();
        let result = op(&mut working);
        if let Some((kind, payload)) = describe(&result) {
            self.record(kind, id, now, payload)?;
        }
        if let Ok(value) = &result {
            if changed(value) {
                self.store.put(&working)?;
                *event = working;
            }
        }
        result
    }

    /// Stores a new event and returns its id.
    pub fn create(&self, event: Event, now: DateTime<Utc>) -> Result<EventId, DeskError> {
        let id = event.id.clone();
        let mut events = self.events.write().map_err(|_| DeskError::Poisoned)?;
        if events.contains_key(&id) || self.store.get(&id)?.is_some() {
            return Err(StoreError::AlreadyExists(id).into());
        }
        let payload = json!({
            "title": event.title,
            "creator": event.creator,
            "maxAttendees": event.max_attendees,
            "verificationRadiusMeters": event.verification_radius_meters,
        });
        self.record(AuditKind::EventCreated, &id, now, payload)?;
        self.store.insert(&event)?;
        events.insert(id.clone(), Arc::new(Mutex::new(event)));
        Ok(id)
    }

    /// Current state of an event.
    pub fn event(&self, id: &EventId) -> Result<Event, DeskError> {
        let handle = self.handle(id)?;
        let event = Self::lock(&handle)?;
        Ok(event.clone())
    }

    /// Ids of every stored event.
    pub fn list(&self) -> Result<Vec<EventId>, DeskError> {
        Ok(self.store.list()?)
    }

    /// Moves an event to `next` and returns the previous status.
    pub fn transition(
        &self,
        id: &EventId,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<EventStatus, DeskError> {
        self.apply(
            id,
            now,
            |event| {
                let from = event.status;
                event.transition(next)?;
                Ok(from)
            },
            |result| {
                let from = result.as_ref().ok()?;
                Some((
                    AuditKind::StatusChanged,
                    json!({ "from": from, "to": next }),
                ))
            },
        )
    }

    /// Appends a prize to a non-terminal event.
    pub fn add_prize(
        &self,
        id: &EventId,
        prize: Prize,
        now: DateTime<Utc>,
    ) -> Result<PrizeId, DeskError> {
        let payload = json!({
            "prizeId": prize.id,
            "title": prize.title,
            "type": prize.prize_type,
            "value": prize.value,
            "quantity": prize.quantity,
        });
        self.apply(
            id,
            now,
            |event| {
                if event.status.is_terminal() {
                    return Err(StatusError::Closed(event.status).into());
                }
                let prize_id = prize.id.clone();
                event.prizes.push(prize);
                Ok(prize_id)
            },
            |result| result.is_ok().then(|| (AuditKind::PrizeAdded, payload)),
        )
    }

    /// Issues a fresh credential, replacing any previous one.
    pub fn issue_credential(
        &self,
        id: &EventId,
        now: DateTime<Utc>,
    ) -> Result<QrCredential, DeskError> {
        self.apply(
            id,
            now,
            |event| Ok(self.verifier.authority().refresh(event, now)?.clone()),
            |result| {
                let credential = result.as_ref().ok()?;
                Some((
                    AuditKind::CredentialIssued,
                    json!({
                        "credentialId": credential.id,
                        "expiresAt": credential.expires_at,
                        "scanLimit": credential.scan_limit,
                    }),
                ))
            },
        )
    }

    /// Switches the event's credential off.
    pub fn deactivate_credential(&self, id: &EventId, now: DateTime<Utc>) -> Result<(), DeskError> {
        self.apply(
            id,
            now,
            |event| {
                self.verifier.authority().deactivate(event);
                Ok(())
            },
            |result| {
                result
                    .is_ok()
                    .then(|| (AuditKind::CredentialDeactivated, json!({})))
            },
        )
    }

    /// Verifies a scan and admits the attendee.
    ///
    /// Credential and geofence checks run on a snapshot without holding the
    /// event lock; the remaining checks and the append run under it.
    pub fn check_in(
        &self,
        id: &EventId,
        scan: &ScanRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckInReceipt, DeskError> {
        let handle = self.handle(id)?;
        let site = Self::lock(&handle)?.site();

        let prechecked = match self.verifier.precheck(&site, scan, now) {
            Ok(prechecked) => prechecked,
            Err(rejection) => {
                self.record(
                    AuditKind::CheckInRejected,
                    id,
                    now,
                    rejected_check_in(scan, &rejection),
                )?;
                return Err(rejection.into());
            }
        };

        self.apply(
            id,
            now,
            |event| Ok(self.verifier.admit(event, scan, prechecked, now)?),
            |result| match result {
                Ok(receipt) => Some((
                    AuditKind::CheckInAccepted,
                    json!({
                        "userId": receipt.attendee.user_id,
                        "attendeeId": receipt.attendee.id,
                        "scanId": scan.scan_id,
                        "credentialId": receipt.attendee.provenance.credential_id,
                        "distanceMeters": receipt.details.distance_meters,
                        "verificationHash": receipt.attendee.provenance.verification_hash,
                    }),
                )),
                Err(DeskError::CheckIn(rejection)) => Some((
                    AuditKind::CheckInRejected,
                    rejected_check_in(scan, rejection),
                )),
                Err(_) => None,
            },
        )
    }

    /// Runs the event's draw.
    pub fn draw(&self, id: &EventId, now: DateTime<Utc>) -> Result<Vec<Winner>, DeskError> {
        self.apply(
            id,
            now,
            |event| Ok(self.engine.conduct(event, now)?),
            |result| match result {
                Ok(winners) => {
                    // claim codes stay out of the journal
                    let rows: Vec<Value> = winners
                        .iter()
                        .map(|w| {
                            json!({
                                "winnerId": w.id,
                                "userId": w.user_id,
                                "prizeId": w.prize_id,
                                "claimDeadline": w.claim_deadline,
                            })
                        })
                        .collect();
                    Some((AuditKind::DrawConducted, json!({ "winners": rows })))
                }
                Err(DeskError::Draw(e)) => Some((
                    AuditKind::DrawRejected,
                    json!({ "operation": "draw", "code": e.code() }),
                )),
                Err(_) => None,
            },
        )
    }

    /// Discards the event's draw so it can run again.
    pub fn reset_draw(&self, id: &EventId, now: DateTime<Utc>) -> Result<Vec<Winner>, DeskError> {
        self.apply(
            id,
            now,
            |event| Ok(self.engine.reset(event)?),
            |result| match result {
                Ok(discarded) => {
                    let ids: Vec<&WinnerId> = discarded.iter().map(|w| &w.id).collect();
                    Some((AuditKind::DrawReset, json!({ "discarded": ids })))
                }
                Err(DeskError::Draw(e)) => Some((
                    AuditKind::DrawRejected,
                    json!({ "operation": "reset", "code": e.code() }),
                )),
                Err(_) => None,
            },
        )
    }

    /// Redeems a winner's claim code.
    pub fn claim(
        &self,
        id: &EventId,
        winner_id: &WinnerId,
        submitted_code: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, DeskError> {
        self.apply(
            id,
            now,
            |event| Ok(claim_in_event(event, winner_id, submitted_code, now)?),
            |result| match result {
                Ok(receipt) => Some((
                    AuditKind::ClaimAccepted,
                    json!({
                        "winnerId": receipt.winner.id,
                        "userId": receipt.winner.user_id,
                        "prizeId": receipt.winner.prize_id,
                        "credit": receipt.ledger_credit().map(|c| c.amount),
                    }),
                )),
                Err(DeskError::Claim(e)) => Some((
                    AuditKind::ClaimRejected,
                    json!({ "winnerId": winner_id, "code": e.code() }),
                )),
                Err(_) => None,
            },
        )
    }

    /// Expires pending winners of one event whose deadline passed.
    pub fn sweep(&self, id: &EventId, now: DateTime<Utc>) -> Result<Vec<WinnerId>, DeskError> {
        self.apply_if(
            id,
            now,
            |event| Ok(sweep_expired(event, now)),
            |expired| !expired.is_empty(),
            |result| {
                let expired = result.as_ref().ok().filter(|ids| !ids.is_empty())?;
                Some((AuditKind::ClaimsExpired, json!({ "winners": expired })))
            },
        )
    }

    /// Sweeps every stored event. Returns only events where something expired.
    pub fn sweep_all(&self, now: DateTime<Utc>) -> Result<Vec<(EventId, Vec<WinnerId>)>, DeskError> {
        let mut swept = Vec::new();
        for id in self.store.list()? {
            let expired = self.sweep(&id, now)?;
            if !expired.is_empty() {
                swept.push((id, expired));
            }
        }
        Ok(swept)
    }
}

fn rejected_check_in(scan: &ScanRequest, rejection: &CheckInRejection) -> Value {
    json!({
        "userId": scan.identity.user_id,
        "scanId": scan.scan_id,
        "code": rejection.error.code(),
        "details": rejection.details,
    })
}
