//! Prize draw.
//!
//! Prizes are processed in declaration order. For each active prize the engine
//! picks `min(quantity, pool)` distinct attendees uniformly at random from the
//! current pool. Without `allow_multiple_wins` every winner leaves the pool for
//! the remaining prizes.
//!
//! All randomness comes from a [`CryptoRng`]. The default entry point uses
//! `rand::thread_rng()`, a per-thread ChaCha generator seeded from the OS, so
//! concurrent draws on different events never share generator state.

use chrono::{DateTime, Duration, Utc};
use rand::seq::index;
use rand::{CryptoRng, Rng, RngCore};
use rollcall_canonical::{AttendeeId, UserId, WinnerId};
use std::collections::HashSet;

use crate::errors::DrawError;
use crate::model::{ClaimCode, ClaimStatus, Event, Winner};
use crate::settings::{Settings, MAX_CLAIM_CODE_LENGTH, MIN_CLAIM_CODE_LENGTH};

const CLAIM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws winners and issues claim codes.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    claim_window: Duration,
    code_length: usize,
}

impl Default for DrawEngine {
    fn default() -> Self {
        Self::new(Duration::days(7), MIN_CLAIM_CODE_LENGTH)
    }
}

impl DrawEngine {
    /// Creates an engine. `code_length` is clamped to `8..=32`.
    pub fn new(claim_window: Duration, code_length: usize) -> Self {
        Self {
            claim_window,
            code_length: code_length.clamp(MIN_CLAIM_CODE_LENGTH, MAX_CLAIM_CODE_LENGTH),
        }
    }

    /// Creates an engine from host settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.claim_window(), settings.claim_code_length)
    }

    /// Runs the event's draw once, using the thread-local CSPRNG.
    pub fn conduct(&self, event: &mut Event, now: DateTime<Utc>) -> Result<Vec<Winner>, DrawError> {
        self.conduct_with_rng(event, now, &mut rand::thread_rng())
    }

    /// Runs the event's draw once with the supplied generator.
    ///
    /// Winners are returned grouped by prize in processing order and are also
    /// appended to `event.winners`. The event is left untouched on error.
    pub fn conduct_with_rng<R: RngCore + CryptoRng>(
        &self,
        event: &mut Event,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<Winner>, DrawError> {
        if event.drawn_at.is_some() {
            return Err(DrawError::AlreadyDrawn);
        }
        let mut pool: Vec<(AttendeeId, UserId)> = event
            .eligible_attendees()
            .map(|a| (a.id.clone(), a.user_id.clone()))
            .collect();
        if pool.is_empty() {
            return Err(DrawError::NoEligibleAttendees);
        }
        if event.active_prizes().next().is_none() {
            return Err(DrawError::NoActivePrizes);
        }

        let mut outstanding: HashSet<String> = event
            .winners
            .iter()
            .filter(|w| w.claim_status == ClaimStatus::Pending)
            .map(|w| w.claim_code.as_str().to_string())
            .collect();
        let remove_winners = !event.draw_settings.allow_multiple_wins;
        let claim_deadline = now
            .checked_add_signed(self.claim_window)
            .ok_or(DrawError::DeadlineOutOfRange)?;
        let mut winners = Vec::new();

        for prize in event.active_prizes() {
            if pool.is_empty() {
                break;
            }
            let take = (prize.quantity as usize).min(pool.len());
            let mut picked: Vec<usize> = index::sample(rng, pool.len(), take).into_vec();

            for &slot in &picked {
                let (attendee_id, user_id) = &pool[slot];
                winners.push(Winner {
                    id: WinnerId::generate(),
                    attendee_id: attendee_id.clone(),
                    user_id: user_id.clone(),
                    prize_id: prize.id.clone(),
                    prize_title: prize.title.clone(),
                    prize_type: prize.prize_type,
                    prize_value: prize.value,
                    selected_at: now,
                    claim_status: ClaimStatus::Pending,
                    claim_code: self.fresh_code(rng, &mut outstanding),
                    claim_deadline,
                    claimed_at: None,
                });
            }

            if remove_winners {
                // remove from the back so earlier indices stay valid
                picked.sort_unstable_by(|a, b| b.cmp(a));
                for slot in picked {
                    pool.swap_remove(slot);
                }
            }
        }

        event.winners.extend(winners.iter().cloned());
        event.drawn_at = Some(now);
        Ok(winners)
    }

    /// Discards the draw so it can run again. Refused once any prize was claimed.
    pub fn reset(&self, event: &mut Event) -> Result<Vec<Winner>, DrawError> {
        if event
            .winners
            .iter()
            .any(|w| w.claim_status == ClaimStatus::Claimed)
        {
            return Err(DrawError::ClaimsRecorded);
        }
        event.drawn_at = None;
        Ok(std::mem::take(&mut event.winners))
    }

    fn fresh_code<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        outstanding: &mut HashSet<String>,
    ) -> ClaimCode {
        loop {
            let code: String = (0..self.code_length)
                .map(|_| CLAIM_CODE_ALPHABET[rng.gen_range(0..CLAIM_CODE_ALPHABET.len())] as char)
                .collect();
            if outstanding.insert(code.clone()) {
                return ClaimCode::new(code);
            }
        }
    }
}
