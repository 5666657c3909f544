//! Negotiation record and state machine
//!
//! Transition decisions are pure functions on the loaded record; the
//! services layer applies the resulting `TransitionOutcome` with a
//! status-guarded UPDATE so a stale record can never overwrite a concurrent
//! transition.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::ledger::{self, PriceLedger};

/// Free-text fields (message, owner response, counter message) are clipped
/// to this many characters before persisting.
pub const MAX_MESSAGE_LEN: usize = 500;

/// Negotiation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationStatus {
    Pending,
    Countered,
    Accepted,
    Rejected,
    Withdrawn,
}

impl NegotiationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationStatus::Pending => "pending",
            NegotiationStatus::Countered => "countered",
            NegotiationStatus::Accepted => "accepted",
            NegotiationStatus::Rejected => "rejected",
            NegotiationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(NegotiationStatus::Pending),
            "countered" => Some(NegotiationStatus::Countered),
            "accepted" => Some(NegotiationStatus::Accepted),
            "rejected" => Some(NegotiationStatus::Rejected),
            "withdrawn" => Some(NegotiationStatus::Withdrawn),
            _ => None,
        }
    }

    /// Terminal statuses never mutate again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationStatus::Accepted
                | NegotiationStatus::Rejected
                | NegotiationStatus::Withdrawn
        )
    }

    /// The two statuses from which any transition is legal.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            NegotiationStatus::Pending | NegotiationStatus::Countered
        )
    }
}

/// Owner-side response to an open negotiation
#[derive(Debug, Clone)]
pub enum OwnerAction {
    Accept,
    Reject { response: Option<String> },
    Counter { amount: Decimal, message: Option<String> },
}

/// The writes a successful transition produces
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub status: NegotiationStatus,
    pub final_price: Option<Decimal>,
    pub counter_offer: Option<Decimal>,
    pub owner_response: Option<String>,
    pub counter_message: Option<String>,
    /// Set on any owner action; withdraw leaves the stored value alone.
    pub response_date: Option<DateTime<Utc>>,
    /// A counter re-arms the window; other transitions keep the old expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Negotiation record from the database
#[derive(Debug, Clone, FromRow)]
pub struct Negotiation {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub student_id: Uuid,
    pub owner_id: Uuid,
    pub original_price: Decimal,
    pub proposed_price: Decimal,
    pub counter_offer: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub status: String,
    pub message: Option<String>,
    pub owner_response: Option<String>,
    pub counter_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Negotiation {
    /// Build a fresh `pending` record for a student proposal.
    pub fn propose(
        listing_id: Uuid,
        student_id: Uuid,
        owner_id: Uuid,
        original_price: Decimal,
        proposed_price: Decimal,
        message: Option<String>,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Self> {
        let ledger = PriceLedger::open(original_price, proposed_price)?;
        Ok(Self {
            id: Uuid::new_v4(),
            listing_id,
            student_id,
            owner_id,
            original_price: ledger.original,
            proposed_price: ledger.proposed,
            counter_offer: None,
            final_price: None,
            status: NegotiationStatus::Pending.as_str().to_string(),
            message: clip_message(message),
            owner_response: None,
            counter_message: None,
            created_at: now,
            response_date: None,
            expires_at: now + window,
        })
    }

    /// Typed view of the stored status. An unrecognized value is treated as
    /// a state from which no transition is legal.
    pub fn current_status(&self) -> Result<NegotiationStatus> {
        NegotiationStatus::parse(&self.status).ok_or(AppError::InvalidState)
    }

    /// Expiry is evaluated lazily at request time, never by a sweeper.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// The price fields as a ledger view.
    pub fn ledger(&self) -> PriceLedger {
        PriceLedger {
            original: self.original_price,
            proposed: self.proposed_price,
            counter: self.counter_offer,
            final_price: self.final_price,
        }
    }

    /// Status, expiry and open-state guards shared by every mutation.
    fn ensure_open(&self, now: DateTime<Utc>) -> Result<NegotiationStatus> {
        if self.is_expired(now) {
            return Err(AppError::Expired);
        }
        let status = self.current_status()?;
        if !status.is_open() {
            return Err(AppError::InvalidState);
        }
        Ok(status)
    }

    /// Owner response: accept, reject or counter.
    pub fn respond(
        &self,
        actor_id: Uuid,
        action: &OwnerAction,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<TransitionOutcome> {
        if actor_id != self.owner_id {
            return Err(AppError::Unauthorized);
        }
        self.ensure_open(now)?;

        match action {
            OwnerAction::Accept => Ok(TransitionOutcome {
                status: NegotiationStatus::Accepted,
                final_price: Some(self.ledger().accepted_price()),
                counter_offer: self.counter_offer,
                owner_response: None,
                counter_message: None,
                response_date: Some(now),
                expires_at: None,
            }),
            OwnerAction::Reject { response } => Ok(TransitionOutcome {
                status: NegotiationStatus::Rejected,
                final_price: None,
                counter_offer: self.counter_offer,
                owner_response: clip_message(response.clone()),
                counter_message: None,
                response_date: Some(now),
                expires_at: None,
            }),
            OwnerAction::Counter { amount, message } => {
                ledger::validate_counter_offer(*amount, self.proposed_price, self.original_price)?;
                Ok(TransitionOutcome {
                    status: NegotiationStatus::Countered,
                    final_price: None,
                    counter_offer: Some(*amount),
                    owner_response: None,
                    counter_message: clip_message(message.clone()),
                    // A counter opens a fresh negotiation window
                    response_date: Some(now),
                    expires_at: Some(now + window),
                })
            }
        }
    }

    /// Student acceptance of an owner counter-offer.
    pub fn accept_counter(&self, actor_id: Uuid, now: DateTime<Utc>) -> Result<TransitionOutcome> {
        if actor_id != self.student_id {
            return Err(AppError::Unauthorized);
        }
        let status = self.ensure_open(now)?;
        if status != NegotiationStatus::Countered {
            return Err(AppError::InvalidState);
        }
        Ok(TransitionOutcome {
            status: NegotiationStatus::Accepted,
            final_price: Some(self.ledger().accepted_price()),
            counter_offer: self.counter_offer,
            owner_response: None,
            counter_message: None,
            response_date: Some(now),
            expires_at: None,
        })
    }

    /// Student withdrawal of an open negotiation.
    pub fn withdraw(&self, actor_id: Uuid, now: DateTime<Utc>) -> Result<TransitionOutcome> {
        if actor_id != self.student_id {
            return Err(AppError::Unauthorized);
        }
        self.ensure_open(now)?;
        Ok(TransitionOutcome {
            status: NegotiationStatus::Withdrawn,
            final_price: None,
            counter_offer: self.counter_offer,
            owner_response: None,
            counter_message: None,
            response_date: None,
            expires_at: None,
        })
    }

    /// Deletion is allowed only once terminal or expired.
    pub fn ensure_deletable(&self, now: DateTime<Utc>) -> Result<()> {
        let status = self.current_status()?;
        if status.is_terminal() || self.is_expired(now) {
            Ok(())
        } else {
            Err(AppError::ActiveNegotiation)
        }
    }

    /// The record as it reads after a transition has been applied.
    pub fn with_outcome(mut self, outcome: TransitionOutcome) -> Self {
        self.status = outcome.status.as_str().to_string();
        self.final_price = outcome.final_price;
        self.counter_offer = outcome.counter_offer;
        if outcome.owner_response.is_some() {
            self.owner_response = outcome.owner_response;
        }
        if outcome.counter_message.is_some() {
            self.counter_message = outcome.counter_message;
        }
        if outcome.response_date.is_some() {
            self.response_date = outcome.response_date;
        }
        if let Some(expires_at) = outcome.expires_at {
            self.expires_at = expires_at;
        }
        self
    }
}

/// Clip free text to the persisted bound.
pub fn clip_message(text: Option<String>) -> Option<String> {
    text.map(|t| {
        if t.chars().count() > MAX_MESSAGE_LEN {
            t.chars().take(MAX_MESSAGE_LEN).collect()
        } else {
            t
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture(now: DateTime<Utc>) -> Negotiation {
        Negotiation::propose(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(12000),
            dec!(9000),
            Some("willing to sign for a year".to_string()),
            now,
            Duration::days(3),
        )
        .unwrap()
    }

    #[test]
    fn test_propose_starts_pending_with_window() {
        let now = Utc::now();
        let n = fixture(now);
        assert_eq!(n.current_status().unwrap(), NegotiationStatus::Pending);
        assert_eq!(n.expires_at, now + Duration::days(3));
        assert!(n.final_price.is_none());
        assert!(n.response_date.is_none());
    }

    #[test]
    fn test_propose_rejects_price_at_or_above_listing() {
        let now = Utc::now();
        let err = Negotiation::propose(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(12000),
            dec!(12000),
            None,
            now,
            Duration::days(3),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidPrice));
    }

    #[test]
    fn test_accept_settles_on_proposed_price() {
        let now = Utc::now();
        let n = fixture(now);
        let outcome = n
            .respond(n.owner_id, &OwnerAction::Accept, now, Duration::days(3))
            .unwrap();
        assert_eq!(outcome.status, NegotiationStatus::Accepted);
        assert_eq!(outcome.final_price, Some(dec!(9000)));
        assert_eq!(outcome.response_date, Some(now));
    }

    #[test]
    fn test_respond_requires_owner() {
        let now = Utc::now();
        let n = fixture(now);
        let err = n
            .respond(n.student_id, &OwnerAction::Accept, now, Duration::days(3))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn test_counter_rearms_expiry() {
        let now = Utc::now();
        let n = fixture(now);
        let later = now + Duration::days(2);
        let outcome = n
            .respond(
                n.owner_id,
                &OwnerAction::Counter {
                    amount: dec!(10500),
                    message: None,
                },
                later,
                Duration::days(3),
            )
            .unwrap();
        assert_eq!(outcome.status, NegotiationStatus::Countered);
        assert_eq!(outcome.counter_offer, Some(dec!(10500)));
        assert_eq!(outcome.expires_at, Some(later + Duration::days(3)));
    }

    #[test]
    fn test_counter_outside_band_fails() {
        let now = Utc::now();
        let n = fixture(now);
        for bad in [dec!(8999), dec!(12001)] {
            let err = n
                .respond(
                    n.owner_id,
                    &OwnerAction::Counter {
                        amount: bad,
                        message: None,
                    },
                    now,
                    Duration::days(3),
                )
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidCounter));
        }
    }

    #[test]
    fn test_expired_negotiation_rejects_every_action() {
        let now = Utc::now();
        let n = fixture(now);
        let after_expiry = now + Duration::days(4);

        // Stored status still reads pending; expiry wins regardless.
        assert!(matches!(
            n.respond(n.owner_id, &OwnerAction::Accept, after_expiry, Duration::days(3)),
            Err(AppError::Expired)
        ));
        assert!(matches!(
            n.withdraw(n.student_id, after_expiry),
            Err(AppError::Expired)
        ));
        assert!(matches!(
            n.accept_counter(n.student_id, after_expiry),
            Err(AppError::Expired)
        ));
    }

    #[test]
    fn test_accept_is_idempotent_in_effect() {
        let now = Utc::now();
        let n = fixture(now);
        let outcome = n
            .respond(n.owner_id, &OwnerAction::Accept, now, Duration::days(3))
            .unwrap();
        let accepted = n.with_outcome(outcome);
        assert_eq!(accepted.final_price, Some(dec!(9000)));

        // Second accept is no longer a legal transition; final_price stands.
        let err = accepted
            .respond(accepted.owner_id, &OwnerAction::Accept, now, Duration::days(3))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState));
        assert_eq!(accepted.final_price, Some(dec!(9000)));
    }

    #[test]
    fn test_terminal_statuses_never_mutate() {
        let now = Utc::now();
        for terminal in [
            NegotiationStatus::Rejected,
            NegotiationStatus::Withdrawn,
            NegotiationStatus::Accepted,
        ] {
            let mut n = fixture(now);
            n.status = terminal.as_str().to_string();
            assert!(matches!(
                n.withdraw(n.student_id, now),
                Err(AppError::InvalidState)
            ));
            assert!(matches!(
                n.respond(n.owner_id, &OwnerAction::Accept, now, Duration::days(3)),
                Err(AppError::InvalidState)
            ));
        }
    }

    #[test]
    fn test_withdraw_requires_student() {
        let now = Utc::now();
        let n = fixture(now);
        assert!(matches!(
            n.withdraw(n.owner_id, now),
            Err(AppError::Unauthorized)
        ));
        let outcome = n.withdraw(n.student_id, now).unwrap();
        assert_eq!(outcome.status, NegotiationStatus::Withdrawn);
        // Withdraw is a student action; response_date stays untouched.
        assert!(outcome.response_date.is_none());
    }

    #[test]
    fn test_accept_counter_requires_countered_state() {
        let now = Utc::now();
        let n = fixture(now);
        // Still pending: nothing to accept yet.
        assert!(matches!(
            n.accept_counter(n.student_id, now),
            Err(AppError::InvalidState)
        ));
    }

    #[test]
    fn test_scenario_student_accepts_counter() {
        // Student proposes 9000 against a 12000 listing, owner counters
        // 10500, student accepts the counter.
        let now = Utc::now();
        let n = fixture(now);

        let countered = n.clone().with_outcome(
            n.respond(
                n.owner_id,
                &OwnerAction::Counter {
                    amount: dec!(10500),
                    message: Some("best I can do".to_string()),
                },
                now,
                Duration::days(3),
            )
            .unwrap(),
        );
        assert_eq!(
            countered.current_status().unwrap(),
            NegotiationStatus::Countered
        );

        let accepted = countered.clone().with_outcome(
            countered
                .accept_counter(countered.student_id, now + Duration::days(1))
                .unwrap(),
        );
        assert_eq!(
            accepted.current_status().unwrap(),
            NegotiationStatus::Accepted
        );
        assert_eq!(accepted.final_price, Some(dec!(10500)));
    }

    #[test]
    fn test_accept_counter_rejects_other_students() {
        let now = Utc::now();
        let n = fixture(now);
        let countered = n.clone().with_outcome(
            n.respond(
                n.owner_id,
                &OwnerAction::Counter {
                    amount: dec!(10000),
                    message: None,
                },
                now,
                Duration::days(3),
            )
            .unwrap(),
        );
        assert!(matches!(
            countered.accept_counter(Uuid::new_v4(), now),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_deletable_only_when_terminal_or_expired() {
        let now = Utc::now();
        let n = fixture(now);
        assert!(matches!(
            n.ensure_deletable(now),
            Err(AppError::ActiveNegotiation)
        ));
        // Expired but still pending: deletable.
        assert!(n.ensure_deletable(now + Duration::days(4)).is_ok());

        let mut rejected = fixture(now);
        rejected.status = NegotiationStatus::Rejected.as_str().to_string();
        assert!(rejected.ensure_deletable(now).is_ok());
    }

    #[test]
    fn test_reject_stores_owner_response() {
        let now = Utc::now();
        let n = fixture(now);
        let outcome = n
            .respond(
                n.owner_id,
                &OwnerAction::Reject {
                    response: Some("room already promised".to_string()),
                },
                now,
                Duration::days(3),
            )
            .unwrap();
        assert_eq!(outcome.status, NegotiationStatus::Rejected);
        assert_eq!(
            outcome.owner_response.as_deref(),
            Some("room already promised")
        );
        assert!(outcome.final_price.is_none());
    }

    #[test]
    fn test_clip_message_bounds_length() {
        let long = "x".repeat(MAX_MESSAGE_LEN + 100);
        let clipped = clip_message(Some(long)).unwrap();
        assert_eq!(clipped.chars().count(), MAX_MESSAGE_LEN);
        assert_eq!(clip_message(None), None);
    }

    #[test]
    fn test_unknown_stored_status_is_not_transitionable() {
        let now = Utc::now();
        let mut n = fixture(now);
        n.status = "garbled".to_string();
        assert!(matches!(
            n.respond(n.owner_id, &OwnerAction::Accept, now, Duration::days(3)),
            Err(AppError::InvalidState)
        ));
    }
}
