//! Payment confirmation gate
//!
//! Verifies the gateway signature and, only then, advances the booking from
//! `pending` to `confirmed`/`paid`. The pending-only guard makes webhook
//! replays idempotent: a second valid confirmation changes nothing and
//! emits no second notification. A signature failure marks the transaction
//! `failed` and never touches the booking.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking;
use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::notify::{NotificationKind, Notifier};

use super::models::{PaymentTransaction, TransactionStatus};
use super::queries;
use super::requests::ConfirmPaymentRequest;
use super::signature;

/// Outcome of a confirmation call
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub booking_id: Uuid,
    pub status: String,
    /// True when the booking had already been confirmed (replayed webhook).
    pub already_confirmed: bool,
}

/// Record a gateway order opened for a booking. The amount snapshots the
/// booking total at order time.
pub async fn record_order(
    pool: &PgPool,
    booking_id: Uuid,
    order_id: String,
) -> Result<PaymentTransaction> {
    let booking = booking::services::get(pool, booking_id).await?;
    let now = Utc::now();

    let transaction = PaymentTransaction {
        id: Uuid::new_v4(),
        booking_id,
        order_id,
        payment_id: None,
        amount: booking.total_amount,
        status: TransactionStatus::Created.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };
    queries::insert_transaction(pool, &transaction).await?;

    info!(
        booking_id = %booking_id,
        order_id = %transaction.order_id,
        amount = %transaction.amount,
        "Payment order recorded"
    );
    Ok(transaction)
}

/// Verify a gateway confirmation and advance the booking.
pub async fn confirm(
    pool: &PgPool,
    notifier: &Notifier,
    cfg: &EngineConfig,
    req: ConfirmPaymentRequest,
) -> Result<PaymentConfirmation> {
    let now = Utc::now();

    if let Err(e) = signature::verify(
        &req.order_id,
        &req.payment_id,
        &req.signature,
        &cfg.payment_secret,
    ) {
        warn!(order_id = %req.order_id, "Payment signature verification failed");
        // Record the failure; the booking stays untouched.
        let mut conn = pool.acquire().await?;
        queries::set_transaction_status(
            &mut conn,
            &req.order_id,
            Some(&req.payment_id),
            TransactionStatus::Failed.as_str(),
            now,
        )
        .await?;
        return Err(e);
    }

    let booking_id = match req.booking_id {
        Some(id) => id,
        None => {
            queries::get_transaction_by_order(pool, &req.order_id)
                .await?
                .ok_or(AppError::BookingNotFound)?
                .booking_id
        }
    };

    // The booking confirmation and the transaction mark commit together; a
    // crash between the two cannot leave a confirmed booking whose
    // transaction row is still `created`.
    let mut tx = pool.begin().await?;
    let rows = queries::confirm_booking(&mut tx, booking_id, now).await?;
    let effect = ConfirmationEffect::from_rows(rows);
    if effect == ConfirmationEffect::Replayed {
        // Already confirmed (or cancelled): replay-safe no-op, no second
        // notification, no double count.
        drop(tx);
        let existing = booking::services::get(pool, booking_id).await?;
        info!(
            booking_id = %booking_id,
            status = %existing.status,
            "Payment confirmation replayed; booking unchanged"
        );
        return Ok(PaymentConfirmation {
            booking_id,
            status: existing.status,
            already_confirmed: true,
        });
    }

    queries::set_transaction_status(
        &mut tx,
        &req.order_id,
        Some(&req.payment_id),
        TransactionStatus::Paid.as_str(),
        now,
    )
    .await?;
    tx.commit().await?;

    let booking = booking::services::get(pool, booking_id).await?;

    info!(
        booking_id = %booking_id,
        order_id = %req.order_id,
        "Booking confirmed by payment"
    );

    let payload = serde_json::json!({
        "booking_id": booking_id,
        "order_id": req.order_id,
    });
    for recipient in confirmation_notifications(&booking, effect) {
        notifier.notify(recipient, NotificationKind::PaymentConfirmed, payload.clone());
    }

    Ok(PaymentConfirmation {
        booking_id,
        status: booking.status,
        already_confirmed: false,
    })
}

/// Whether the pending-only confirmation guard fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmationEffect {
    Confirmed,
    Replayed,
}

impl ConfirmationEffect {
    fn from_rows(rows_affected: u64) -> Self {
        if rows_affected == 0 {
            Self::Replayed
        } else {
            Self::Confirmed
        }
    }
}

/// Recipients of the confirmed-payment event. A replayed confirmation
/// notifies no one, so a retried webhook cannot double-notify.
fn confirmation_notifications(
    booking: &booking::models::Booking,
    effect: ConfirmationEffect,
) -> Vec<Uuid> {
    match effect {
        ConfirmationEffect::Replayed => Vec::new(),
        ConfirmationEffect::Confirmed => vec![booking.student_id, booking.owner_id],
    }
}

/// Expected booking total for an order, for handlers that display it.
pub async fn order_amount(pool: &PgPool, order_id: &str) -> Result<Decimal> {
    let transaction = queries::get_transaction_by_order(pool, order_id)
        .await?
        .ok_or(AppError::BookingNotFound)?;
    Ok(transaction.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::models::{Booking, BookingStatus, PaymentStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn booking_fixture() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            negotiation_id: None,
            monthly_rent: dec!(10000),
            security_deposit: dec!(5000),
            maintenance_charges: dec!(500),
            total_amount: dec!(15500),
            move_in_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            move_out_date: NaiveDate::from_ymd_opt(2027, 9, 1).unwrap(),
            duration_months: 12,
            status: BookingStatus::Confirmed.as_str().to_string(),
            payment_status: PaymentStatus::Paid.as_str().to_string(),
            payment_method: Some("online".to_string()),
            created_at: Utc::now(),
            confirmed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_guard_misfire_is_a_replay() {
        assert_eq!(
            ConfirmationEffect::from_rows(0),
            ConfirmationEffect::Replayed
        );
        assert_eq!(
            ConfirmationEffect::from_rows(1),
            ConfirmationEffect::Confirmed
        );
    }

    #[test]
    fn test_first_confirmation_notifies_both_parties_once() {
        let booking = booking_fixture();
        let recipients = confirmation_notifications(&booking, ConfirmationEffect::Confirmed);
        assert_eq!(recipients, vec![booking.student_id, booking.owner_id]);
    }

    #[test]
    fn test_replayed_confirmation_emits_no_notification() {
        let booking = booking_fixture();
        let recipients = confirmation_notifications(&booking, ConfirmationEffect::Replayed);
        assert!(recipients.is_empty());

        // Drive the emission loop over the empty set: the channel stays dry.
        let (notifier, mut rx) = Notifier::channel();
        for recipient in recipients {
            notifier.notify(
                recipient,
                NotificationKind::PaymentConfirmed,
                serde_json::json!({}),
            );
        }
        assert!(rx.try_recv().is_err());
    }
}
