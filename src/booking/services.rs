//! Booking reconciler
//!
//! Turns a listing (or an accepted negotiation on it) into a pending
//! booking. The inventory reservation, the booking insert and nothing else
//! share one transaction: every validation failure rolls back with no
//! inventory consumed.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::inventory;
use crate::negotiation::{self, NegotiationStatus};
use crate::notify::{NotificationKind, Notifier};

use super::models::{self, Booking, BookingStatus, PaymentStatus};
use super::queries;
use super::requests::CreateBookingRequest;

/// Create a booking for a student, consuming exactly one inventory unit.
pub async fn create_from_listing(
    pool: &PgPool,
    notifier: &Notifier,
    student_id: Uuid,
    req: CreateBookingRequest,
) -> Result<Booking> {
    let now = Utc::now();
    models::validate_booking_window(req.move_in_date, req.duration_months, now.date_naive())?;

    let listing = inventory::queries::get_listing(pool, req.listing_id)
        .await?
        .ok_or(AppError::ListingNotFound)?;

    // An accepted negotiation overrides the listing price with its
    // settled final price.
    let (monthly_rent, negotiation_id) = match req.negotiation_id {
        Some(negotiation_id) => {
            let n = negotiation::queries::get_negotiation(pool, negotiation_id)
                .await?
                .ok_or(AppError::NegotiationNotFound)?;
            if n.student_id != student_id {
                return Err(AppError::NegotiationNotOwned);
            }
            if n.listing_id != req.listing_id {
                return Err(AppError::NegotiationRoomMismatch);
            }
            if n.current_status().ok() != Some(NegotiationStatus::Accepted) {
                return Err(AppError::NegotiationNotAccepted);
            }
            let final_price = n.final_price.ok_or(AppError::NegotiationNotAccepted)?;
            (final_price, Some(negotiation_id))
        }
        None => (listing.monthly_rent, None),
    };

    let move_out_date = models::compute_move_out(req.move_in_date, req.duration_months)?;
    let total_amount = models::compute_total(
        monthly_rent,
        listing.security_deposit,
        listing.maintenance_charges,
    );

    let booking = Booking {
        id: Uuid::new_v4(),
        listing_id: listing.id,
        student_id,
        owner_id: listing.owner_id,
        negotiation_id,
        monthly_rent,
        security_deposit: listing.security_deposit,
        maintenance_charges: listing.maintenance_charges,
        total_amount,
        move_in_date: req.move_in_date,
        move_out_date,
        duration_months: req.duration_months,
        status: BookingStatus::Pending.as_str().to_string(),
        payment_status: PaymentStatus::Pending.as_str().to_string(),
        payment_method: None,
        created_at: now,
        confirmed_at: None,
    };

    // Reservation and insert commit together or not at all; the insert
    // consumes the reservation token.
    let mut tx = pool.begin().await?;
    let reservation = inventory::services::reserve(&mut tx, listing.id, student_id).await?;
    queries::insert_booking(&mut tx, &booking, reservation).await?;
    tx.commit().await?;

    info!(
        booking_id = %booking.id,
        listing_id = %booking.listing_id,
        rent = %booking.monthly_rent,
        "Booking created"
    );

    notifier.notify(
        booking.owner_id,
        NotificationKind::BookingCreated,
        serde_json::json!({
            "booking_id": booking.id,
            "listing_id": booking.listing_id,
            "move_in_date": booking.move_in_date,
            "total_amount": booking.total_amount.to_string(),
        }),
    );

    Ok(booking)
}

/// Student cancels their booking. Terminal; releases the inventory unit.
pub async fn cancel(
    pool: &PgPool,
    notifier: &Notifier,
    booking_id: Uuid,
    actor_id: Uuid,
) -> Result<Booking> {
    close(pool, notifier, booking_id, actor_id, BookingStatus::Cancelled).await
}

/// Owner rejects a booking against their listing. Terminal; releases the
/// inventory unit.
pub async fn reject(
    pool: &PgPool,
    notifier: &Notifier,
    booking_id: Uuid,
    actor_id: Uuid,
) -> Result<Booking> {
    close(pool, notifier, booking_id, actor_id, BookingStatus::Rejected).await
}

async fn close(
    pool: &PgPool,
    notifier: &Notifier,
    booking_id: Uuid,
    actor_id: Uuid,
    terminal: BookingStatus,
) -> Result<Booking> {
    let booking = queries::get_booking(pool, booking_id)
        .await?
        .ok_or(AppError::BookingNotFound)?;

    let authorized = match terminal {
        BookingStatus::Cancelled => actor_id == booking.student_id,
        BookingStatus::Rejected => actor_id == booking.owner_id,
        _ => false,
    };
    if !authorized {
        return Err(AppError::Unauthorized);
    }

    // The terminal status and the freed inventory unit commit together:
    // neither a closed booking holding its unit nor a freed unit on a
    // still-open booking can be observed.
    let mut tx = pool.begin().await?;
    let rows = queries::close_booking(&mut tx, booking_id, terminal.as_str()).await?;
    if rows == 0 {
        // Already closed, or past the point where closing is legal.
        return Err(AppError::InvalidState);
    }
    inventory::services::release(&mut tx, booking.listing_id).await?;
    tx.commit().await?;

    info!(
        booking_id = %booking.id,
        status = terminal.as_str(),
        "Booking closed"
    );

    let (recipient, kind) = close_notification(&booking, terminal);
    notifier.notify(
        recipient,
        kind,
        serde_json::json!({
            "booking_id": booking.id,
            "status": terminal.as_str(),
        }),
    );

    let mut closed = booking;
    closed.status = terminal.as_str().to_string();
    Ok(closed)
}

/// A cancellation tells the owner; a rejection tells the student, under its
/// own event kind so delivery can word the two differently.
fn close_notification(booking: &Booking, terminal: BookingStatus) -> (Uuid, NotificationKind) {
    match terminal {
        BookingStatus::Cancelled => (booking.owner_id, NotificationKind::BookingCancelled),
        _ => (booking.student_id, NotificationKind::BookingRejected),
    }
}

/// Fetch one booking.
pub async fn get(pool: &PgPool, booking_id: Uuid) -> Result<Booking> {
    queries::get_booking(pool, booking_id)
        .await?
        .ok_or(AppError::BookingNotFound)
}

/// Bookings a student has made.
pub async fn list_for_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<Booking>> {
    queries::list_for_student(pool, student_id).await
}

/// Bookings against an owner's listings.
pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Booking>> {
    queries::list_for_owner(pool, owner_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
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
            status: BookingStatus::Pending.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            payment_method: None,
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    #[test]
    fn test_cancellation_notifies_the_owner() {
        let booking = booking_fixture();
        let (recipient, kind) = close_notification(&booking, BookingStatus::Cancelled);
        assert_eq!(recipient, booking.owner_id);
        assert_eq!(kind, NotificationKind::BookingCancelled);
    }

    #[test]
    fn test_rejection_notifies_the_student_with_its_own_kind() {
        let booking = booking_fixture();
        let (recipient, kind) = close_notification(&booking, BookingStatus::Rejected);
        assert_eq!(recipient, booking.student_id);
        assert_eq!(kind, NotificationKind::BookingRejected);
    }
}
