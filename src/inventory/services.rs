//! Inventory guard
//!
//! Serializes the availability decrement and the one-active-booking check so
//! concurrent booking attempts cannot both take the last unit or double-book
//! one student. All three steps run on the caller's transaction; any failure
//! rolls the whole reservation back.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::models::{ListingAvailability, ReservationToken};
use super::queries;

/// Reserve one unit for a booking the caller is about to insert.
///
/// Within the caller's transaction: re-reads availability, checks the
/// student's active-booking constraint, then conditionally decrements the
/// counter. The returned token is consumed by exactly one booking insert.
pub async fn reserve(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: Uuid,
    student_id: Uuid,
) -> Result<ReservationToken> {
    let available = queries::get_available_rooms(&mut *tx, listing_id)
        .await?
        .ok_or(AppError::ListingNotFound)?;
    if available <= 0 {
        return Err(AppError::RoomUnavailable);
    }

    let today = Utc::now().date_naive();
    if let Some(conflicting_booking) =
        queries::find_active_booking_id(&mut *tx, student_id, today).await?
    {
        return Err(AppError::ActiveBookingExists {
            conflicting_booking,
        });
    }

    let rows = queries::decrement_available(&mut *tx, listing_id).await?;
    if rows == 0 {
        // Lost the race for the last unit after our read.
        return Err(AppError::RoomUnavailable);
    }

    info!(listing_id = %listing_id, "Inventory unit reserved");
    Ok(ReservationToken::new(listing_id))
}

/// Return a unit consumed by a booking that was cancelled or rejected.
/// Runs on the caller's transaction so the booking's terminal status and
/// the freed unit commit together.
pub async fn release(tx: &mut Transaction<'_, Postgres>, listing_id: Uuid) -> Result<()> {
    let rows = queries::increment_available(&mut *tx, listing_id).await?;
    if rows == 0 {
        return Err(AppError::ListingNotFound);
    }

    info!(listing_id = %listing_id, "Inventory unit released");
    Ok(())
}

/// Availability snapshot for handlers.
pub async fn availability(pool: &PgPool, listing_id: Uuid) -> Result<ListingAvailability> {
    queries::get_listing(pool, listing_id)
        .await?
        .ok_or(AppError::ListingNotFound)
}
