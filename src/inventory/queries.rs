//! Database queries for listing inventory
//!
//! The decrement is a conditional UPDATE (`WHERE available_rooms > 0`), so
//! two requests racing for the last unit serialize at the row and the loser
//! affects zero rows. Queries that must join a reservation transaction take
//! a `PgConnection` so callers can pass the open transaction in.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;

use super::models::ListingAvailability;

const LISTING_COLUMNS: &str = r#"
    id, owner_id, monthly_rent, security_deposit, maintenance_charges,
    available_rooms, total_rooms, is_available
"#;

/// Fetch a listing's availability and price snapshot
pub async fn get_listing(pool: &PgPool, listing_id: Uuid) -> Result<Option<ListingAvailability>> {
    let listing = sqlx::query_as::<_, ListingAvailability>(&format!(
        r#"
        SELECT {LISTING_COLUMNS}
        FROM listings
        WHERE id = $1
        "#
    ))
    .bind(listing_id)
    .fetch_optional(pool)
    .await?;

    Ok(listing)
}

/// Re-read the current room count inside the reservation transaction
pub async fn get_available_rooms(
    conn: &mut PgConnection,
    listing_id: Uuid,
) -> Result<Option<i32>> {
    let rooms: Option<i32> =
        sqlx::query_scalar("SELECT available_rooms FROM listings WHERE id = $1")
            .bind(listing_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(rooms)
}

/// Find a booking that blocks this student from booking again.
/// Mirrors `Booking::blocks_new_booking` in SQL.
pub async fn find_active_booking_id(
    conn: &mut PgConnection,
    student_id: Uuid,
    today: NaiveDate,
) -> Result<Option<Uuid>> {
    let booking_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM bookings
        WHERE student_id = $1
          AND status IN ('pending', 'confirmed', 'active')
          AND move_out_date > $2
          AND payment_status <> 'failed'
        LIMIT 1
        "#,
    )
    .bind(student_id)
    .bind(today)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(booking_id)
}

/// Conditionally take one unit. Zero rows affected means the last unit went
/// to a concurrent request; the counter never goes negative.
pub async fn decrement_available(conn: &mut PgConnection, listing_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE listings
        SET available_rooms = available_rooms - 1,
            is_available = available_rooms - 1 > 0
        WHERE id = $1
          AND available_rooms > 0
        "#,
    )
    .bind(listing_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Return one unit, capped at the listing's configured total. Takes a
/// connection so the release can join the booking-closing transaction.
pub async fn increment_available(conn: &mut PgConnection, listing_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE listings
        SET available_rooms = LEAST(available_rooms + 1, total_rooms),
            is_available = TRUE
        WHERE id = $1
        "#,
    )
    .bind(listing_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
