//! Database queries for bookings
//!
//! The insert runs on the reservation transaction so the inventory decrement
//! and the booking row commit or roll back together. The cancel UPDATE is
//! status-guarded the same way negotiation transitions are.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::inventory::ReservationToken;

use super::models::Booking;

const BOOKING_COLUMNS: &str = r#"
    id, listing_id, student_id, owner_id, negotiation_id,
    monthly_rent, security_deposit, maintenance_charges, total_amount,
    move_in_date, move_out_date, duration_months,
    status, payment_status, payment_method,
    created_at, confirmed_at
"#;

/// Fetch a booking by id
pub async fn get_booking(pool: &PgPool, id: Uuid) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

/// Insert a booking inside the reservation transaction. Consumes the
/// reservation token, so the type system enforces one insert per reserved
/// unit; the token supplies the listing id the unit was taken from.
pub async fn insert_booking(
    conn: &mut PgConnection,
    b: &Booking,
    reservation: ReservationToken,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, listing_id, student_id, owner_id, negotiation_id,
            monthly_rent, security_deposit, maintenance_charges, total_amount,
            move_in_date, move_out_date, duration_months,
            status, payment_status, payment_method,
            created_at, confirmed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(b.id)
    .bind(reservation.listing_id())
    .bind(b.student_id)
    .bind(b.owner_id)
    .bind(b.negotiation_id)
    .bind(b.monthly_rent)
    .bind(b.security_deposit)
    .bind(b.maintenance_charges)
    .bind(b.total_amount)
    .bind(b.move_in_date)
    .bind(b.move_out_date)
    .bind(b.duration_months)
    .bind(&b.status)
    .bind(&b.payment_status)
    .bind(&b.payment_method)
    .bind(b.created_at)
    .bind(b.confirmed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Close a booking (cancel or reject), guarded on it still consuming
/// inventory. Returns rows affected; zero means the booking already left
/// `pending`/`confirmed`. Takes a connection so the close and the inventory
/// release share one transaction.
pub async fn close_booking(conn: &mut PgConnection, id: Uuid, terminal_status: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2
        WHERE id = $1
          AND status IN ('pending', 'confirmed')
        "#,
    )
    .bind(id)
    .bind(terminal_status)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bookings a student has made, newest first
pub async fn list_for_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE student_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// Bookings against an owner's listings, newest first
pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}
