//! Database queries for payment confirmation
//!
//! The booking confirmation is a guarded UPDATE that only fires from
//! `pending`, which is what makes webhook replays safe.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;

use super::models::PaymentTransaction;

/// Insert a freshly created gateway order
pub async fn insert_transaction(pool: &PgPool, t: &PaymentTransaction) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_transactions (
            id, booking_id, order_id, payment_id, amount, status,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(t.id)
    .bind(t.booking_id)
    .bind(&t.order_id)
    .bind(&t.payment_id)
    .bind(t.amount)
    .bind(&t.status)
    .bind(t.created_at)
    .bind(t.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up the transaction for a gateway order id
pub async fn get_transaction_by_order(
    pool: &PgPool,
    order_id: &str,
) -> Result<Option<PaymentTransaction>> {
    let transaction = sqlx::query_as::<_, PaymentTransaction>(
        r#"
        SELECT id, booking_id, order_id, payment_id, amount, status,
               created_at, updated_at
        FROM payment_transactions
        WHERE order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(transaction)
}

/// Record the gateway outcome on the transaction row. Takes a connection so
/// the mark can share a transaction with the booking confirmation.
pub async fn set_transaction_status(
    conn: &mut PgConnection,
    order_id: &str,
    payment_id: Option<&str>,
    status: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE payment_transactions
        SET status = $2,
            payment_id = COALESCE($3, payment_id),
            updated_at = $4
        WHERE order_id = $1
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(payment_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Advance a pending booking to confirmed/paid. Zero rows affected means
/// the booking already left `pending` and the confirmation is a no-op.
pub async fn confirm_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = 'confirmed',
            payment_status = 'paid',
            payment_method = 'online',
            confirmed_at = $2
        WHERE id = $1
          AND status = 'pending'
        "#,
    )
    .bind(booking_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
