//! Database queries for negotiations
//!
//! Mutations are status-guarded: the UPDATE only matches rows still in an
//! open status, so a transition raced by another request affects zero rows
//! and surfaces as `InvalidState` in the service layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

use super::models::{Negotiation, TransitionOutcome};

const NEGOTIATION_COLUMNS: &str = r#"
    id, listing_id, student_id, owner_id,
    original_price, proposed_price, counter_offer, final_price,
    status, message, owner_response, counter_message,
    created_at, response_date, expires_at
"#;

/// Fetch a negotiation by id
pub async fn get_negotiation(pool: &PgPool, id: Uuid) -> Result<Option<Negotiation>> {
    let negotiation = sqlx::query_as::<_, Negotiation>(&format!(
        r#"
        SELECT {NEGOTIATION_COLUMNS}
        FROM negotiations
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(negotiation)
}

/// Find a live negotiation (open status, unexpired) for a student on a
/// listing. Used to disallow a second concurrent proposal.
pub async fn find_open_negotiation(
    pool: &PgPool,
    student_id: Uuid,
    listing_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Negotiation>> {
    let negotiation = sqlx::query_as::<_, Negotiation>(&format!(
        r#"
        SELECT {NEGOTIATION_COLUMNS}
        FROM negotiations
        WHERE student_id = $1
          AND listing_id = $2
          AND status IN ('pending', 'countered')
          AND expires_at > $3
        LIMIT 1
        "#
    ))
    .bind(student_id)
    .bind(listing_id)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(negotiation)
}

/// Clear a student's expired open negotiation on a listing. The partial
/// unique index only frees the slot on delete or terminal transition, so a
/// fresh proposal sweeps the stale record first.
pub async fn purge_expired_open(
    pool: &PgPool,
    student_id: Uuid,
    listing_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM negotiations
        WHERE student_id = $1
          AND listing_id = $2
          AND status IN ('pending', 'countered')
          AND expires_at <= $3
        "#,
    )
    .bind(student_id)
    .bind(listing_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Insert a freshly proposed negotiation
pub async fn insert_negotiation(pool: &PgPool, n: &Negotiation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO negotiations (
            id, listing_id, student_id, owner_id,
            original_price, proposed_price, counter_offer, final_price,
            status, message, owner_response, counter_message,
            created_at, response_date, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(n.id)
    .bind(n.listing_id)
    .bind(n.student_id)
    .bind(n.owner_id)
    .bind(n.original_price)
    .bind(n.proposed_price)
    .bind(n.counter_offer)
    .bind(n.final_price)
    .bind(&n.status)
    .bind(&n.message)
    .bind(&n.owner_response)
    .bind(&n.counter_message)
    .bind(n.created_at)
    .bind(n.response_date)
    .bind(n.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Apply a transition outcome, guarded on the record still being open.
/// Returns the number of rows affected; zero means the state moved under us.
pub async fn apply_transition(
    pool: &PgPool,
    id: Uuid,
    outcome: &TransitionOutcome,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE negotiations
        SET status = $2,
            final_price = $3,
            counter_offer = $4,
            owner_response = COALESCE($5, owner_response),
            counter_message = COALESCE($6, counter_message),
            response_date = COALESCE($7, response_date),
            expires_at = COALESCE($8, expires_at)
        WHERE id = $1
          AND status IN ('pending', 'countered')
        "#,
    )
    .bind(id)
    .bind(outcome.status.as_str())
    .bind(outcome.final_price)
    .bind(outcome.counter_offer)
    .bind(&outcome.owner_response)
    .bind(&outcome.counter_message)
    .bind(outcome.response_date)
    .bind(outcome.expires_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete a negotiation (services gate this on terminal-or-expired)
pub async fn delete_negotiation(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM negotiations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// All negotiations a student has proposed, newest first
pub async fn list_for_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<Negotiation>> {
    let negotiations = sqlx::query_as::<_, Negotiation>(&format!(
        r#"
        SELECT {NEGOTIATION_COLUMNS}
        FROM negotiations
        WHERE student_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(negotiations)
}

/// All negotiations against an owner's listings, newest first
pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Negotiation>> {
    let negotiations = sqlx::query_as::<_, Negotiation>(&format!(
        r#"
        SELECT {NEGOTIATION_COLUMNS}
        FROM negotiations
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(negotiations)
}
