//! Negotiation service functions with database access.
//!
//! These load the record, let the pure state machine in `models` decide the
//! transition, then persist it with a status-guarded UPDATE. Zero rows
//! affected means another request won the race and the transition is
//! reported as `InvalidState`.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::inventory;
use crate::notify::{NotificationKind, Notifier};

use super::models::{Negotiation, NegotiationStatus, OwnerAction};
use super::queries;
use super::requests::{ProposeRequest, RespondRequest};

/// Student proposes a price against a listing.
pub async fn propose(
    pool: &PgPool,
    notifier: &Notifier,
    cfg: &EngineConfig,
    student_id: Uuid,
    req: ProposeRequest,
) -> Result<Negotiation> {
    let listing = inventory::queries::get_listing(pool, req.listing_id)
        .await?
        .ok_or(AppError::ListingNotFound)?;

    let now = Utc::now();

    // Sweep an expired leftover so it cannot hold the unique live slot.
    queries::purge_expired_open(pool, student_id, req.listing_id, now).await?;

    // One live negotiation per student per listing
    if queries::find_open_negotiation(pool, student_id, req.listing_id, now)
        .await?
        .is_some()
    {
        return Err(AppError::ActiveNegotiation);
    }

    let negotiation = Negotiation::propose(
        listing.id,
        student_id,
        listing.owner_id,
        listing.monthly_rent,
        req.proposed_price,
        req.message,
        now,
        cfg.negotiation_window,
    )?;

    // The partial unique index on live negotiations closes the window
    // between the check above and this insert: the slower of two racing
    // proposals hits the unique violation instead of inserting a duplicate.
    if let Err(e) = queries::insert_negotiation(pool, &negotiation).await {
        if let AppError::Database(sqlx::Error::Database(db)) = &e {
            if db.is_unique_violation() {
                return Err(AppError::ActiveNegotiation);
            }
        }
        return Err(e);
    }

    info!(
        negotiation_id = %negotiation.id,
        listing_id = %negotiation.listing_id,
        proposed = %negotiation.proposed_price,
        "Negotiation proposed"
    );

    notifier.notify(
        negotiation.owner_id,
        NotificationKind::NegotiationReceived,
        serde_json::json!({
            "negotiation_id": negotiation.id,
            "listing_id": negotiation.listing_id,
            "proposed_price": negotiation.proposed_price.to_string(),
        }),
    );

    Ok(negotiation)
}

/// Owner accepts, rejects or counters an open negotiation.
pub async fn respond(
    pool: &PgPool,
    notifier: &Notifier,
    cfg: &EngineConfig,
    negotiation_id: Uuid,
    actor_id: Uuid,
    req: RespondRequest,
) -> Result<Negotiation> {
    let negotiation = queries::get_negotiation(pool, negotiation_id)
        .await?
        .ok_or(AppError::NegotiationNotFound)?;

    let action = match req {
        RespondRequest::Accept => OwnerAction::Accept,
        RespondRequest::Reject { response } => OwnerAction::Reject { response },
        RespondRequest::Counter { amount, message } => OwnerAction::Counter { amount, message },
    };

    let now = Utc::now();
    let outcome = negotiation.respond(actor_id, &action, now, cfg.negotiation_window)?;

    let rows = queries::apply_transition(pool, negotiation.id, &outcome).await?;
    if rows == 0 {
        // The record left its open state between our read and write.
        return Err(AppError::InvalidState);
    }

    let kind = match outcome.status {
        NegotiationStatus::Accepted => NotificationKind::NegotiationAccepted,
        NegotiationStatus::Rejected => NotificationKind::NegotiationRejected,
        _ => NotificationKind::NegotiationCountered,
    };

    info!(
        negotiation_id = %negotiation.id,
        status = outcome.status.as_str(),
        "Negotiation responded"
    );

    notifier.notify(
        negotiation.student_id,
        kind,
        serde_json::json!({
            "negotiation_id": negotiation.id,
            "status": outcome.status.as_str(),
        }),
    );

    Ok(negotiation.with_outcome(outcome))
}

/// Student accepts an owner counter-offer.
pub async fn accept_counter(
    pool: &PgPool,
    notifier: &Notifier,
    negotiation_id: Uuid,
    actor_id: Uuid,
) -> Result<Negotiation> {
    let negotiation = queries::get_negotiation(pool, negotiation_id)
        .await?
        .ok_or(AppError::NegotiationNotFound)?;

    let now = Utc::now();
    let outcome = negotiation.accept_counter(actor_id, now)?;

    let rows = queries::apply_transition(pool, negotiation.id, &outcome).await?;
    if rows == 0 {
        return Err(AppError::InvalidState);
    }

    info!(
        negotiation_id = %negotiation.id,
        final_price = ?outcome.final_price,
        "Counter-offer accepted by student"
    );

    notifier.notify(
        negotiation.owner_id,
        NotificationKind::NegotiationAccepted,
        serde_json::json!({
            "negotiation_id": negotiation.id,
            "status": outcome.status.as_str(),
        }),
    );

    Ok(negotiation.with_outcome(outcome))
}

/// Student withdraws an open negotiation.
pub async fn withdraw(
    pool: &PgPool,
    notifier: &Notifier,
    negotiation_id: Uuid,
    actor_id: Uuid,
) -> Result<Negotiation> {
    let negotiation = queries::get_negotiation(pool, negotiation_id)
        .await?
        .ok_or(AppError::NegotiationNotFound)?;

    let now = Utc::now();
    let outcome = negotiation.withdraw(actor_id, now)?;

    let rows = queries::apply_transition(pool, negotiation.id, &outcome).await?;
    if rows == 0 {
        return Err(AppError::InvalidState);
    }

    info!(negotiation_id = %negotiation.id, "Negotiation withdrawn");

    notifier.notify(
        negotiation.owner_id,
        NotificationKind::NegotiationWithdrawn,
        serde_json::json!({ "negotiation_id": negotiation.id }),
    );

    Ok(negotiation.with_outcome(outcome))
}

/// Remove a negotiation record. Only terminal or expired records may go.
pub async fn delete(pool: &PgPool, negotiation_id: Uuid) -> Result<()> {
    let negotiation = queries::get_negotiation(pool, negotiation_id)
        .await?
        .ok_or(AppError::NegotiationNotFound)?;

    negotiation.ensure_deletable(Utc::now())?;
    queries::delete_negotiation(pool, negotiation_id).await?;

    info!(negotiation_id = %negotiation_id, "Negotiation deleted");
    Ok(())
}

/// Fetch one negotiation.
pub async fn get(pool: &PgPool, negotiation_id: Uuid) -> Result<Negotiation> {
    queries::get_negotiation(pool, negotiation_id)
        .await?
        .ok_or(AppError::NegotiationNotFound)
}

/// Negotiations proposed by a student.
pub async fn list_for_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<Negotiation>> {
    queries::list_for_student(pool, student_id).await
}

/// Negotiations against an owner's listings.
pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Negotiation>> {
    queries::list_for_owner(pool, owner_id).await
}
