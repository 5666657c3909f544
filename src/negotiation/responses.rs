//! Response DTOs for negotiation operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::models::Negotiation;

/// Negotiation as returned to clients
#[derive(Debug, Serialize)]
pub struct NegotiationResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub student_id: Uuid,
    pub owner_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub original_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub proposed_price: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub counter_offer: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub final_price: Option<Decimal>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<Negotiation> for NegotiationResponse {
    fn from(n: Negotiation) -> Self {
        Self {
            id: n.id,
            listing_id: n.listing_id,
            student_id: n.student_id,
            owner_id: n.owner_id,
            original_price: n.original_price,
            proposed_price: n.proposed_price,
            counter_offer: n.counter_offer,
            final_price: n.final_price,
            status: n.status,
            message: n.message,
            owner_response: n.owner_response,
            counter_message: n.counter_message,
            created_at: n.created_at,
            response_date: n.response_date,
            expires_at: n.expires_at,
        }
    }
}
