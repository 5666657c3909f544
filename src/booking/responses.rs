//! Response DTOs for booking operations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::models::Booking;

/// Booking as returned to clients
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub student_id: Uuid,
    pub owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiation_id: Option<Uuid>,
    #[serde(with = "rust_decimal::serde::str")]
    pub monthly_rent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub security_deposit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub maintenance_charges: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub move_in_date: NaiveDate,
    pub move_out_date: NaiveDate,
    pub duration_months: i32,
    pub status: String,
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            listing_id: b.listing_id,
            student_id: b.student_id,
            owner_id: b.owner_id,
            negotiation_id: b.negotiation_id,
            monthly_rent: b.monthly_rent,
            security_deposit: b.security_deposit,
            maintenance_charges: b.maintenance_charges,
            total_amount: b.total_amount,
            move_in_date: b.move_in_date,
            move_out_date: b.move_out_date,
            duration_months: b.duration_months,
            status: b.status,
            payment_status: b.payment_status,
            payment_method: b.payment_method,
            created_at: b.created_at,
            confirmed_at: b.confirmed_at,
        }
    }
}
