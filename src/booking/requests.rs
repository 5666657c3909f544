//! Request DTOs for booking operations.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// Request to create a booking from a listing, optionally carrying an
/// accepted negotiation whose final price becomes the rent.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub listing_id: Uuid,
    pub move_in_date: NaiveDate,
    pub duration_months: i32,
    #[serde(default)]
    pub negotiation_id: Option<Uuid>,
}
