//! Request DTOs for payment confirmation.

use serde::Deserialize;
use uuid::Uuid;

/// Gateway callback (or client confirmation call) payload
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    /// Optional; resolved from the transaction record when absent.
    #[serde(default)]
    pub booking_id: Option<Uuid>,
}
