//! Error handling for the engine
//!
//! Every validation or invariant failure maps to a stable, enumerable kind
//! string so callers and UI code can branch on it instead of parsing
//! free-text messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;

/// Engine error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Proposed price must be positive and below the listing price")]
    InvalidPrice,

    #[error("Counter offer must lie between the proposed price and the listing price")]
    InvalidCounter,

    #[error("Actor is not permitted to perform this action on this record")]
    Unauthorized,

    #[error("Transition is not legal from the current state")]
    InvalidState,

    #[error("Negotiation window has expired")]
    Expired,

    #[error("An active negotiation already exists for this listing")]
    ActiveNegotiation,

    #[error("No rooms available for this listing")]
    RoomUnavailable,

    #[error("Student already holds an active booking")]
    ActiveBookingExists { conflicting_booking: Uuid },

    #[error("Negotiation not found")]
    NegotiationNotFound,

    #[error("Negotiation belongs to a different student")]
    NegotiationNotOwned,

    #[error("Negotiation references a different listing")]
    NegotiationRoomMismatch,

    #[error("Negotiation has not been accepted")]
    NegotiationNotAccepted,

    #[error("Move-in date is in the past")]
    PastMoveInDate,

    #[error("Booking duration must be at least one month")]
    InvalidDuration,

    #[error("Listing not found")]
    ListingNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Payment signature verification failed")]
    SignatureInvalid,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Stable machine-readable kind, safe to branch on in clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidPrice => "invalid_price",
            AppError::InvalidCounter => "invalid_counter",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidState => "invalid_state",
            AppError::Expired => "expired",
            AppError::ActiveNegotiation => "active_negotiation",
            AppError::RoomUnavailable => "room_unavailable",
            AppError::ActiveBookingExists { .. } => "active_booking_exists",
            AppError::NegotiationNotFound => "negotiation_not_found",
            AppError::NegotiationNotOwned => "negotiation_not_owned",
            AppError::NegotiationRoomMismatch => "negotiation_room_mismatch",
            AppError::NegotiationNotAccepted => "negotiation_not_accepted",
            AppError::PastMoveInDate => "past_move_in_date",
            AppError::InvalidDuration => "invalid_duration",
            AppError::ListingNotFound => "listing_not_found",
            AppError::BookingNotFound => "booking_not_found",
            AppError::SignatureInvalid => "signature_invalid",
            AppError::Config(_) => "config_error",
            AppError::Database(_) => "database_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPrice
            | AppError::InvalidCounter
            | AppError::PastMoveInDate
            | AppError::InvalidDuration => StatusCode::BAD_REQUEST,
            AppError::Unauthorized
            | AppError::NegotiationNotOwned
            | AppError::SignatureInvalid => StatusCode::FORBIDDEN,
            AppError::NegotiationNotFound
            | AppError::ListingNotFound
            | AppError::BookingNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidState
            | AppError::Expired
            | AppError::ActiveNegotiation
            | AppError::RoomUnavailable
            | AppError::ActiveBookingExists { .. }
            | AppError::NegotiationRoomMismatch
            | AppError::NegotiationNotAccepted => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::Database(ref e) = self {
            tracing::error!("Database error: {}", e);
        }
        if let AppError::Config(ref msg) = self {
            tracing::error!("Configuration error: {}", msg);
        }

        // Internal failures keep their detail out of the response body
        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });
        if let AppError::ActiveBookingExists { conflicting_booking } = &self {
            body["conflicting_booking_id"] =
                serde_json::json!(conflicting_booking.to_string());
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::InvalidPrice.kind(), "invalid_price");
        assert_eq!(AppError::Expired.kind(), "expired");
        assert_eq!(AppError::RoomUnavailable.kind(), "room_unavailable");
        assert_eq!(
            AppError::ActiveBookingExists {
                conflicting_booking: Uuid::nil()
            }
            .kind(),
            "active_booking_exists"
        );
        assert_eq!(AppError::SignatureInvalid.kind(), "signature_invalid");
    }

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(AppError::InvalidState.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::RoomUnavailable.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::ActiveNegotiation.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn signature_failure_is_forbidden() {
        assert_eq!(AppError::SignatureInvalid.status(), StatusCode::FORBIDDEN);
    }
}
