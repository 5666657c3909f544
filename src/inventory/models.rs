//! Listing availability models

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Availability and price snapshot of a listing
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListingAvailability {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub monthly_rent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub security_deposit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub maintenance_charges: Decimal,
    pub available_rooms: i32,
    pub total_rooms: i32,
    pub is_available: bool,
}

/// Proof that one inventory unit was reserved inside the current
/// transaction. Not cloneable; consumed by exactly one booking insert.
#[derive(Debug)]
pub struct ReservationToken {
    listing_id: Uuid,
}

impl ReservationToken {
    pub(crate) fn new(listing_id: Uuid) -> Self {
        Self { listing_id }
    }

    pub fn listing_id(&self) -> Uuid {
        self.listing_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_token_carries_its_listing() {
        let listing = Uuid::new_v4();
        let token = ReservationToken::new(listing);
        assert_eq!(token.listing_id(), listing);
    }
}
