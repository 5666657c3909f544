//! Booking record and pure derivations
//!
//! The financial snapshot and the move-out date are computed here, without
//! database access, so the reconciler stays a thin transaction script.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "rejected" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }

    /// Statuses that count against the one-active-booking rule.
    pub fn is_occupying(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Active
        )
    }
}

/// Payment progress on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Booking record from the database
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub student_id: Uuid,
    pub owner_id: Uuid,
    pub negotiation_id: Option<Uuid>,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    pub maintenance_charges: Decimal,
    pub total_amount: Decimal,
    pub move_in_date: NaiveDate,
    pub move_out_date: NaiveDate,
    pub duration_months: i32,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Typed view of the stored status.
    pub fn current_status(&self) -> Option<BookingStatus> {
        BookingStatus::parse(&self.status)
    }

    /// Whether a payment confirmation may advance this booking. Only a
    /// `pending` booking is confirmable; mirrored in SQL by the guard in
    /// `payment::queries::confirm_booking`.
    pub fn is_confirmable(&self) -> bool {
        self.current_status() == Some(BookingStatus::Pending)
    }

    /// Whether this booking blocks the student from creating another one.
    /// Mirrored in SQL by `inventory::queries::find_active_booking_id`.
    pub fn blocks_new_booking(&self, today: NaiveDate) -> bool {
        self.current_status()
            .map(|s| s.is_occupying())
            .unwrap_or(false)
            && self.move_out_date > today
            && self.payment_status != PaymentStatus::Failed.as_str()
    }
}

/// `PastMoveInDate` when the move-in is before today, `InvalidDuration` for
/// a stay shorter than one month.
pub fn validate_booking_window(
    move_in_date: NaiveDate,
    duration_months: i32,
    today: NaiveDate,
) -> Result<()> {
    if move_in_date < today {
        return Err(AppError::PastMoveInDate);
    }
    if duration_months < 1 {
        return Err(AppError::InvalidDuration);
    }
    Ok(())
}

/// Move-out is the move-in date advanced by the stay length in months.
pub fn compute_move_out(move_in_date: NaiveDate, duration_months: i32) -> Result<NaiveDate> {
    let months = u32::try_from(duration_months).map_err(|_| AppError::InvalidDuration)?;
    move_in_date
        .checked_add_months(Months::new(months))
        .ok_or(AppError::InvalidDuration)
}

/// Total due at confirmation: rent + deposit + maintenance.
pub fn compute_total(
    monthly_rent: Decimal,
    security_deposit: Decimal,
    maintenance_charges: Decimal,
) -> Decimal {
    monthly_rent + security_deposit + maintenance_charges
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            negotiation_id: None,
            monthly_rent: dec!(10500),
            security_deposit: dec!(20000),
            maintenance_charges: dec!(1500),
            total_amount: dec!(32000),
            move_in_date: date(2025, 1, 1),
            move_out_date: date(2026, 1, 1),
            duration_months: 12,
            status: "pending".to_string(),
            payment_status: "pending".to_string(),
            payment_method: None,
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    // ==================== temporal derivation ====================

    #[test]
    fn test_move_out_is_move_in_plus_duration() {
        // Twelve months from 2025-01-01 lands on 2026-01-01
        assert_eq!(
            compute_move_out(date(2025, 1, 1), 12).unwrap(),
            date(2026, 1, 1)
        );
        assert_eq!(
            compute_move_out(date(2025, 6, 15), 3).unwrap(),
            date(2025, 9, 15)
        );
    }

    #[test]
    fn test_move_out_clamps_end_of_month() {
        // Jan 31 + 1 month clamps to Feb 28
        assert_eq!(
            compute_move_out(date(2025, 1, 31), 1).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_window_validation() {
        let today = date(2025, 1, 1);
        assert!(validate_booking_window(date(2025, 1, 1), 12, today).is_ok());
        assert!(validate_booking_window(date(2025, 3, 1), 1, today).is_ok());
        assert!(matches!(
            validate_booking_window(date(2024, 12, 31), 12, today),
            Err(AppError::PastMoveInDate)
        ));
        assert!(matches!(
            validate_booking_window(date(2025, 2, 1), 0, today),
            Err(AppError::InvalidDuration)
        ));
    }

    // ==================== financial snapshot ====================

    #[test]
    fn test_total_is_sum_of_three() {
        assert_eq!(
            compute_total(dec!(10500), dec!(20000), dec!(1500)),
            dec!(32000)
        );
        assert_eq!(compute_total(dec!(10500), dec!(0), dec!(0)), dec!(10500));
    }

    // ==================== confirmation gate ====================

    #[test]
    fn test_only_pending_bookings_are_confirmable() {
        let b = fixture();
        assert!(b.is_confirmable());
    }

    #[test]
    fn test_non_pending_bookings_are_not_confirmable() {
        for status in ["confirmed", "active", "completed", "cancelled", "rejected"] {
            let mut b = fixture();
            b.status = status.to_string();
            assert!(!b.is_confirmable(), "{status} must not re-confirm");
        }
    }

    #[test]
    fn test_unknown_status_is_not_confirmable() {
        let mut b = fixture();
        b.status = "archived".to_string();
        assert!(!b.is_confirmable());
    }

    // ==================== active-booking constraint ====================

    #[test]
    fn test_occupying_statuses_block_new_bookings() {
        let today = date(2025, 6, 1);
        for status in ["pending", "confirmed", "active"] {
            let mut b = fixture();
            b.status = status.to_string();
            assert!(b.blocks_new_booking(today), "{status} should block");
        }
    }

    #[test]
    fn test_terminal_statuses_do_not_block() {
        let today = date(2025, 6, 1);
        for status in ["completed", "cancelled", "rejected"] {
            let mut b = fixture();
            b.status = status.to_string();
            assert!(!b.blocks_new_booking(today), "{status} should not block");
        }
    }

    #[test]
    fn test_past_move_out_does_not_block() {
        let mut b = fixture();
        b.status = "confirmed".to_string();
        assert!(!b.blocks_new_booking(date(2026, 1, 1)));
        assert!(!b.blocks_new_booking(date(2027, 5, 1)));
    }

    #[test]
    fn test_failed_payment_does_not_block() {
        let mut b = fixture();
        b.status = "pending".to_string();
        b.payment_status = "failed".to_string();
        assert!(!b.blocks_new_booking(date(2025, 6, 1)));
    }
}
