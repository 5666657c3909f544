//! Listing inventory: the per-listing available-room counter and the
//! reservation guard that keeps it consistent under concurrent bookings.

pub mod models;
pub mod queries;
pub mod services;

pub use models::{ListingAvailability, ReservationToken};
