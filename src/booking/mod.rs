//! Bookings: the reconciler that turns a listing or an accepted negotiation
//! into a pending booking, and the cancellation path that releases
//! inventory.

pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod services;

pub use models::{Booking, BookingStatus, PaymentStatus};
