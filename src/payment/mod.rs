//! Payment confirmation: gateway signature verification and the idempotent
//! pending-to-confirmed booking transition it gates.

pub mod models;
pub mod queries;
pub mod requests;
pub mod services;
pub mod signature;

pub use models::{PaymentTransaction, TransactionStatus};
pub use services::PaymentConfirmation;
