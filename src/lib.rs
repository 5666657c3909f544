//! UniStay negotiation-booking engine.
//!
//! The reconciliation path from a proposed price to a captured payment:
//! negotiation state machine, inventory guard, booking reconciler and the
//! payment confirmation gate. Consumed as a library by the marketplace's
//! HTTP request handlers; identity, delivery and presentation live outside.

pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod negotiation;
pub mod notify;
pub mod payment;

// Re-export commonly used items
pub use config::EngineConfig;
pub use error::{AppError, Result};
pub use notify::{Notification, NotificationKind, Notifier};
