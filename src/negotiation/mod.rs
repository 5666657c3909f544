//! Price negotiation between a student and a listing owner.
//!
//! The state machine lives in `models`; `ledger` holds the pure price
//! predicates; `services` wires both to the database and the notifier.

pub mod ledger;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod services;

pub use ledger::PriceLedger;
pub use models::{Negotiation, NegotiationStatus, OwnerAction, TransitionOutcome};
