//! Price ledger for a negotiation.
//!
//! Pure validation predicates over the four price fields - no database
//! access. The economic rules live here so the state machine and the
//! booking reconciler share one source of truth.

use rust_decimal::Decimal;

use crate::error::{AppError, Result};

/// The price fields attached to a negotiation.
///
/// `original` is a snapshot of the listing price at proposal time and never
/// changes afterwards. `final_price` is set exactly once, on acceptance.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLedger {
    pub original: Decimal,
    pub proposed: Decimal,
    pub counter: Option<Decimal>,
    pub final_price: Option<Decimal>,
}

impl PriceLedger {
    /// Ledger for a fresh proposal. Fails with `InvalidPrice` when the
    /// proposal is non-positive or not strictly below the listing price.
    pub fn open(original: Decimal, proposed: Decimal) -> Result<Self> {
        validate_proposed_price(proposed, original)?;
        Ok(Self {
            original,
            proposed,
            counter: None,
            final_price: None,
        })
    }

    /// The price an acceptance settles on: the owner's counter when one
    /// exists, otherwise the student's proposal.
    pub fn accepted_price(&self) -> Decimal {
        self.counter.unwrap_or(self.proposed)
    }

    /// Record an owner counter-offer. Fails with `InvalidCounter` when the
    /// amount falls outside `[proposed, original]`.
    pub fn with_counter(mut self, amount: Decimal) -> Result<Self> {
        validate_counter_offer(amount, self.proposed, self.original)?;
        self.counter = Some(amount);
        Ok(self)
    }

    /// True once `final_price` has been written.
    pub fn is_settled(&self) -> bool {
        self.final_price.is_some()
    }
}

/// A valid proposal is positive and strictly below the listing price.
pub fn validate_proposed_price(proposed: Decimal, original: Decimal) -> Result<()> {
    if proposed <= Decimal::ZERO || proposed >= original {
        return Err(AppError::InvalidPrice);
    }
    Ok(())
}

/// A valid counter lies in `[proposed, original]` inclusive.
pub fn validate_counter_offer(counter: Decimal, proposed: Decimal, original: Decimal) -> Result<()> {
    if counter < proposed || counter > original {
        return Err(AppError::InvalidCounter);
    }
    Ok(())
}
