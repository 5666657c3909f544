//! Engine configuration loaded from the environment

use chrono::Duration;

use crate::error::{AppError, Result};

/// Default negotiation window, in days. A counter-offer re-arms the window.
pub const DEFAULT_NEGOTIATION_WINDOW_DAYS: i64 = 3;

/// Runtime configuration for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shared secret for payment-gateway signature verification
    pub payment_secret: String,
    /// How long a negotiation stays open after creation or counter
    pub negotiation_window: Duration,
    /// Currency code used in responses
    pub currency: String,
}

impl EngineConfig {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// `PAYMENT_WEBHOOK_SECRET` is required; `NEGOTIATION_WINDOW_DAYS` and
    /// `CURRENCY` fall back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let payment_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .map_err(|_| AppError::Config("PAYMENT_WEBHOOK_SECRET is not set".to_string()))?;

        let window_days = match std::env::var("NEGOTIATION_WINDOW_DAYS") {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                AppError::Config(format!("NEGOTIATION_WINDOW_DAYS is not an integer: {raw}"))
            })?,
            Err(_) => DEFAULT_NEGOTIATION_WINDOW_DAYS,
        };
        if window_days < 1 {
            return Err(AppError::Config(
                "NEGOTIATION_WINDOW_DAYS must be at least 1".to_string(),
            ));
        }

        let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string());

        Ok(Self {
            payment_secret,
            negotiation_window: Duration::days(window_days),
            currency,
        })
    }

    /// Fixed configuration for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            payment_secret: "test-secret".to_string(),
            negotiation_window: Duration::days(DEFAULT_NEGOTIATION_WINDOW_DAYS),
            currency: "INR".to_string(),
        }
    }
}
