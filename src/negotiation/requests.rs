//! Request DTOs for negotiation operations.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Request to propose a price for a listing
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub listing_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub proposed_price: Decimal,
    #[serde(default)]
    pub message: Option<String>,
}

/// Owner response to an open negotiation
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RespondRequest {
    Accept,
    Reject {
        #[serde(default)]
        response: Option<String>,
    },
    Counter {
        #[serde(with = "rust_decimal::serde::str")]
        amount: Decimal,
        #[serde(default)]
        message: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_respond_request_deserializes_tagged_actions() {
        let accept: RespondRequest = serde_json::from_str(r#"{"action":"accept"}"#).unwrap();
        assert!(matches!(accept, RespondRequest::Accept));

        let counter: RespondRequest =
            serde_json::from_str(r#"{"action":"counter","amount":"10500","message":"final"}"#)
                .unwrap();
        match counter {
            RespondRequest::Counter { amount, message } => {
                assert_eq!(amount, dec!(10500));
                assert_eq!(message.as_deref(), Some("final"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        let reject: RespondRequest = serde_json::from_str(r#"{"action":"reject"}"#).unwrap();
        assert!(matches!(reject, RespondRequest::Reject { response: None }));
    }
}
