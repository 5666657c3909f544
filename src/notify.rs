//! Fire-and-forget notification events
//!
//! The engine emits events onto an unbounded channel; an external delivery
//! worker (email/SMS/push, out of scope here) drains the receiver. Delivery
//! failure is never allowed to fail the operation that produced the event.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// What happened, from the recipient's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NegotiationReceived,
    NegotiationAccepted,
    NegotiationRejected,
    NegotiationCountered,
    NegotiationWithdrawn,
    BookingCreated,
    BookingCancelled,
    BookingRejected,
    PaymentConfirmed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NegotiationReceived => "negotiation_received",
            NotificationKind::NegotiationAccepted => "negotiation_accepted",
            NotificationKind::NegotiationRejected => "negotiation_rejected",
            NotificationKind::NegotiationCountered => "negotiation_countered",
            NotificationKind::NegotiationWithdrawn => "negotiation_withdrawn",
            NotificationKind::BookingCreated => "booking_created",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::BookingRejected => "booking_rejected",
            NotificationKind::PaymentConfirmed => "payment_confirmed",
        }
    }
}

/// A single notification event
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

/// Sending half handed to the engine services
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver the delivery worker drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event. Failure is logged and swallowed.
    pub fn notify(&self, user_id: Uuid, kind: NotificationKind, payload: serde_json::Value) {
        let event = Notification {
            user_id,
            kind,
            payload,
        };
        if self.tx.send(event).is_err() {
            warn!(
                user_id = %user_id,
                kind = kind.as_str(),
                "Notification receiver dropped; event discarded"
            );
        }
    }
}
