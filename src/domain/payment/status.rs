//! Payment status state machine.
//!
//! Defines all possible payment states and valid transitions in the
//! payment lifecycle. A payment moves from Pending to exactly one
//! terminal state and never leaves it.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Payment lifecycle status.
///
/// Completed, Failed, and Cancelled are terminal. Once a payment
/// reaches a terminal state no further transition is valid, which is
/// what makes duplicate webhook deliveries safe to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Initial state. The payment intent may or may not exist yet
    /// at the provider; no money has moved.
    Pending,

    /// Provider confirmed the charge. The user's balance has been
    /// credited exactly once for this payment.
    Completed,

    /// Provider reported the charge failed. No balance effect.
    Failed,

    /// Payment was cancelled before completion. No balance effect.
    Cancelled,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Failed) | (Pending, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Failed, Cancelled],
            Completed | Failed | Cancelled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_transition_to_completed() {
        let status = PaymentStatus::Pending;
        assert!(status.can_transition_to(&PaymentStatus::Completed));

        let result = status.transition_to(PaymentStatus::Completed);
        assert_eq!(result, Ok(PaymentStatus::Completed));
    }

    #[test]
    fn pending_can_transition_to_failed() {
        let status = PaymentStatus::Pending;
        assert!(status.can_transition_to(&PaymentStatus::Failed));

        let result = status.transition_to(PaymentStatus::Failed);
        assert_eq!(result, Ok(PaymentStatus::Failed));
    }

    #[test]
    fn pending_can_transition_to_cancelled() {
        let status = PaymentStatus::Pending;
        assert!(status.can_transition_to(&PaymentStatus::Cancelled));

        let result = status.transition_to(PaymentStatus::Cancelled);
        assert_eq!(result, Ok(PaymentStatus::Cancelled));
    }

    #[test]
    fn completed_cannot_transition_anywhere() {
        let status = PaymentStatus::Completed;
        assert!(!status.can_transition_to(&PaymentStatus::Pending));
        assert!(!status.can_transition_to(&PaymentStatus::Failed));
        assert!(!status.can_transition_to(&PaymentStatus::Cancelled));
        assert!(!status.can_transition_to(&PaymentStatus::Completed));
    }

    #[test]
    fn failed_cannot_transition_to_completed() {
        let status = PaymentStatus::Failed;
        assert!(!status.can_transition_to(&PaymentStatus::Completed));

        let result = status.transition_to(PaymentStatus::Completed);
        assert!(result.is_err());
    }

    #[test]
    fn cancelled_cannot_transition_to_completed() {
        let status = PaymentStatus::Cancelled;
        assert!(status.transition_to(PaymentStatus::Completed).is_err());
    }

    #[test]
    fn terminal_states_are_terminal() {
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Cancelled.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
        ] {
            for valid_target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&valid_target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    valid_target
                );
            }
        }
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
