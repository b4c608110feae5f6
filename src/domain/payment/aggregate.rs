//! Payment aggregate entity.
//!
//! A Payment is the unit of reconciliation between this service and the
//! external payment provider. It is created Pending, optionally linked
//! to a provider payment intent, and driven to exactly one terminal
//! state by webhook deliveries.
//!
//! # Design Decisions
//!
//! - **Money in minor units**: All monetary values stored as i64 cents
//!   (not floats)
//! - **Terminal once**: Completed/Failed/Cancelled never transition again
//! - **External id is write-once**: set at creation or by the webhook
//!   linking path, never overwritten with a different value

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, StateMachine, Timestamp, TransactionId, UserId,
};
use serde::{Deserialize, Serialize};

use super::{PaymentMethod, PaymentStatus};

/// Payment aggregate - one attempt to move money for a user.
///
/// # Invariants
///
/// - `id` is globally unique
/// - `amount_minor > 0`
/// - Status transitions follow state machine rules
/// - `completed_at` is set iff status is terminal
/// - `error_message` is set only when status is Failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier for this payment.
    pub id: PaymentId,

    /// User this payment belongs to.
    pub user_id: UserId,

    /// Amount in minor currency units (cents).
    ///
    /// This is the expected amount recorded at creation; the provider
    /// webhook is authoritative for the amount actually moved.
    pub amount_minor: i64,

    /// How the payment is collected.
    pub method: PaymentMethod,

    /// Current status in the payment lifecycle.
    pub status: PaymentStatus,

    /// The provider's payment id, once known.
    ///
    /// Primary correlation key for incoming webhooks.
    pub external_id: Option<String>,

    /// Ledger transaction created when the payment completed.
    pub transaction_id: Option<TransactionId>,

    /// Raw provider payload captured on completion, for audit.
    pub external_data: Option<serde_json::Value>,

    /// Error message reported by the provider on failure.
    pub error_message: Option<String>,

    /// When the payment was created.
    pub created_at: Timestamp,

    /// When the payment reached a terminal state.
    pub completed_at: Option<Timestamp>,
}

impl Payment {
    /// Create a new pending payment.
    ///
    /// The provider intent does not exist yet; `external_id` is attached
    /// after the provider call succeeds.
    pub fn create(id: PaymentId, user_id: UserId, amount_minor: i64) -> Self {
        Self {
            id,
            user_id,
            amount_minor,
            method: PaymentMethod::Online,
            status: PaymentStatus::Pending,
            external_id: None,
            transaction_id: None,
            external_data: None,
            error_message: None,
            created_at: Timestamp::now(),
            completed_at: None,
        }
    }

    /// Returns true if the payment has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Link this payment to the provider's payment id.
    ///
    /// Idempotent when called with the same id. Refuses to overwrite a
    /// different existing id, which would silently re-route webhooks.
    ///
    /// # Errors
    ///
    /// Returns error if a different external id is already set.
    pub fn link_external_id(&mut self, external_id: impl Into<String>) -> Result<(), DomainError> {
        let external_id = external_id.into();
        match &self.external_id {
            Some(existing) if *existing == external_id => Ok(()),
            Some(existing) => Err(DomainError::new(
                ErrorCode::PaymentAlreadyLinked,
                format!(
                    "Payment {} already linked to provider id {}",
                    self.id, existing
                ),
            )),
            None => {
                self.external_id = Some(external_id);
                Ok(())
            }
        }
    }

    /// Complete this payment after provider confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if the payment is not Pending.
    pub fn complete(
        &mut self,
        transaction_id: TransactionId,
        external_data: Option<serde_json::Value>,
    ) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Completed)?;
        self.transaction_id = Some(transaction_id);
        self.external_data = external_data;
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Mark this payment failed with the provider's error message.
    ///
    /// # Errors
    ///
    /// Returns error if the payment is not Pending.
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Failed)?;
        self.error_message = Some(error_message.into());
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Cancel this payment before completion.
    ///
    /// # Errors
    ///
    /// Returns error if the payment is not Pending.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Cancelled)?;
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition payment from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_payment() -> Payment {
        Payment::create(
            PaymentId::new(),
            UserId::new("user-123").unwrap(),
            50_000,
        )
    }

    // Construction tests

    #[test]
    fn create_starts_pending() {
        let payment = test_payment();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount_minor, 50_000);
        assert_eq!(payment.method, PaymentMethod::Online);
        assert!(payment.external_id.is_none());
        assert!(payment.transaction_id.is_none());
        assert!(payment.completed_at.is_none());
        assert!(payment.error_message.is_none());
    }

    // Linking tests

    #[test]
    fn link_external_id_sets_id_once() {
        let mut payment = test_payment();

        payment.link_external_id("pi_abc123").unwrap();
        assert_eq!(payment.external_id.as_deref(), Some("pi_abc123"));
    }

    #[test]
    fn link_external_id_is_idempotent_for_same_id() {
        let mut payment = test_payment();

        payment.link_external_id("pi_abc123").unwrap();
        payment.link_external_id("pi_abc123").unwrap();
        assert_eq!(payment.external_id.as_deref(), Some("pi_abc123"));
    }

    #[test]
    fn link_external_id_rejects_different_id() {
        let mut payment = test_payment();

        payment.link_external_id("pi_abc123").unwrap();
        let result = payment.link_external_id("pi_other");

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::PaymentAlreadyLinked);
        assert_eq!(payment.external_id.as_deref(), Some("pi_abc123"));
    }

    // Transition tests

    #[test]
    fn complete_sets_transaction_and_timestamp() {
        let mut payment = test_payment();
        let tx_id = TransactionId::new();

        payment
            .complete(tx_id, Some(serde_json::json!({"id": "pi_1"})))
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.transaction_id, Some(tx_id));
        assert!(payment.completed_at.is_some());
        assert!(payment.external_data.is_some());
        assert!(payment.is_terminal());
    }

    #[test]
    fn fail_records_error_message() {
        let mut payment = test_payment();

        payment.fail("card_declined").unwrap();

        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.error_message.as_deref(), Some("card_declined"));
        assert!(payment.completed_at.is_some());
    }

    #[test]
    fn cancel_sets_terminal_state() {
        let mut payment = test_payment();

        payment.cancel().unwrap();

        assert_eq!(payment.status, PaymentStatus::Cancelled);
        assert!(payment.completed_at.is_some());
        assert!(payment.error_message.is_none());
    }

    #[test]
    fn complete_fails_on_already_completed_payment() {
        let mut payment = test_payment();
        payment.complete(TransactionId::new(), None).unwrap();

        let result = payment.complete(TransactionId::new(), None);

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().code,
            ErrorCode::InvalidStateTransition
        );
    }

    #[test]
    fn fail_fails_on_cancelled_payment() {
        let mut payment = test_payment();
        payment.cancel().unwrap();

        assert!(payment.fail("too late").is_err());
        assert_eq!(payment.status, PaymentStatus::Cancelled);
    }

    #[test]
    fn cancel_fails_on_failed_payment() {
        let mut payment = test_payment();
        payment.fail("card_declined").unwrap();

        assert!(payment.cancel().is_err());
    }
}
