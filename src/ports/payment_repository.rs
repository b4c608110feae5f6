//! Payment repository port (write side).
//!
//! Defines the contract for persisting and retrieving Payment
//! aggregates. Implementations handle the actual database operations.
//!
//! # Design
//!
//! - **Conditional transitions**: terminal transitions go through
//!   `transition_if_pending`, a single compare-and-set at the store, so
//!   concurrent duplicate webhooks cannot both win
//! - **Correlation lookups**: payments are found by id or by the
//!   provider's external id
//! - **Paged history**: per-user listing ordered newest first

use crate::domain::foundation::{DomainError, PaymentId, TransactionId, UserId};
use crate::domain::payment::{Payment, PaymentStatus};
use async_trait::async_trait;

/// Terminal transition to apply to a pending payment.
#[derive(Debug, Clone)]
pub enum PaymentTransition {
    /// Complete the payment with the provider-confirmed amount.
    Completed {
        transaction_id: TransactionId,
        external_data: Option<serde_json::Value>,
    },

    /// Fail the payment with the provider's error message.
    Failed { error_message: String },

    /// Cancel the payment.
    Cancelled,
}

impl PaymentTransition {
    /// The status this transition moves the payment to.
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            PaymentTransition::Completed { .. } => PaymentStatus::Completed,
            PaymentTransition::Failed { .. } => PaymentStatus::Failed,
            PaymentTransition::Cancelled => PaymentStatus::Cancelled,
        }
    }
}

/// Outcome of a conditional transition.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The payment was Pending and the transition was applied.
    /// Carries the payment as written.
    Applied(Payment),

    /// The payment was already in the given terminal state; nothing
    /// was written.
    NotPending(PaymentStatus),
}

/// Repository port for Payment aggregate persistence.
///
/// Implementations must ensure the conditional transition is a single
/// atomic operation at the store (`UPDATE ... WHERE status = 'pending'`
/// or equivalent), never a read-then-write.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Save a new payment.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a payment with this id already exists
    /// - `DatabaseError` on persistence failure
    async fn create(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Attach the provider's payment id to an existing payment.
    ///
    /// Idempotent for the same id; refuses to overwrite a different
    /// non-null external id.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the payment doesn't exist
    /// - `PaymentAlreadyLinked` if a different external id is set
    async fn attach_external_id(
        &self,
        id: &PaymentId,
        external_id: &str,
    ) -> Result<(), DomainError>;

    /// Atomically apply a terminal transition if the payment is still
    /// Pending.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the payment doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn transition_if_pending(
        &self,
        id: &PaymentId,
        transition: PaymentTransition,
    ) -> Result<TransitionOutcome, DomainError>;

    /// Find a payment by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Find a payment by the provider's payment id.
    ///
    /// Primary webhook correlation lookup. Returns `None` if no payment
    /// has this external id.
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// List a user's payments, newest first.
    ///
    /// `page` is 1-indexed; callers validate `page` and `page_size`
    /// before reaching the store.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Payment>, DomainError>;

    /// Count all payments for a user.
    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError>;
}
