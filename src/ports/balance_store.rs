//! Balance store port.
//!
//! Contract for the per-user balance collaborator. The increment must
//! be atomic at the store (upsert with `balance = balance + $n`), never
//! a read-modify-write; exactly-once crediting per payment is the
//! reconciliation handler's job, not this port's.

use crate::domain::balance::Balance;
use crate::domain::foundation::{DomainError, UserId};
use async_trait::async_trait;

/// Port for balance reads and atomic credits.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Atomically add `amount_minor` to the user's balance, creating
    /// the balance row on first credit.
    ///
    /// Returns the balance after the credit.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn credit(&self, user_id: &UserId, amount_minor: i64) -> Result<Balance, DomainError>;

    /// Get a user's balance.
    ///
    /// Returns `None` if the user has never been credited.
    async fn get(&self, user_id: &UserId) -> Result<Option<Balance>, DomainError>;
}
