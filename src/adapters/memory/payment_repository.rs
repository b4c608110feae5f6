//! In-memory PaymentRepository for development and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, UserId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{PaymentRepository, PaymentTransition, TransitionOutcome};

/// In-memory payment repository. Single-process only.
///
/// The mutex is held across the whole conditional transition, so the
/// same status-check guarantees as the SQL implementation apply.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<Vec<Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.lock().unwrap();
        if payments.iter().any(|p| p.id == payment.id) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Payment with this id already exists",
            ));
        }
        payments.push(payment.clone());
        Ok(())
    }

    async fn attach_external_id(
        &self,
        id: &PaymentId,
        external_id: &str,
    ) -> Result<(), DomainError> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments.iter_mut().find(|p| &p.id == id).ok_or_else(|| {
            DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")
        })?;
        payment.link_external_id(external_id)
    }

    async fn transition_if_pending(
        &self,
        id: &PaymentId,
        transition: PaymentTransition,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments.iter_mut().find(|p| &p.id == id).ok_or_else(|| {
            DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")
        })?;

        if payment.status != PaymentStatus::Pending {
            return Ok(TransitionOutcome::NotPending(payment.status));
        }

        match transition {
            PaymentTransition::Completed {
                transaction_id,
                external_data,
            } => payment.complete(transaction_id, external_data)?,
            PaymentTransition::Failed { error_message } => payment.fail(error_message)?,
            PaymentTransition::Cancelled => payment.cancel()?,
        }

        Ok(TransitionOutcome::Applied(payment.clone()))
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let mut payments: Vec<Payment> = self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = page.saturating_sub(1) as usize * page_size as usize;
        Ok(payments
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }

    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.user_id == user_id)
            .count() as u64)
    }
}

impl std::fmt::Debug for InMemoryPaymentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPaymentRepository")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TransactionId;

    fn test_payment() -> Payment {
        Payment::create(PaymentId::new(), UserId::new("mem-user").unwrap(), 5_000)
    }

    #[tokio::test]
    async fn create_then_find_roundtrips() {
        let repo = InMemoryPaymentRepository::new();
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        let found = repo.find_by_id(&payment.id).await.unwrap().unwrap();
        assert_eq!(found.id, payment.id);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let repo = InMemoryPaymentRepository::new();
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        assert!(repo.create(&payment).await.is_err());
    }

    #[tokio::test]
    async fn transition_applies_only_once() {
        let repo = InMemoryPaymentRepository::new();
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        let first = repo
            .transition_if_pending(
                &payment.id,
                PaymentTransition::Completed {
                    transaction_id: TransactionId::new(),
                    external_data: None,
                },
            )
            .await
            .unwrap();
        assert!(matches!(first, TransitionOutcome::Applied(_)));

        let second = repo
            .transition_if_pending(
                &payment.id,
                PaymentTransition::Failed {
                    error_message: "late failure".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            second,
            TransitionOutcome::NotPending(PaymentStatus::Completed)
        ));
    }

    #[tokio::test]
    async fn transition_on_missing_payment_is_not_found() {
        let repo = InMemoryPaymentRepository::new();
        let result = repo
            .transition_if_pending(&PaymentId::new(), PaymentTransition::Cancelled)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn attach_external_id_then_lookup() {
        let repo = InMemoryPaymentRepository::new();
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        repo.attach_external_id(&payment.id, "pi_mem_1")
            .await
            .unwrap();

        let found = repo.find_by_external_id("pi_mem_1").await.unwrap().unwrap();
        assert_eq!(found.id, payment.id);
    }

    #[tokio::test]
    async fn attach_different_external_id_is_rejected() {
        let repo = InMemoryPaymentRepository::new();
        let payment = test_payment();
        repo.create(&payment).await.unwrap();
        repo.attach_external_id(&payment.id, "pi_a").await.unwrap();

        assert!(repo.attach_external_id(&payment.id, "pi_b").await.is_err());
        // Same id again is fine
        assert!(repo.attach_external_id(&payment.id, "pi_a").await.is_ok());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let repo = InMemoryPaymentRepository::new();
        let user_id = UserId::new("mem-user").unwrap();
        for i in 0..5 {
            let payment = Payment::create(PaymentId::new(), user_id.clone(), 1_000 + i);
            repo.create(&payment).await.unwrap();
        }

        let page = repo.list_by_user(&user_id, 1, 3).await.unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(repo.count_by_user(&user_id).await.unwrap(), 5);
    }
}
