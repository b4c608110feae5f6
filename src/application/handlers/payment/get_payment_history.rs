//! GetPaymentHistoryHandler - Query handler for a user's payment history.
//!
//! Pure read path: paginated, newest first, no side effects.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::payment::{Payment, PaymentError};
use crate::ports::PaymentRepository;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query for a page of a user's payments.
#[derive(Debug, Clone)]
pub struct GetPaymentHistoryQuery {
    pub user_id: UserId,
    /// 1-indexed page number.
    pub page: u32,
    pub page_size: u32,
}

impl GetPaymentHistoryQuery {
    /// Query with default paging (first page of 20).
    pub fn first_page(user_id: UserId) -> Self {
        Self {
            user_id,
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of payment history.
#[derive(Debug, Clone)]
pub struct PaymentHistoryResult {
    /// Payments on this page, newest first.
    pub payments: Vec<Payment>,
    /// Total payments for this user across all pages.
    pub total_count: u64,
    /// ceil(total_count / page_size).
    pub total_pages: u64,
}

/// Handler for payment history queries.
pub struct GetPaymentHistoryHandler {
    repository: Arc<dyn PaymentRepository>,
}

impl GetPaymentHistoryHandler {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetPaymentHistoryQuery,
    ) -> Result<PaymentHistoryResult, PaymentError> {
        if query.page < 1 {
            return Err(PaymentError::validation("page", "must be at least 1"));
        }
        if query.page_size < 1 || query.page_size > MAX_PAGE_SIZE {
            return Err(PaymentError::validation(
                "page_size",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }

        let payments = self
            .repository
            .list_by_user(&query.user_id, query.page, query.page_size)
            .await?;
        let total_count = self.repository.count_by_user(&query.user_id).await?;

        Ok(PaymentHistoryResult {
            payments,
            total_count,
            total_pages: total_pages(total_count, query.page_size),
        })
    }
}

/// ceil(total_count / page_size) without going through floats.
fn total_pages(total_count: u64, page_size: u32) -> u64 {
    let page_size = page_size as u64;
    (total_count + page_size - 1) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, PaymentId};
    use crate::ports::{PaymentTransition, TransitionOutcome};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;

    struct MockPaymentRepository {
        payments: Mutex<Vec<Payment>>,
    }

    impl MockPaymentRepository {
        fn with_payments(payments: Vec<Payment>) -> Self {
            Self {
                payments: Mutex::new(payments),
            }
        }
    }

    #[async_trait]
    impl PaymentRepository for MockPaymentRepository {
        async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
            self.payments.lock().unwrap().push(payment.clone());
            Ok(())
        }

        async fn attach_external_id(
            &self,
            _id: &PaymentId,
            _external_id: &str,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn transition_if_pending(
            &self,
            _id: &PaymentId,
            _transition: PaymentTransition,
        ) -> Result<TransitionOutcome, DomainError> {
            unreachable!("query handler never transitions")
        }

        async fn find_by_id(&self, _id: &PaymentId) -> Result<Option<Payment>, DomainError> {
            Ok(None)
        }

        async fn find_by_external_id(
            &self,
            _external_id: &str,
        ) -> Result<Option<Payment>, DomainError> {
            Ok(None)
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
            let offset = ((page - 1) * page_size) as usize;
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

    fn test_user_id() -> UserId {
        UserId::new("user-history").unwrap()
    }

    fn payments_for_user(count: usize) -> Vec<Payment> {
        (0..count)
            .map(|i| Payment::create(PaymentId::new(), test_user_id(), 1_000 + i as i64))
            .collect()
    }

    #[tokio::test]
    async fn returns_first_page_with_totals() {
        let repo = Arc::new(MockPaymentRepository::with_payments(payments_for_user(45)));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery {
                user_id: test_user_id(),
                page: 1,
                page_size: 20,
            })
            .await
            .unwrap();

        assert_eq!(result.payments.len(), 20);
        assert_eq!(result.total_count, 45);
        assert_eq!(result.total_pages, 3);
    }

    #[tokio::test]
    async fn last_page_is_partial() {
        let repo = Arc::new(MockPaymentRepository::with_payments(payments_for_user(45)));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery {
                user_id: test_user_id(),
                page: 3,
                page_size: 20,
            })
            .await
            .unwrap();

        assert_eq!(result.payments.len(), 5);
    }

    #[tokio::test]
    async fn page_past_end_is_empty_not_error() {
        let repo = Arc::new(MockPaymentRepository::with_payments(payments_for_user(5)));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery {
                user_id: test_user_id(),
                page: 10,
                page_size: 20,
            })
            .await
            .unwrap();

        assert!(result.payments.is_empty());
        assert_eq!(result.total_count, 5);
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test]
    async fn empty_history_has_zero_pages() {
        let repo = Arc::new(MockPaymentRepository::with_payments(vec![]));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery::first_page(test_user_id()))
            .await
            .unwrap();

        assert!(result.payments.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.total_pages, 0);
    }

    #[tokio::test]
    async fn page_zero_fails_validation() {
        let repo = Arc::new(MockPaymentRepository::with_payments(vec![]));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery {
                user_id: test_user_id(),
                page: 0,
                page_size: 20,
            })
            .await;

        assert!(matches!(
            result,
            Err(PaymentError::ValidationFailed { ref field, .. }) if field == "page"
        ));
    }

    #[tokio::test]
    async fn oversized_page_size_fails_validation() {
        let repo = Arc::new(MockPaymentRepository::with_payments(vec![]));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery {
                user_id: test_user_id(),
                page: 1,
                page_size: 101,
            })
            .await;

        assert!(matches!(
            result,
            Err(PaymentError::ValidationFailed { ref field, .. }) if field == "page_size"
        ));
    }

    #[tokio::test]
    async fn other_users_payments_are_excluded() {
        let mut payments = payments_for_user(3);
        payments.push(Payment::create(
            PaymentId::new(),
            UserId::new("someone-else").unwrap(),
            9_999,
        ));
        let repo = Arc::new(MockPaymentRepository::with_payments(payments));
        let handler = GetPaymentHistoryHandler::new(repo);

        let result = handler
            .handle(GetPaymentHistoryQuery::first_page(test_user_id()))
            .await
            .unwrap();

        assert_eq!(result.total_count, 3);
        assert!(result
            .payments
            .iter()
            .all(|p| p.user_id == test_user_id()));
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling_division(total in 0u64..100_000, page_size in 1u32..=100) {
            let pages = total_pages(total, page_size);
            let page_size = page_size as u64;

            // Enough pages to hold everything
            prop_assert!(pages * page_size >= total);
            // But no fully-empty trailing page
            prop_assert!(pages == 0 || (pages - 1) * page_size < total);
        }
    }
}
