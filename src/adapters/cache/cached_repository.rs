//! Cache-aside decorator around a PaymentRepository.
//!
//! Only `find_by_id` is served from cache. Writes go to the inner
//! repository first; any cached copy of the touched payment is then
//! invalidated (or refreshed on create). Lookups by external id always
//! hit the inner repository, since the provider id is not a cache key.
//!
//! Cache failures never fail the operation. The cache is an
//! optimization, so errors are logged and the call falls through to
//! the inner repository.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::foundation::{DomainError, PaymentId, UserId};
use crate::domain::payment::Payment;
use crate::ports::{
    CacheStore, PaymentRepository, PaymentTransition, TransitionOutcome,
};

const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// PaymentRepository decorator that caches single-payment lookups.
pub struct CachedPaymentRepository {
    inner: Arc<dyn PaymentRepository>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CachedPaymentRepository {
    pub fn new(inner: Arc<dyn PaymentRepository>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            cache,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cache_key(id: &PaymentId) -> String {
        format!("payment:{}", id)
    }

    async fn cache_put(&self, payment: &Payment) {
        let Ok(json) = serde_json::to_string(payment) else {
            return;
        };
        if let Err(e) = self
            .cache
            .set(&Self::cache_key(&payment.id), &json, self.ttl)
            .await
        {
            warn!(payment_id = %payment.id, error = %e, "Failed to cache payment");
        }
    }

    async fn cache_evict(&self, id: &PaymentId) {
        if let Err(e) = self.cache.remove(&Self::cache_key(id)).await {
            warn!(payment_id = %id, error = %e, "Failed to evict cached payment");
        }
    }
}

#[async_trait]
impl PaymentRepository for CachedPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        self.inner.create(payment).await?;
        self.cache_put(payment).await;
        Ok(())
    }

    async fn attach_external_id(
        &self,
        id: &PaymentId,
        external_id: &str,
    ) -> Result<(), DomainError> {
        let result = self.inner.attach_external_id(id, external_id).await;
        self.cache_evict(id).await;
        result
    }

    async fn transition_if_pending(
        &self,
        id: &PaymentId,
        transition: PaymentTransition,
    ) -> Result<TransitionOutcome, DomainError> {
        let result = self.inner.transition_if_pending(id, transition).await;
        self.cache_evict(id).await;
        result
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        match self.cache.get(&Self::cache_key(id)).await {
            Ok(Some(json)) => match serde_json::from_str::<Payment>(&json) {
                Ok(payment) => return Ok(Some(payment)),
                Err(e) => {
                    warn!(payment_id = %id, error = %e, "Discarding unreadable cached payment");
                    self.cache_evict(id).await;
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(payment_id = %id, error = %e, "Cache read failed, falling through");
            }
        }

        let payment = self.inner.find_by_id(id).await?;
        if let Some(ref payment) = payment {
            self.cache_put(payment).await;
        }
        Ok(payment)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        self.inner.find_by_external_id(external_id).await
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        self.inner.list_by_user(user_id, page, page_size).await
    }

    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        self.inner.count_by_user(user_id).await
    }
}

impl std::fmt::Debug for CachedPaymentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPaymentRepository")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCacheStore;
    use crate::domain::foundation::TransactionId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingRepository {
        payments: Mutex<Vec<Payment>>,
        find_calls: AtomicUsize,
    }

    impl CountingRepository {
        fn new() -> Self {
            Self {
                payments: Mutex::new(Vec::new()),
                find_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentRepository for CountingRepository {
        async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
            self.payments.lock().unwrap().push(payment.clone());
            Ok(())
        }

        async fn attach_external_id(
            &self,
            id: &PaymentId,
            external_id: &str,
        ) -> Result<(), DomainError> {
            let mut payments = self.payments.lock().unwrap();
            if let Some(p) = payments.iter_mut().find(|p| &p.id == id) {
                p.external_id = Some(external_id.to_string());
            }
            Ok(())
        }

        async fn transition_if_pending(
            &self,
            id: &PaymentId,
            transition: PaymentTransition,
        ) -> Result<TransitionOutcome, DomainError> {
            let mut payments = self.payments.lock().unwrap();
            let payment = payments.iter_mut().find(|p| &p.id == id).unwrap();
            match transition {
                PaymentTransition::Completed {
                    transaction_id,
                    external_data,
                } => payment.complete(transaction_id, external_data).unwrap(),
                PaymentTransition::Failed { error_message } => {
                    payment.fail(error_message).unwrap()
                }
                PaymentTransition::Cancelled => payment.cancel().unwrap(),
            }
            Ok(TransitionOutcome::Applied(payment.clone()))
        }

        async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
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
            _user_id: &UserId,
            _page: u32,
            _page_size: u32,
        ) -> Result<Vec<Payment>, DomainError> {
            Ok(self.payments.lock().unwrap().clone())
        }

        async fn count_by_user(&self, _user_id: &UserId) -> Result<u64, DomainError> {
            Ok(self.payments.lock().unwrap().len() as u64)
        }
    }

    fn test_payment() -> Payment {
        Payment::create(
            PaymentId::new(),
            UserId::new("cache-user").unwrap(),
            25_000,
        )
    }

    fn cached(inner: Arc<CountingRepository>) -> CachedPaymentRepository {
        CachedPaymentRepository::new(inner, Arc::new(InMemoryCacheStore::new()))
    }

    #[tokio::test]
    async fn second_find_is_served_from_cache() {
        let inner = Arc::new(CountingRepository::new());
        let repo = cached(inner.clone());
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        let first = repo.find_by_id(&payment.id).await.unwrap();
        let second = repo.find_by_id(&payment.id).await.unwrap();

        assert_eq!(first.unwrap().id, payment.id);
        assert_eq!(second.unwrap().id, payment.id);
        // create already populated the cache, so the inner repo is never hit
        assert_eq!(inner.find_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transition_evicts_cached_copy() {
        let inner = Arc::new(CountingRepository::new());
        let repo = cached(inner.clone());
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        repo.transition_if_pending(
            &payment.id,
            PaymentTransition::Completed {
                transaction_id: TransactionId::new(),
                external_data: None,
            },
        )
        .await
        .unwrap();

        let found = repo.find_by_id(&payment.id).await.unwrap().unwrap();
        assert!(found.is_terminal());
        // Eviction forced a read through to the inner repository
        assert_eq!(inner.find_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attach_external_id_evicts_cached_copy() {
        let inner = Arc::new(CountingRepository::new());
        let repo = cached(inner.clone());
        let payment = test_payment();
        repo.create(&payment).await.unwrap();

        repo.attach_external_id(&payment.id, "pi_cached_1")
            .await
            .unwrap();

        let found = repo.find_by_id(&payment.id).await.unwrap().unwrap();
        assert_eq!(found.external_id.as_deref(), Some("pi_cached_1"));
    }

    #[tokio::test]
    async fn find_by_external_id_bypasses_cache() {
        let inner = Arc::new(CountingRepository::new());
        let repo = cached(inner.clone());
        let payment = test_payment();
        repo.create(&payment).await.unwrap();
        repo.attach_external_id(&payment.id, "pi_bypass").await.unwrap();

        let found = repo.find_by_external_id("pi_bypass").await.unwrap();
        assert_eq!(found.unwrap().id, payment.id);
    }

    #[tokio::test]
    async fn missing_payment_returns_none() {
        let inner = Arc::new(CountingRepository::new());
        let repo = cached(inner);

        let found = repo.find_by_id(&PaymentId::new()).await.unwrap();
        assert!(found.is_none());
    }
}
