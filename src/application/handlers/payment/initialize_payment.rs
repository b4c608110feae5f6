//! InitializePaymentHandler - Command handler for starting a payment.
//!
//! Validates input, persists a Pending payment, creates the provider
//! payment intent, and hands the client what it needs to confirm.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::foundation::{PaymentId, UserId};
use crate::domain::payment::{Payment, PaymentError};
use crate::ports::{
    CreateIntentRequest, PaymentProvider, PaymentRepository, PaymentTransition,
};

/// Handler-level configuration, injected explicitly at wiring time.
#[derive(Debug, Clone)]
pub struct InitializePaymentConfig {
    /// Smallest accepted amount, in minor units.
    pub minimum_amount_minor: i64,

    /// ISO currency code for created intents.
    pub currency: String,

    /// Publishable key handed to clients alongside the client secret.
    pub publishable_key: String,

    /// When the provider call fails: `true` cancels the just-created
    /// payment, `false` leaves it Pending for a later retry or a
    /// webhook that still arrives.
    pub cancel_on_intent_failure: bool,
}

/// Command to initialize a payment.
#[derive(Debug, Clone)]
pub struct InitializePaymentCommand {
    pub user_id: UserId,
    /// Amount in minor currency units.
    pub amount_minor: i64,
    /// URL the client flow returns to after confirmation.
    pub return_url: Option<String>,
    pub description: Option<String>,
}

/// Result of payment initialization.
#[derive(Debug, Clone)]
pub struct InitializePaymentResult {
    pub payment_id: PaymentId,
    /// The provider's payment intent id.
    pub external_id: String,
    /// Secret the client uses to confirm the payment.
    pub client_secret: String,
    pub publishable_key: String,
}

/// Handler for payment initialization.
///
/// Repeated calls create independent payments; there is no input
/// dedup at this layer.
pub struct InitializePaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    config: InitializePaymentConfig,
}

impl InitializePaymentHandler {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        config: InitializePaymentConfig,
    ) -> Self {
        Self {
            repository,
            payment_provider,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: InitializePaymentCommand,
    ) -> Result<InitializePaymentResult, PaymentError> {
        // 1. Validate before any side effect
        self.validate(&cmd)?;

        // 2. Persist the Pending payment
        let payment = Payment::create(PaymentId::new(), cmd.user_id.clone(), cmd.amount_minor);
        self.repository.create(&payment).await?;

        info!(
            payment_id = %payment.id,
            user_id = %payment.user_id,
            amount_minor = payment.amount_minor,
            "Payment created"
        );

        // 3. Create the provider intent, carrying our id as metadata
        let intent = match self
            .payment_provider
            .create_payment_intent(CreateIntentRequest {
                payment_id: payment.id,
                amount_minor: cmd.amount_minor,
                currency: self.config.currency.clone(),
                description: cmd.description.clone(),
                return_url: cmd.return_url.clone(),
            })
            .await
        {
            Ok(intent) => intent,
            Err(err) => {
                warn!(
                    payment_id = %payment.id,
                    error = %err,
                    "Provider intent creation failed"
                );
                if self.config.cancel_on_intent_failure {
                    // Best effort; the payment is already unusable
                    // without an intent.
                    let _ = self
                        .repository
                        .transition_if_pending(&payment.id, PaymentTransition::Cancelled)
                        .await;
                }
                return Err(PaymentError::provider_unavailable(err.message));
            }
        };

        // 4. Link the payment to the provider intent
        self.repository
            .attach_external_id(&payment.id, &intent.id)
            .await?;

        Ok(InitializePaymentResult {
            payment_id: payment.id,
            external_id: intent.id,
            client_secret: intent.client_secret,
            publishable_key: self.config.publishable_key.clone(),
        })
    }

    fn validate(&self, cmd: &InitializePaymentCommand) -> Result<(), PaymentError> {
        if cmd.amount_minor <= 0 {
            return Err(PaymentError::validation("amount", "must be positive"));
        }
        if cmd.amount_minor < self.config.minimum_amount_minor {
            return Err(PaymentError::validation(
                "amount",
                format!(
                    "must be at least {} minor units",
                    self.config.minimum_amount_minor
                ),
            ));
        }
        if let Some(url) = &cmd.return_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(PaymentError::validation(
                    "return_url",
                    "must be an absolute http(s) URL",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::payment::PaymentStatus;
    use crate::ports::{PaymentIntent, ProviderError, TransitionOutcome, WebhookEvent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockPaymentRepository {
        payments: Mutex<Vec<Payment>>,
    }

    impl MockPaymentRepository {
        fn new() -> Self {
            Self {
                payments: Mutex::new(Vec::new()),
            }
        }

        fn get_payments(&self) -> Vec<Payment> {
            self.payments.lock().unwrap().clone()
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
            id: &PaymentId,
            external_id: &str,
        ) -> Result<(), DomainError> {
            let mut payments = self.payments.lock().unwrap();
            let payment = payments
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "not found"))?;
            payment.link_external_id(external_id)?;
            Ok(())
        }

        async fn transition_if_pending(
            &self,
            id: &PaymentId,
            transition: PaymentTransition,
        ) -> Result<TransitionOutcome, DomainError> {
            let mut payments = self.payments.lock().unwrap();
            let payment = payments
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "not found"))?;

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
            let payments = self.payments.lock().unwrap();
            Ok(payments.iter().find(|p| &p.id == id).cloned())
        }

        async fn find_by_external_id(
            &self,
            external_id: &str,
        ) -> Result<Option<Payment>, DomainError> {
            let payments = self.payments.lock().unwrap();
            Ok(payments
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
            Ok(vec![])
        }

        async fn count_by_user(&self, _user_id: &UserId) -> Result<u64, DomainError> {
            Ok(0)
        }
    }

    struct MockPaymentProvider {
        fail_intent: bool,
    }

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_payment_intent(
            &self,
            request: CreateIntentRequest,
        ) -> Result<PaymentIntent, ProviderError> {
            if self.fail_intent {
                return Err(ProviderError::network("connection refused"));
            }
            Ok(PaymentIntent {
                id: format!("pi_for_{}", request.payment_id),
                client_secret: "pi_secret_123".to_string(),
                status: "requires_payment_method".to_string(),
            })
        }

        async fn verify_webhook(
            &self,
            _payload: &[u8],
            _signature: &str,
        ) -> Result<WebhookEvent, ProviderError> {
            Err(ProviderError::invalid_webhook("not used"))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn test_config() -> InitializePaymentConfig {
        InitializePaymentConfig {
            minimum_amount_minor: 100,
            currency: "usd".to_string(),
            publishable_key: "pk_test_xxx".to_string(),
            cancel_on_intent_failure: false,
        }
    }

    fn test_command() -> InitializePaymentCommand {
        InitializePaymentCommand {
            user_id: UserId::new("user-1").unwrap(),
            amount_minor: 50_000,
            return_url: Some("https://app.example.com/wallet".to_string()),
            description: Some("Balance top-up".to_string()),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Happy Path Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn initialize_creates_pending_payment_with_intent() {
        let repo = Arc::new(MockPaymentRepository::new());
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: false }),
            test_config(),
        );

        let result = handler.handle(test_command()).await.unwrap();

        assert_eq!(result.publishable_key, "pk_test_xxx");
        assert_eq!(result.client_secret, "pi_secret_123");
        assert!(result.external_id.starts_with("pi_for_"));

        let payments = repo.get_payments();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Pending);
        assert_eq!(payments[0].amount_minor, 50_000);
        assert_eq!(payments[0].external_id.as_deref(), Some(result.external_id.as_str()));
    }

    #[tokio::test]
    async fn repeated_initialize_creates_independent_payments() {
        let repo = Arc::new(MockPaymentRepository::new());
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: false }),
            test_config(),
        );

        let first = handler.handle(test_command()).await.unwrap();
        let second = handler.handle(test_command()).await.unwrap();

        assert_ne!(first.payment_id, second.payment_id);
        assert_eq!(repo.get_payments().len(), 2);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn zero_amount_fails_validation_and_creates_nothing() {
        let repo = Arc::new(MockPaymentRepository::new());
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: false }),
            test_config(),
        );

        let mut cmd = test_command();
        cmd.amount_minor = 0;
        let result = handler.handle(cmd).await;

        assert!(matches!(
            result,
            Err(PaymentError::ValidationFailed { ref field, .. }) if field == "amount"
        ));
        assert!(repo.get_payments().is_empty());
    }

    #[tokio::test]
    async fn amount_below_minimum_fails_validation() {
        let repo = Arc::new(MockPaymentRepository::new());
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: false }),
            test_config(),
        );

        let mut cmd = test_command();
        cmd.amount_minor = 50; // below minimum of 100
        let result = handler.handle(cmd).await;

        assert!(result.is_err());
        assert!(repo.get_payments().is_empty());
    }

    #[tokio::test]
    async fn relative_return_url_fails_validation() {
        let repo = Arc::new(MockPaymentRepository::new());
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: false }),
            test_config(),
        );

        let mut cmd = test_command();
        cmd.return_url = Some("/wallet".to_string());
        let result = handler.handle(cmd).await;

        assert!(matches!(
            result,
            Err(PaymentError::ValidationFailed { ref field, .. }) if field == "return_url"
        ));
        assert!(repo.get_payments().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Provider Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn provider_failure_leaves_payment_pending_by_default() {
        let repo = Arc::new(MockPaymentRepository::new());
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: true }),
            test_config(),
        );

        let result = handler.handle(test_command()).await;

        assert!(matches!(
            result,
            Err(PaymentError::ProviderUnavailable { .. })
        ));

        let payments = repo.get_payments();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Pending);
        assert!(payments[0].external_id.is_none());
    }

    #[tokio::test]
    async fn provider_failure_cancels_payment_when_configured() {
        let repo = Arc::new(MockPaymentRepository::new());
        let mut config = test_config();
        config.cancel_on_intent_failure = true;
        let handler = InitializePaymentHandler::new(
            repo.clone(),
            Arc::new(MockPaymentProvider { fail_intent: true }),
            config,
        );

        let result = handler.handle(test_command()).await;

        assert!(result.is_err());
        let payments = repo.get_payments();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Cancelled);
    }
}
