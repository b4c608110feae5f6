//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured responses
//! - Error injection
//! - Call tracking
//! - Webhook event simulation

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{
    CreateIntentRequest, PaymentIntent, PaymentProvider, ProviderError, WebhookEvent,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
///
/// // Configure the next intent
/// mock.set_next_intent(PaymentIntent { id: "pi_123".into(), ... });
///
/// // Inject errors
/// mock.set_next_error(ProviderError::network("Test outage"));
///
/// // Use in tests
/// let result = mock.create_payment_intent(request).await;
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Next payment intent to return.
    next_intent: Option<PaymentIntent>,

    /// Next webhook event to return.
    next_webhook_event: Option<WebhookEvent>,

    /// Error to return on next call.
    next_error: Option<ProviderError>,

    /// Whether webhook verification always fails.
    reject_webhooks: bool,

    /// Intent counter for generated ids.
    intent_counter: u64,

    /// Track requests for assertions.
    intent_requests: Vec<CreateIntentRequest>,
}

impl MockPaymentProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().reject_webhooks = true;
        mock
    }

    /// Set the intent to return on the next `create_payment_intent` call.
    pub fn set_next_intent(&self, intent: PaymentIntent) {
        self.inner.lock().unwrap().next_intent = Some(intent);
    }

    /// Set the webhook event to return on the next `verify_webhook` call.
    pub fn set_next_webhook_event(&self, event: WebhookEvent) {
        self.inner.lock().unwrap().next_webhook_event = Some(event);
    }

    /// Inject an error for the next call.
    pub fn set_next_error(&self, error: ProviderError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Intent creation requests recorded so far.
    pub fn intent_requests(&self) -> Vec<CreateIntentRequest> {
        self.inner.lock().unwrap().intent_requests.clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, ProviderError> {
        let mut state = self.inner.lock().unwrap();
        state.intent_requests.push(request);

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        if let Some(intent) = state.next_intent.take() {
            return Ok(intent);
        }

        state.intent_counter += 1;
        let n = state.intent_counter;
        Ok(PaymentIntent {
            id: format!("pi_mock_{}", n),
            client_secret: format!("pi_mock_{}_secret", n),
            status: "requires_payment_method".to_string(),
        })
    }

    async fn verify_webhook(
        &self,
        _payload: &[u8],
        _signature: &str,
    ) -> Result<WebhookEvent, ProviderError> {
        let mut state = self.inner.lock().unwrap();

        if state.reject_webhooks {
            return Err(ProviderError::invalid_webhook("Invalid signature"));
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        state
            .next_webhook_event
            .take()
            .ok_or_else(|| ProviderError::invalid_webhook("No webhook event configured"))
    }
}

impl std::fmt::Debug for MockPaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPaymentProvider").finish_non_exhaustive()
    }
}
