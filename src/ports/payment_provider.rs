//! Payment provider port for external payment processing.
//!
//! Defines the contract for the payment gateway integration. The
//! implementation owns payment intent creation and webhook signature
//! verification; everything else in this service speaks these types.
//!
//! # Design
//!
//! - **Gateway agnostic**: Interface works with any intent-based provider
//! - **Minor units**: All amounts are i64 cents
//! - **Idempotent**: Operations can be safely retried

use crate::domain::foundation::{DomainError, PaymentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Port for the payment provider integration.
///
/// Handles payment intent creation and webhook verification.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment intent at the provider.
    ///
    /// The internal payment id is carried as metadata so webhooks can
    /// be correlated even if the external id was never attached.
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, ProviderError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Returns the parsed event if valid, error if the signature is
    /// missing, malformed, expired, or wrong.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, ProviderError>;
}

/// Request to create a payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    /// Internal payment id (stored as provider metadata).
    pub payment_id: PaymentId,

    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// ISO currency code, e.g. "usd".
    pub currency: String,

    /// Human-readable description shown in the provider dashboard.
    pub description: Option<String>,

    /// URL the client flow returns to after confirmation.
    pub return_url: Option<String>,
}

/// Payment intent created at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider's payment intent id.
    pub id: String,

    /// Secret the client uses to confirm the payment.
    pub client_secret: String,

    /// Provider-reported status at creation time.
    pub status: String,
}

/// Webhook event from the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event id from provider.
    pub id: String,

    /// Event type.
    pub event_type: WebhookEventType,

    /// The payment object the event describes.
    pub object: PaymentObject,

    /// When the event occurred (Unix timestamp).
    pub created_at: i64,
}

/// Types of webhook events we handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Payment completed successfully.
    PaymentSucceeded,

    /// Payment attempt failed.
    PaymentFailed,

    /// Payment was cancelled before completion.
    PaymentCanceled,

    /// Unknown event type. Reconciliation treats these as no-ops so
    /// new provider event types never break the endpoint.
    Unknown(String),
}

/// The provider's payment object carried inside a webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentObject {
    /// Provider's payment id (correlation key).
    pub id: String,

    /// Amount in minor currency units, as reported by the provider.
    ///
    /// Authoritative for money movement; may differ from the amount
    /// recorded at creation.
    pub amount_minor: i64,

    /// Provider-reported status string.
    pub status: String,

    /// When the provider object was created (Unix timestamp).
    pub created: i64,

    /// Metadata attached at intent creation, including `payment_id`.
    pub metadata: HashMap<String, String>,

    /// Provider's error message, present on failed payments.
    pub error_message: Option<String>,
}

impl PaymentObject {
    /// Extracts the internal payment id from metadata, if present and
    /// well formed.
    pub fn metadata_payment_id(&self) -> Option<PaymentId> {
        self.metadata.get("payment_id")?.parse().ok()
    }
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error code for categorization.
    pub code: ProviderErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl ProviderError {
    /// Create a new provider error.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationError, message)
    }

    /// Create an invalid webhook error.
    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidWebhook, message)
    }

    /// Create a provider API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ApiError, message)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        use crate::domain::foundation::ErrorCode;

        let code = match err.code {
            ProviderErrorCode::InvalidWebhook => ErrorCode::WebhookVerificationFailed,
            _ => ErrorCode::ProviderError,
        };

        DomainError::new(code, err.message)
    }
}

/// Provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Invalid webhook signature or payload.
    InvalidWebhook,

    /// Provider API error.
    ApiError,

    /// Unknown error.
    Unknown,
}

impl ProviderErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::NetworkError | ProviderErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderErrorCode::NetworkError => "network_error",
            ProviderErrorCode::AuthenticationError => "authentication_error",
            ProviderErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            ProviderErrorCode::InvalidWebhook => "invalid_webhook",
            ProviderErrorCode::ApiError => "api_error",
            ProviderErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn metadata_payment_id_parses_valid_uuid() {
        let payment_id = PaymentId::new();
        let mut metadata = HashMap::new();
        metadata.insert("payment_id".to_string(), payment_id.to_string());

        let object = PaymentObject {
            id: "pi_1".to_string(),
            amount_minor: 50_000,
            status: "succeeded".to_string(),
            created: 1_700_000_000,
            metadata,
            error_message: None,
        };

        assert_eq!(object.metadata_payment_id(), Some(payment_id));
    }

    #[test]
    fn metadata_payment_id_none_when_missing() {
        let object = PaymentObject {
            id: "pi_1".to_string(),
            amount_minor: 50_000,
            status: "succeeded".to_string(),
            created: 1_700_000_000,
            metadata: HashMap::new(),
            error_message: None,
        };

        assert_eq!(object.metadata_payment_id(), None);
    }

    #[test]
    fn metadata_payment_id_none_when_malformed() {
        let mut metadata = HashMap::new();
        metadata.insert("payment_id".to_string(), "not-a-uuid".to_string());

        let object = PaymentObject {
            id: "pi_1".to_string(),
            amount_minor: 50_000,
            status: "succeeded".to_string(),
            created: 1_700_000_000,
            metadata,
            error_message: None,
        };

        assert_eq!(object.metadata_payment_id(), None);
    }

    #[test]
    fn provider_error_retryable() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::RateLimitExceeded.is_retryable());

        assert!(!ProviderErrorCode::InvalidWebhook.is_retryable());
        assert!(!ProviderErrorCode::AuthenticationError.is_retryable());
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::invalid_webhook("Signature mismatch");
        assert!(err.to_string().contains("invalid_webhook"));
        assert!(err.to_string().contains("Signature mismatch"));
    }

    #[test]
    fn provider_error_converts_to_domain_error() {
        use crate::domain::foundation::ErrorCode;

        let err = ProviderError::invalid_webhook("bad signature");
        let domain_err: DomainError = err.into();
        assert_eq!(domain_err.code, ErrorCode::WebhookVerificationFailed);

        let err = ProviderError::network("timeout");
        let domain_err: DomainError = err.into();
        assert_eq!(domain_err.code, ErrorCode::ProviderError);
    }
}
