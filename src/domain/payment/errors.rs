//! Payment-specific error types.
//!
//! Errors related to payment initialization, webhook reconciliation,
//! and history queries.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | UnmatchedWebhook | 404 |
//! | ValidationFailed | 422 |
//! | InvalidState | 409 |
//! | InvalidWebhookSignature | 401 |
//! | ProviderUnavailable | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId};

/// Payment-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Payment was not found.
    NotFound(PaymentId),

    /// A webhook could not be matched to any payment, neither by the
    /// provider's payment id nor by metadata.
    UnmatchedWebhook {
        external_id: String,
    },

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Invalid state for the requested operation.
    InvalidState {
        current: String,
        attempted: String,
    },

    /// Webhook signature verification failed.
    InvalidWebhookSignature,

    /// The payment provider could not be reached or returned an error.
    ProviderUnavailable {
        reason: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl PaymentError {
    // Constructor functions for cleaner error creation

    pub fn not_found(id: PaymentId) -> Self {
        PaymentError::NotFound(id)
    }

    pub fn unmatched_webhook(external_id: impl Into<String>) -> Self {
        PaymentError::UnmatchedWebhook {
            external_id: external_id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        PaymentError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn invalid_webhook_signature() -> Self {
        PaymentError::InvalidWebhookSignature
    }

    pub fn provider_unavailable(reason: impl Into<String>) -> Self {
        PaymentError::ProviderUnavailable {
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::NotFound(_) | PaymentError::UnmatchedWebhook { .. } => {
                ErrorCode::PaymentNotFound
            }
            PaymentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PaymentError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PaymentError::InvalidWebhookSignature => ErrorCode::WebhookVerificationFailed,
            PaymentError::ProviderUnavailable { .. } => ErrorCode::ProviderError,
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            PaymentError::NotFound(id) => format!("Payment not found: {}", id),
            PaymentError::UnmatchedWebhook { external_id } => {
                format!("No payment matches provider id: {}", external_id)
            }
            PaymentError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PaymentError::InvalidState { current, attempted } => {
                format!("Cannot {} payment in {} state", attempted, current)
            }
            PaymentError::InvalidWebhookSignature => "Invalid webhook signature".to_string(),
            PaymentError::ProviderUnavailable { reason } => {
                format!("Payment provider unavailable: {}", reason)
            }
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Infrastructure(_) | PaymentError::ProviderUnavailable { .. }
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => PaymentError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::InvalidStateTransition => PaymentError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.message,
            },
            ErrorCode::WebhookVerificationFailed => PaymentError::InvalidWebhookSignature,
            ErrorCode::ProviderError => PaymentError::ProviderUnavailable {
                reason: err.message,
            },
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
