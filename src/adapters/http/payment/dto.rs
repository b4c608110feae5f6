//! HTTP DTOs (Data Transfer Objects) for payment endpoints.
//!
//! These types define the JSON request/response structure for the payment API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payment::{
    InitializePaymentResult, PaymentHistoryResult, ReconcileWebhookResult,
};
use crate::domain::payment::{Payment, PaymentStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to initialize a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializePaymentRequest {
    /// Amount in minor currency units (cents).
    pub amount_minor: i64,

    /// URL to redirect after confirming the payment.
    #[serde(default)]
    pub return_url: Option<String>,

    /// Optional description shown on the provider dashboard.
    #[serde(default)]
    pub description: Option<String>,
}

/// Query parameters for payment history.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentHistoryParams {
    /// 1-indexed page number.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a newly initialized payment.
#[derive(Debug, Clone, Serialize)]
pub struct InitializePaymentResponse {
    /// Internal payment id.
    pub payment_id: String,

    /// Provider's payment intent id.
    pub external_id: String,

    /// Secret the client uses to confirm the payment.
    pub client_secret: String,

    /// Publishable key for the client-side SDK.
    pub publishable_key: String,
}

impl From<InitializePaymentResult> for InitializePaymentResponse {
    fn from(result: InitializePaymentResult) -> Self {
        Self {
            payment_id: result.payment_id.to_string(),
            external_id: result.external_id,
            client_secret: result.client_secret,
            publishable_key: result.publishable_key,
        }
    }
}

/// One payment in an API response.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: String,
    /// Amount in minor currency units.
    pub amount_minor: i64,
    /// Current status.
    pub status: PaymentStatus,
    /// Provider's payment id, if linked.
    pub external_id: Option<String>,
    /// Provider error for failed payments.
    pub error_message: Option<String>,
    /// When the payment was created (ISO 8601).
    pub created_at: String,
    /// When the payment reached a terminal state (ISO 8601).
    pub completed_at: Option<String>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            amount_minor: payment.amount_minor,
            status: payment.status,
            external_id: payment.external_id,
            error_message: payment.error_message,
            created_at: payment.created_at.as_datetime().to_rfc3339(),
            completed_at: payment
                .completed_at
                .map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

/// One page of payment history.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistoryResponse {
    /// Payments on this page, newest first.
    pub payments: Vec<PaymentResponse>,
    /// Total payments across all pages.
    pub total_count: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// The requested page.
    pub page: u32,
    /// The requested page size.
    pub page_size: u32,
}

impl PaymentHistoryResponse {
    pub fn from_result(result: PaymentHistoryResult, page: u32, page_size: u32) -> Self {
        Self {
            payments: result
                .payments
                .into_iter()
                .map(PaymentResponse::from)
                .collect(),
            total_count: result.total_count,
            total_pages: result.total_pages,
            page,
            page_size,
        }
    }
}

/// Acknowledgement for a processed webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    /// Outcome of reconciliation.
    pub status: &'static str,

    /// The payment the event applied to, if it matched one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl From<ReconcileWebhookResult> for WebhookResponse {
    fn from(result: ReconcileWebhookResult) -> Self {
        match result {
            ReconcileWebhookResult::Completed { payment_id, .. } => Self {
                status: "completed",
                payment_id: Some(payment_id),
            },
            ReconcileWebhookResult::Failed { payment_id } => Self {
                status: "failed",
                payment_id: Some(payment_id),
            },
            ReconcileWebhookResult::Cancelled { payment_id } => Self {
                status: "cancelled",
                payment_id: Some(payment_id),
            },
            ReconcileWebhookResult::AlreadyProcessed { payment_id, .. } => Self {
                status: "already_processed",
                payment_id: Some(payment_id),
            },
            ReconcileWebhookResult::Ignored => Self {
                status: "ignored",
                payment_id: None,
            },
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
