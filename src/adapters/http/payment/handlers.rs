//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::payment::{
    GetPaymentHistoryHandler, GetPaymentHistoryQuery, InitializePaymentCommand,
    InitializePaymentConfig, InitializePaymentHandler, ReconcileWebhookCommand,
    ReconcileWebhookHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::payment::PaymentError;
use crate::ports::{BalanceStore, PaymentProvider, PaymentRepository};

use super::dto::{
    ErrorResponse, InitializePaymentRequest, InitializePaymentResponse, PaymentHistoryParams,
    PaymentHistoryResponse, WebhookResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct PaymentAppState {
    pub payment_repository: Arc<dyn PaymentRepository>,
    pub balance_store: Arc<dyn BalanceStore>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub payment_config: InitializePaymentConfig,
}

impl PaymentAppState {
    /// Create handlers on demand from the shared state.
    pub fn initialize_payment_handler(&self) -> InitializePaymentHandler {
        InitializePaymentHandler::new(
            self.payment_repository.clone(),
            self.payment_provider.clone(),
            self.payment_config.clone(),
        )
    }

    pub fn reconcile_webhook_handler(&self) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            self.payment_repository.clone(),
            self.balance_store.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn payment_history_handler(&self) -> GetPaymentHistoryHandler {
        GetPaymentHistoryHandler::new(self.payment_repository.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from request.
///
/// In production, this would be extracted from JWT/session by auth middleware.
/// For now, uses a header-based extraction for development/testing.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // In production, this would validate JWT token from Authorization header
            // For development, we accept an X-User-Id header
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments - Initialize a payment
pub async fn initialize_payment(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Json(request): Json<InitializePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.initialize_payment_handler();
    let cmd = InitializePaymentCommand {
        user_id: user.user_id,
        amount_minor: request.amount_minor,
        return_url: request.return_url,
        description: request.description,
    };

    let result = handler.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(InitializePaymentResponse::from(result)),
    ))
}

/// POST /api/webhooks/stripe - Handle payment provider webhook events
pub async fn handle_stripe_webhook(
    State(state): State<PaymentAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, PaymentApiError> {
    // Extract Stripe signature header
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::InvalidWebhookSignature)?;

    let handler = state.reconcile_webhook_handler();
    let cmd = ReconcileWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::OK, Json(WebhookResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/payments - Get current user's payment history
pub async fn get_payment_history(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Query(params): Query<PaymentHistoryParams>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.payment_history_handler();
    let query = GetPaymentHistoryQuery {
        user_id: user.user_id,
        page: params.page,
        page_size: params.page_size,
    };

    let result = handler.handle(query).await?;

    Ok(Json(PaymentHistoryResponse::from_result(
        result,
        params.page,
        params.page_size,
    )))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct PaymentApiError(PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl From<crate::domain::foundation::DomainError> for PaymentApiError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        Self(PaymentError::from(err))
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            PaymentError::NotFound(_) | PaymentError::UnmatchedWebhook { .. } => {
                StatusCode::NOT_FOUND
            }
            PaymentError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PaymentError::InvalidState { .. } => StatusCode::CONFLICT,
            PaymentError::InvalidWebhookSignature => StatusCode::UNAUTHORIZED,
            PaymentError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
            PaymentError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}
