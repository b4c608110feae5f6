//! Axum router configuration for payment endpoints.
//!
//! This module defines the route structure for payment-related API endpoints
//! and wires them to their corresponding handlers.

use axum::{routing::post, Router};

use super::handlers::{
    get_payment_history, handle_stripe_webhook, initialize_payment, PaymentAppState,
};

/// Create the payment API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `POST /` - Initialize a payment
/// - `GET /` - Get current user's payment history
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new().route("/", post(initialize_payment).get(get_payment_history))
}

/// Create the webhook router.
///
/// This is separate from the main payment routes because webhooks
/// don't require user authentication (they're verified via signature).
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<PaymentAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete payment module router.
///
/// Combines user routes and webhook routes into a single router
/// suitable for mounting at `/api`.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use crate::adapters::http::payment::{payment_router, PaymentAppState};
///
/// let app_state = PaymentAppState { /* ... */ };
/// let app = Router::new()
///     .nest("/api", payment_router())
///     .with_state(app_state);
/// ```
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/webhooks", webhook_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{InMemoryBalanceStore, InMemoryPaymentRepository};
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::application::handlers::payment::InitializePaymentConfig;

    fn test_state() -> PaymentAppState {
        PaymentAppState {
            payment_repository: Arc::new(InMemoryPaymentRepository::new()),
            balance_store: Arc::new(InMemoryBalanceStore::new()),
            payment_provider: Arc::new(MockPaymentProvider::new()),
            payment_config: InitializePaymentConfig {
                minimum_amount_minor: 100,
                currency: "usd".to_string(),
                publishable_key: "pk_test_key".to_string(),
                cancel_on_intent_failure: false,
            },
        }
    }

    #[test]
    fn payment_routes_creates_router() {
        let router = payment_routes();
        // Just verify it creates without panic
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn webhook_routes_creates_router() {
        let router = webhook_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn payment_router_creates_combined_router() {
        let router = payment_router();
        let _: Router<()> = router.with_state(test_state());
    }
}
