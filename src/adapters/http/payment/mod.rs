//! HTTP adapter for the payment API.

mod dto;
mod handlers;
mod routes;

pub use handlers::{AuthenticatedUser, PaymentApiError, PaymentAppState};
pub use routes::{payment_router, payment_routes, webhook_routes};
