//! Payment command and query handlers.

mod get_payment_history;
mod initialize_payment;
mod reconcile_webhook;

pub use get_payment_history::{
    GetPaymentHistoryHandler, GetPaymentHistoryQuery, PaymentHistoryResult, MAX_PAGE_SIZE,
};
pub use initialize_payment::{
    InitializePaymentCommand, InitializePaymentConfig, InitializePaymentHandler,
    InitializePaymentResult,
};
pub use reconcile_webhook::{
    ReconcileWebhookCommand, ReconcileWebhookHandler, ReconcileWebhookResult,
};
