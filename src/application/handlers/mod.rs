//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod payment;

pub use payment::{
    GetPaymentHistoryHandler, GetPaymentHistoryQuery, InitializePaymentCommand,
    InitializePaymentConfig, InitializePaymentHandler, InitializePaymentResult,
    PaymentHistoryResult, ReconcileWebhookCommand, ReconcileWebhookHandler,
    ReconcileWebhookResult, MAX_PAGE_SIZE,
};
