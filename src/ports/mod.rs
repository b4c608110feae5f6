//! Ports layer - async contracts between the application core and the
//! outside world. Adapters implement these; handlers depend on them.

mod balance_store;
mod cache_store;
mod payment_provider;
mod payment_repository;

pub use balance_store::BalanceStore;
pub use cache_store::CacheStore;
pub use payment_provider::{
    CreateIntentRequest, PaymentIntent, PaymentObject, PaymentProvider, ProviderError,
    ProviderErrorCode, WebhookEvent, WebhookEventType,
};
pub use payment_repository::{PaymentRepository, PaymentTransition, TransitionOutcome};
