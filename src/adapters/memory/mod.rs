//! In-memory adapter implementations for development and tests.

mod balance_store;
mod payment_repository;

pub use balance_store::InMemoryBalanceStore;
pub use payment_repository::InMemoryPaymentRepository;
