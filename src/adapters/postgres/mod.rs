//! PostgreSQL adapter implementations.
//!
//! Repository and store implementations backed by PostgreSQL via sqlx.

mod balance_repository;
mod payment_repository;

pub use balance_repository::PostgresBalanceStore;
pub use payment_repository::PostgresPaymentRepository;
