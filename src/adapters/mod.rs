//! Adapters layer - Infrastructure implementations of ports.
//!
//! Each adapter implements one or more ports against a concrete
//! technology: PostgreSQL for persistence, Redis for caching, Stripe
//! for payments, Axum for HTTP. In-memory variants back tests and
//! local development.

pub mod cache;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
