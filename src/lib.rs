//! Billing Core - Payment lifecycle and webhook reconciliation service
//!
//! This crate manages online payments against an external payment provider:
//! initializing payment intents, reconciling provider webhooks against
//! stored payments, and crediting user balances exactly once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
