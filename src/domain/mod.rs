//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `payment` - Payment lifecycle and webhook reconciliation rules
//! - `balance` - Per-user account balance

pub mod balance;
pub mod foundation;
pub mod payment;
