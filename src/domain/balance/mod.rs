//! Balance domain - per-user account balance.

mod balance;

pub use balance::Balance;
