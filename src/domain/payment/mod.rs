//! Payment domain - payment lifecycle and webhook reconciliation.

mod aggregate;
mod errors;
mod method;
mod status;

pub use aggregate::Payment;
pub use errors::PaymentError;
pub use method::PaymentMethod;
pub use status::PaymentStatus;
