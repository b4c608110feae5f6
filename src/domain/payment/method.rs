//! Payment method enumeration.

use serde::{Deserialize, Serialize};

/// How a payment is collected.
///
/// Only provider-routed online payments exist today; the enum leaves
/// room for manual/offline entries without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Collected through the external payment provider.
    Online,
}

impl PaymentMethod {
    /// Returns the canonical string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
        }
    }
}
