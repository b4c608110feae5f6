//! Balance entity.
//!
//! A user's balance is created lazily on first credit and only ever
//! grows through payment completions. The actual increment is atomic
//! at the store layer; this struct is what reads return.

use crate::domain::foundation::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Per-user account balance, in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// User this balance belongs to.
    pub user_id: UserId,

    /// Spendable balance in minor units.
    pub current_minor: i64,

    /// Lifetime sum of completed payments in minor units.
    pub total_deposited_minor: i64,

    /// When the balance was last changed.
    pub updated_at: Timestamp,
}

impl Balance {
    /// Creates a zero balance for a user.
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            current_minor: 0,
            total_deposited_minor: 0,
            updated_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_balance_starts_empty() {
        let balance = Balance::zero(UserId::new("user-1").unwrap());
        assert_eq!(balance.current_minor, 0);
        assert_eq!(balance.total_deposited_minor, 0);
    }

    #[test]
    fn balance_serializes_to_json() {
        let balance = Balance::zero(UserId::new("user-1").unwrap());
        let json = serde_json::to_string(&balance).unwrap();
        assert!(json.contains("current_minor"));
    }
}
