//! In-memory BalanceStore for development and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::balance::Balance;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::BalanceStore;

/// In-memory balance store. Single-process only.
#[derive(Default)]
pub struct InMemoryBalanceStore {
    balances: Mutex<HashMap<String, Balance>>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn credit(&self, user_id: &UserId, amount_minor: i64) -> Result<Balance, DomainError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances
            .entry(user_id.as_str().to_string())
            .or_insert_with(|| Balance::zero(user_id.clone()));

        balance.current_minor += amount_minor;
        balance.total_deposited_minor += amount_minor;
        balance.updated_at = Timestamp::now();

        Ok(balance.clone())
    }

    async fn get(&self, user_id: &UserId) -> Result<Option<Balance>, DomainError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(user_id.as_str())
            .cloned())
    }
}

impl std::fmt::Debug for InMemoryBalanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBalanceStore").finish_non_exhaustive()
    }
}
