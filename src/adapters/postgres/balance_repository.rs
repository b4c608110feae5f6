//! PostgreSQL implementation of BalanceStore.
//!
//! Balances are credited with a single atomic upsert so that concurrent
//! credits for the same user never lose an increment.

use crate::domain::balance::Balance;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::BalanceStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the BalanceStore port.
pub struct PostgresBalanceStore {
    pool: PgPool,
}

impl PostgresBalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    user_id: Uuid,
    current_minor: i64,
    total_deposited_minor: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BalanceRow> for Balance {
    type Error = DomainError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        Ok(Balance {
            user_id: UserId::new(row.user_id.to_string()).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            current_minor: row.current_minor,
            total_deposited_minor: row.total_deposited_minor,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_user_id_as_uuid(user_id: &UserId) -> Result<Uuid, DomainError> {
    Uuid::parse_str(user_id.as_str()).map_err(|e| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("User ID must be a valid UUID: {}", e),
        )
    })
}

#[async_trait]
impl BalanceStore for PostgresBalanceStore {
    async fn credit(&self, user_id: &UserId, amount_minor: i64) -> Result<Balance, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: BalanceRow = sqlx::query_as(
            r#"
            INSERT INTO balances (user_id, current_minor, total_deposited_minor, updated_at)
            VALUES ($1, $2, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                current_minor = balances.current_minor + EXCLUDED.current_minor,
                total_deposited_minor = balances.total_deposited_minor + EXCLUDED.total_deposited_minor,
                updated_at = NOW()
            RETURNING user_id, current_minor, total_deposited_minor, updated_at
            "#,
        )
        .bind(user_uuid)
        .bind(amount_minor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to credit balance: {}", e))
        })?;

        Balance::try_from(row)
    }

    async fn get(&self, user_id: &UserId) -> Result<Option<Balance>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: Option<BalanceRow> = sqlx::query_as(
            "SELECT user_id, current_minor, total_deposited_minor, updated_at \
             FROM balances WHERE user_id = $1",
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to load balance: {}", e))
        })?;

        row.map(Balance::try_from).transpose()
    }
}
