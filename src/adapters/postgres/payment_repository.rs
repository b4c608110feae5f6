//! PostgreSQL implementation of PaymentRepository.
//!
//! Provides persistent storage for Payment aggregates using PostgreSQL.
//! Terminal transitions are single conditional UPDATEs so that
//! concurrent duplicate webhooks cannot both apply.

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, Timestamp, TransactionId, UserId,
};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::ports::{PaymentRepository, PaymentTransition, TransitionOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, user_id, amount_minor, method, status, external_id, \
     transaction_id, external_data, error_message, created_at, completed_at";

/// PostgreSQL implementation of the PaymentRepository port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    /// Creates a new PostgresPaymentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    amount_minor: i64,
    method: String,
    status: String,
    external_id: Option<String>,
    transaction_id: Option<Uuid>,
    external_data: Option<serde_json::Value>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::new(row.user_id.to_string()).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            amount_minor: row.amount_minor,
            method: parse_method(&row.method)?,
            status: parse_status(&row.status)?,
            external_id: row.external_id,
            transaction_id: row.transaction_id.map(TransactionId::from_uuid),
            external_data: row.external_data,
            error_message: row.error_message,
            created_at: Timestamp::from_datetime(row.created_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_method(s: &str) -> Result<PaymentMethod, DomainError> {
    match s.to_lowercase().as_str() {
        "online" => Ok(PaymentMethod::Online),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid method value: {}", s),
        )),
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        "cancelled" => Ok(PaymentStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

fn status_to_string(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Cancelled => "cancelled",
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
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&payment.user_id)?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, amount_minor, method, status, external_id,
                transaction_id, external_data, error_message, created_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(user_uuid)
        .bind(payment.amount_minor)
        .bind(payment.method.as_str())
        .bind(status_to_string(&payment.status))
        .bind(&payment.external_id)
        .bind(payment.transaction_id.map(|t| *t.as_uuid()))
        .bind(&payment.external_data)
        .bind(&payment.error_message)
        .bind(payment.created_at.as_datetime())
        .bind(payment.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_pkey") {
                    return DomainError::new(
                        ErrorCode::ValidationFailed,
                        "Payment with this id already exists",
                    );
                }
            }
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save payment: {}", e))
        })?;

        Ok(())
    }

    async fn attach_external_id(
        &self,
        id: &PaymentId,
        external_id: &str,
    ) -> Result<(), DomainError> {
        // Write-once: only a NULL or identical external_id is updated.
        let result = sqlx::query(
            r#"
            UPDATE payments SET external_id = $2
            WHERE id = $1 AND (external_id IS NULL OR external_id = $2)
            "#,
        )
        .bind(id.as_uuid())
        .bind(external_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to attach external id: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(id).await? {
                None => Err(DomainError::new(
                    ErrorCode::PaymentNotFound,
                    "Payment not found",
                )),
                Some(_) => Err(DomainError::new(
                    ErrorCode::PaymentAlreadyLinked,
                    format!("Payment {} already linked to a different provider id", id),
                )),
            };
        }

        Ok(())
    }

    async fn transition_if_pending(
        &self,
        id: &PaymentId,
        transition: PaymentTransition,
    ) -> Result<TransitionOutcome, DomainError> {
        let now = Utc::now();
        let target = status_to_string(&transition.target_status());

        let (transaction_id, external_data, error_message) = match transition {
            PaymentTransition::Completed {
                transaction_id,
                external_data,
            } => (Some(*transaction_id.as_uuid()), external_data, None),
            PaymentTransition::Failed { error_message } => (None, None, Some(error_message)),
            PaymentTransition::Cancelled => (None, None, None),
        };

        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payments SET
                status = $2,
                transaction_id = $3,
                external_data = $4,
                error_message = $5,
                completed_at = $6
            WHERE id = $1 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(id.as_uuid())
        .bind(target)
        .bind(transaction_id)
        .bind(external_data)
        .bind(error_message)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to transition payment: {}", e),
            )
        })?;

        if let Some(row) = row {
            return Ok(TransitionOutcome::Applied(Payment::try_from(row)?));
        }

        // Nothing matched: the payment is missing or already terminal.
        match self.find_by_id(id).await? {
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                "Payment not found",
            )),
            Some(payment) => Ok(TransitionOutcome::NotPending(payment.status)),
        }
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_uuid)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to list payments: {}", e))
        })?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn count_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = $1")
            .bind(user_uuid)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to count payments: {}", e),
                )
            })?;

        Ok(count as u64)
    }
}
