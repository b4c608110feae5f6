//! ReconcileWebhookHandler - Command handler for provider payment webhooks.
//!
//! Drives each payment from Pending to exactly one terminal state off
//! at-least-once webhook deliveries. Duplicate and out-of-order
//! deliveries are safe: the terminal write is a conditional update at
//! the store, and the balance credit only happens when that update
//! actually applied.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::foundation::TransactionId;
use crate::domain::payment::{Payment, PaymentError, PaymentStatus};
use crate::ports::{
    BalanceStore, PaymentObject, PaymentProvider, PaymentRepository, PaymentTransition,
    TransitionOutcome, WebhookEventType,
};

/// Command to reconcile one webhook delivery.
#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    /// Raw webhook payload.
    pub payload: Vec<u8>,
    /// Webhook signature header.
    pub signature: String,
}

/// Result of webhook reconciliation.
#[derive(Debug, Clone)]
pub enum ReconcileWebhookResult {
    /// Payment completed and the balance was credited.
    Completed {
        payment_id: String,
        credited_minor: i64,
    },
    /// Payment marked failed.
    Failed { payment_id: String },
    /// Payment cancelled.
    Cancelled { payment_id: String },
    /// Payment was already in a terminal state; nothing changed.
    /// Success so the provider stops redelivering.
    AlreadyProcessed {
        payment_id: String,
        status: PaymentStatus,
    },
    /// Event type we don't recognize; acknowledged without action.
    Ignored,
}

/// Handler for provider payment webhooks.
///
/// Correlates the webhook to a payment, applies the terminal
/// transition, and credits the balance on completion.
pub struct ReconcileWebhookHandler {
    repository: Arc<dyn PaymentRepository>,
    balance_store: Arc<dyn BalanceStore>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl ReconcileWebhookHandler {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        balance_store: Arc<dyn BalanceStore>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            repository,
            balance_store,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileWebhookCommand,
    ) -> Result<ReconcileWebhookResult, PaymentError> {
        // 1. Verify webhook signature and parse event
        let webhook_event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await
            .map_err(|_| PaymentError::invalid_webhook_signature())?;

        // 2. Process based on event type
        match webhook_event.event_type {
            WebhookEventType::PaymentSucceeded => {
                self.handle_payment_succeeded(&webhook_event.object).await
            }
            WebhookEventType::PaymentFailed => {
                self.handle_payment_failed(&webhook_event.object).await
            }
            WebhookEventType::PaymentCanceled => {
                self.handle_payment_canceled(&webhook_event.object).await
            }
            WebhookEventType::Unknown(event_type) => {
                info!(
                    event_id = %webhook_event.id,
                    event_type = %event_type,
                    "Ignoring unrecognized webhook event type"
                );
                Ok(ReconcileWebhookResult::Ignored)
            }
        }
    }

    /// Find the payment a webhook object refers to.
    ///
    /// Lookup order: the provider's payment id, then the internal
    /// `payment_id` carried in metadata. A metadata match links the
    /// payment to the provider id before anything else happens, so
    /// subsequent deliveries take the primary path.
    async fn correlate(&self, object: &PaymentObject) -> Result<Payment, PaymentError> {
        if let Some(payment) = self.repository.find_by_external_id(&object.id).await? {
            return Ok(payment);
        }

        if let Some(payment_id) = object.metadata_payment_id() {
            if let Some(mut payment) = self.repository.find_by_id(&payment_id).await? {
                self.repository
                    .attach_external_id(&payment.id, &object.id)
                    .await?;
                payment.external_id = Some(object.id.clone());
                info!(
                    payment_id = %payment.id,
                    external_id = %object.id,
                    "Linked payment to provider id via webhook metadata"
                );
                return Ok(payment);
            }
        }

        Err(PaymentError::unmatched_webhook(object.id.clone()))
    }

    async fn handle_payment_succeeded(
        &self,
        object: &PaymentObject,
    ) -> Result<ReconcileWebhookResult, PaymentError> {
        let payment = self.correlate(object).await?;

        // The provider is authoritative for money movement. A mismatch
        // is logged and the webhook amount is credited.
        if object.amount_minor != payment.amount_minor {
            warn!(
                payment_id = %payment.id,
                expected_minor = payment.amount_minor,
                reported_minor = object.amount_minor,
                "Webhook amount differs from recorded amount; crediting reported amount"
            );
        }

        let transition = PaymentTransition::Completed {
            transaction_id: TransactionId::new(),
            external_data: serde_json::to_value(object).ok(),
        };

        match self
            .repository
            .transition_if_pending(&payment.id, transition)
            .await?
        {
            TransitionOutcome::Applied(payment) => {
                let balance = self
                    .balance_store
                    .credit(&payment.user_id, object.amount_minor)
                    .await?;

                info!(
                    payment_id = %payment.id,
                    user_id = %payment.user_id,
                    credited_minor = object.amount_minor,
                    balance_minor = balance.current_minor,
                    "Payment completed and balance credited"
                );

                Ok(ReconcileWebhookResult::Completed {
                    payment_id: payment.id.to_string(),
                    credited_minor: object.amount_minor,
                })
            }
            TransitionOutcome::NotPending(status) => Ok(ReconcileWebhookResult::AlreadyProcessed {
                payment_id: payment.id.to_string(),
                status,
            }),
        }
    }

    async fn handle_payment_failed(
        &self,
        object: &PaymentObject,
    ) -> Result<ReconcileWebhookResult, PaymentError> {
        let payment = self.correlate(object).await?;

        let transition = PaymentTransition::Failed {
            error_message: object
                .error_message
                .clone()
                .unwrap_or_else(|| "Payment failed".to_string()),
        };

        match self
            .repository
            .transition_if_pending(&payment.id, transition)
            .await?
        {
            TransitionOutcome::Applied(payment) => {
                info!(
                    payment_id = %payment.id,
                    user_id = %payment.user_id,
                    "Payment marked failed"
                );
                Ok(ReconcileWebhookResult::Failed {
                    payment_id: payment.id.to_string(),
                })
            }
            TransitionOutcome::NotPending(status) => Ok(ReconcileWebhookResult::AlreadyProcessed {
                payment_id: payment.id.to_string(),
                status,
            }),
        }
    }

    async fn handle_payment_canceled(
        &self,
        object: &PaymentObject,
    ) -> Result<ReconcileWebhookResult, PaymentError> {
        let payment = self.correlate(object).await?;

        match self
            .repository
            .transition_if_pending(&payment.id, PaymentTransition::Cancelled)
            .await?
        {
            TransitionOutcome::Applied(payment) => {
                info!(
                    payment_id = %payment.id,
                    user_id = %payment.user_id,
                    "Payment cancelled"
                );
                Ok(ReconcileWebhookResult::Cancelled {
                    payment_id: payment.id.to_string(),
                })
            }
            TransitionOutcome::NotPending(status) => Ok(ReconcileWebhookResult::AlreadyProcessed {
                payment_id: payment.id.to_string(),
                status,
            }),
        }
    }
}
