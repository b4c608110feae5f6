//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Stripe publishable key handed to clients
    pub stripe_publishable_key: String,

    /// ISO currency code for new payments
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Smallest accepted payment, in minor units
    #[serde(default = "default_minimum_amount")]
    pub minimum_amount_minor: i64,

    /// Cancel the local payment when intent creation fails at the
    /// provider. When false the payment stays pending for retry.
    #[serde(default)]
    pub cancel_on_intent_failure: bool,

    /// Reject test mode webhook events
    #[serde(default)]
    pub require_livemode: bool,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_publishable_key: String::new(),
            currency: default_currency(),
            minimum_amount_minor: default_minimum_amount(),
            cancel_on_intent_failure: false,
            require_livemode: false,
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_minimum_amount() -> i64 {
    100
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if self.stripe_publishable_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_PUBLISHABLE_KEY"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.stripe_publishable_key.starts_with("pk_") {
            return Err(ValidationError::InvalidStripePublishableKey);
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.minimum_amount_minor <= 0 {
            return Err(ValidationError::InvalidMinimumAmount);
        }

        Ok(())
    }
}
