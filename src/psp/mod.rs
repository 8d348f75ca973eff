pub mod lygos;
pub mod mock;
pub mod money_fusion;

use std::fmt;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PaymentError, Result};

pub use lygos::{LygosGateway, LygosOptions};
pub use mock::MockGateway;
pub use money_fusion::{Article, MoneyFusionGateway, MoneyFusionOptions, PersonalInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Canceled,
    Unknown,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }

    /// True once the status can no longer change.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful `create_payment`.
///
/// `transaction_id` is whatever the issuing gateway needs for
/// `check_status`. Treat it as opaque and only hand it back to the same
/// gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_url: String,
    pub transaction_id: String,
    pub raw_response: Map<String, Value>,
}

/// Processor-specific settings that don't fit the generic request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExtraOptions {
    #[default]
    None,
    Lygos(LygosOptions),
    MoneyFusion(MoneyFusionOptions),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub order_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub webhook_url: Option<String>,
    pub description: Option<String>,
    pub extra: ExtraOptions,
}

impl PaymentRequest {
    pub fn new(amount: Decimal, order_id: impl Into<String>) -> Self {
        Self {
            amount,
            order_id: order_id.into(),
            customer_name: None,
            customer_phone: None,
            return_url: None,
            cancel_url: None,
            webhook_url: None,
            description: None,
            extra: ExtraOptions::None,
        }
    }

    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn customer_phone(mut self, phone: impl Into<String>) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    pub fn return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }

    pub fn cancel_url(mut self, url: impl Into<String>) -> Self {
        self.cancel_url = Some(url.into());
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn extra(mut self, extra: ExtraOptions) -> Self {
        self.extra = extra;
        self
    }

    pub(crate) fn ensure_positive_amount(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(PaymentError::validation(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &str;

    /// Start a hosted checkout. Issues exactly one HTTP request unless
    /// validation fails first.
    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentResponse>;

    /// Poll a payment. A transaction the processor doesn't know yields
    /// `PaymentStatus::Unknown`, not an error.
    async fn check_status(&self, transaction_id: &str) -> Result<PaymentStatus>;
}

/// Map a raw processor status through `table`. Matching is on the
/// lower-cased input; anything else is `Unknown`.
pub(crate) fn lookup_status(table: &[(&str, PaymentStatus)], raw: &str) -> PaymentStatus {
    let needle = raw.to_lowercase();
    table
        .iter()
        .find(|(key, _)| *key == needle)
        .map(|(_, status)| *status)
        .unwrap_or(PaymentStatus::Unknown)
}
