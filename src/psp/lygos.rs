use super::{
    lookup_status, ExtraOptions, PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus,
};
use crate::error::{PaymentError, Result};
use crate::http::{default_client, ensure_success, json_object, resource_url, str_field};
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

pub const BASE_URL: &str = "https://api.lygosapp.com/v1";
pub const DEFAULT_SHOP_NAME: &str = "My Shop";

const PROCESSOR: &str = "Lygos";

const STATUS_TABLE: &[(&str, PaymentStatus)] = &[
    ("success", PaymentStatus::Paid),
    ("successful", PaymentStatus::Paid),
    ("paid", PaymentStatus::Paid),
    ("completed", PaymentStatus::Paid),
    ("failed", PaymentStatus::Failed),
    ("failure", PaymentStatus::Failed),
    ("pending", PaymentStatus::Pending),
    ("processing", PaymentStatus::Pending),
    ("canceled", PaymentStatus::Canceled),
    ("cancelled", PaymentStatus::Canceled),
];

/// Per-request overrides for Lygos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LygosOptions {
    /// Shown on the checkout page. Falls back to the gateway's shop name.
    pub shop_name: Option<String>,
}

/// Lygos takes whole amounts only and keys status lookups by the caller's
/// order id, so that id is also the returned transaction id.
pub struct LygosGateway {
    api_key: String,
    base_url: String,
    shop_name: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize, PartialEq)]
struct GatewayPayload<'a> {
    amount: i64,
    shop_name: &'a str,
    order_id: &'a str,
    message: &'a str,
    success_url: &'a str,
    failure_url: &'a str,
}

impl LygosGateway {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(api_key, default_client())
    }

    pub fn with_client(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            shop_name: DEFAULT_SHOP_NAME.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_shop_name(mut self, shop_name: impl Into<String>) -> Self {
        self.shop_name = shop_name.into();
        self
    }

    fn build_payload<'a>(&'a self, request: &'a PaymentRequest) -> Result<GatewayPayload<'a>> {
        request.ensure_positive_amount()?;

        let shop_name = match &request.extra {
            ExtraOptions::None => self.shop_name.as_str(),
            ExtraOptions::Lygos(opts) => opts.shop_name.as_deref().unwrap_or(&self.shop_name),
            ExtraOptions::MoneyFusion(_) => {
                return Err(PaymentError::validation(
                    "MoneyFusion options passed to the Lygos gateway",
                ))
            }
        };

        if !request.amount.fract().is_zero() {
            return Err(PaymentError::validation(format!(
                "Lygos requires integer amounts, {} is not an integer",
                request.amount
            )));
        }
        let amount = request.amount.trunc().to_i64().ok_or_else(|| {
            PaymentError::validation(format!("amount {} is out of range", request.amount))
        })?;

        Ok(GatewayPayload {
            amount,
            shop_name,
            order_id: &request.order_id,
            message: request.description.as_deref().unwrap_or(""),
            success_url: request.return_url.as_deref().unwrap_or(""),
            failure_url: request.cancel_url.as_deref().unwrap_or(""),
        })
    }
}

/// Normalize a Lygos `status` value.
pub fn map_status(raw: &str) -> PaymentStatus {
    lookup_status(STATUS_TABLE, raw)
}

#[async_trait]
impl PaymentGateway for LygosGateway {
    fn name(&self) -> &str {
        PROCESSOR
    }

    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentResponse> {
        let payload = self.build_payload(&request)?;
        let url = format!("{}/gateway", self.base_url);
        tracing::debug!(processor = PROCESSOR, order_id = %request.order_id, %url, "creating payment");

        let resp = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::from_transport(PROCESSOR, e))?;

        let resp = ensure_success(PROCESSOR, resp).await?;
        let data = json_object(PROCESSOR, resp).await?;

        let payment_url = match str_field(&data, "link") {
            Some(link) if !link.is_empty() => link.to_string(),
            _ => return Err(PaymentError::upstream(PROCESSOR, "response missing checkout url")),
        };

        tracing::info!(processor = PROCESSOR, order_id = %request.order_id, "payment created");
        Ok(PaymentResponse {
            payment_url,
            transaction_id: request.order_id,
            raw_response: data,
        })
    }

    async fn check_status(&self, transaction_id: &str) -> Result<PaymentStatus> {
        if transaction_id.is_empty() {
            return Ok(PaymentStatus::Unknown);
        }
        let base = format!("{}/gateway/payin", self.base_url);
        let url = resource_url(PROCESSOR, &base, transaction_id)?;
        tracing::debug!(processor = PROCESSOR, transaction_id, %url, "checking status");

        let resp = self
            .client
            .get(url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| PaymentError::from_transport(PROCESSOR, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            tracing::debug!(processor = PROCESSOR, transaction_id, "transaction not found");
            return Ok(PaymentStatus::Unknown);
        }

        let resp = ensure_success(PROCESSOR, resp).await?;
        let data = json_object(PROCESSOR, resp).await?;
        let raw = str_field(&data, "status").unwrap_or("");
        let status = map_status(raw);
        if status == PaymentStatus::Unknown {
            tracing::warn!(processor = PROCESSOR, transaction_id, raw, "unrecognized status");
        }
        Ok(status)
    }
}
