use super::{
    lookup_status, ExtraOptions, PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus,
};
use crate::error::{PaymentError, Result};
use crate::http::{default_client, ensure_success, json_object, resource_url, str_field};
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_URL: &str = "https://www.pay.moneyfusion.net/paiementNotif";
pub const DEFAULT_CUSTOMER_NAME: &str = "Customer";
pub const DEFAULT_ITEM: &str = "Payment";

const PROCESSOR: &str = "MoneyFusion";

// "no paid" means the customer hasn't paid yet, so it stays pending.
const STATUS_TABLE: &[(&str, PaymentStatus)] = &[
    ("paid", PaymentStatus::Paid),
    ("failure", PaymentStatus::Failed),
    ("pending", PaymentStatus::Pending),
    ("no paid", PaymentStatus::Pending),
];

/// A checkout line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub item: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Merchant metadata echoed back by MoneyFusion in its notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(rename = "orderId", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-request overrides for MoneyFusion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoneyFusionOptions {
    /// Replaces the single synthesized line item.
    pub articles: Option<Vec<Article>>,
    /// Replaces the default `[{orderId}]` entry.
    pub personal_info: Option<Vec<PersonalInfo>>,
}

/// MoneyFusion requires a phone number, wraps the result in its own
/// `statut` flag and keys status checks by a token it issues. Creation and
/// status checks live on different hosts.
pub struct MoneyFusionGateway {
    api_url: String,
    status_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreatePayload<'a> {
    #[serde(rename = "totalPrice", with = "rust_decimal::serde::float")]
    total_price: Decimal,
    article: Vec<Article>,
    #[serde(rename = "personal_Info")]
    personal_info: Vec<PersonalInfo>,
    #[serde(rename = "numeroSend")]
    numero_send: &'a str,
    nomclient: &'a str,
    return_url: Option<&'a str>,
    webhook_url: Option<&'a str>,
}

impl MoneyFusionGateway {
    /// `api_url` is the merchant-specific creation endpoint from the MoneyFusion dashboard.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(api_url, default_client())
    }

    pub fn with_client(api_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_url: api_url.into(),
            status_url: STATUS_URL.to_string(),
            client,
        }
    }

    pub fn with_status_url(mut self, status_url: impl Into<String>) -> Self {
        self.status_url = status_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_payload<'a>(&self, request: &'a PaymentRequest) -> Result<CreatePayload<'a>> {
        request.ensure_positive_amount()?;

        let opts = match &request.extra {
            ExtraOptions::None => None,
            ExtraOptions::MoneyFusion(opts) => Some(opts),
            ExtraOptions::Lygos(_) => {
                return Err(PaymentError::validation(
                    "Lygos options passed to the MoneyFusion gateway",
                ))
            }
        };

        let phone = request
            .customer_phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PaymentError::validation("customer_phone is required for MoneyFusion"))?;

        let article = opts
            .and_then(|o| o.articles.clone())
            .unwrap_or_else(|| {
                vec![Article {
                    item: request.description.clone().unwrap_or_else(|| DEFAULT_ITEM.to_string()),
                    price: request.amount,
                }]
            });
        let personal_info = opts
            .and_then(|o| o.personal_info.clone())
            .unwrap_or_else(|| {
                vec![PersonalInfo {
                    order_id: Some(request.order_id.clone()),
                    extra: Map::new(),
                }]
            });

        Ok(CreatePayload {
            total_price: request.amount,
            article,
            personal_info,
            numero_send: phone,
            nomclient: request
                .customer_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_CUSTOMER_NAME),
            return_url: request.return_url.as_deref(),
            webhook_url: request.webhook_url.as_deref(),
        })
    }
}

/// Normalize the inner `data.statut` value of a status response.
pub fn map_status(raw: &str) -> PaymentStatus {
    lookup_status(STATUS_TABLE, raw)
}

fn flag(data: &Map<String, Value>) -> bool {
    matches!(data.get("statut"), Some(Value::Bool(true)))
}

/// Interpret a decoded status body: a false top-level flag means the token
/// is unknown to MoneyFusion.
fn status_from_body(data: &Map<String, Value>) -> PaymentStatus {
    if !flag(data) {
        return PaymentStatus::Unknown;
    }
    let raw = data
        .get("data")
        .and_then(Value::as_object)
        .and_then(|inner| str_field(inner, "statut"))
        .unwrap_or("");
    map_status(raw)
}

#[async_trait]
impl PaymentGateway for MoneyFusionGateway {
    fn name(&self) -> &str {
        PROCESSOR
    }

    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentResponse> {
        let payload = self.build_payload(&request)?;
        tracing::debug!(processor = PROCESSOR, order_id = %request.order_id, url = %self.api_url, "creating payment");

        let resp = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::from_transport(PROCESSOR, e))?;

        let resp = ensure_success(PROCESSOR, resp).await?;
        let data = json_object(PROCESSOR, resp).await?;

        if !flag(&data) {
            let message = str_field(&data, "message").unwrap_or("no message provided");
            tracing::warn!(processor = PROCESSOR, order_id = %request.order_id, reason = message, "payment declined");
            return Err(PaymentError::declined(PROCESSOR, message));
        }

        let payment_url = match str_field(&data, "url") {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => return Err(PaymentError::upstream(PROCESSOR, "response missing checkout url")),
        };
        let token = match str_field(&data, "token") {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => return Err(PaymentError::upstream(PROCESSOR, "response missing token")),
        };

        tracing::info!(processor = PROCESSOR, order_id = %request.order_id, token = %token, "payment created");
        Ok(PaymentResponse {
            payment_url,
            transaction_id: token,
            raw_response: data,
        })
    }

    async fn check_status(&self, transaction_id: &str) -> Result<PaymentStatus> {
        if transaction_id.is_empty() {
            return Ok(PaymentStatus::Unknown);
        }
        let url = resource_url(PROCESSOR, &self.status_url, transaction_id)?;
        tracing::debug!(processor = PROCESSOR, transaction_id, %url, "checking status");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PaymentError::from_transport(PROCESSOR, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            tracing::debug!(processor = PROCESSOR, transaction_id, "token not found");
            return Ok(PaymentStatus::Unknown);
        }

        let resp = ensure_success(PROCESSOR, resp).await?;
        let data = json_object(PROCESSOR, resp).await?;
        let status = status_from_body(&data);
        if status == PaymentStatus::Unknown {
            tracing::warn!(processor = PROCESSOR, transaction_id, "status unavailable or unrecognized");
        }
        Ok(status)
    }
}
