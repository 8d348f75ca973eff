use super::{PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus};
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Map};

const PREFIX: &str = "mock_";

/// Offline gateway for local development. Never touches the network and
/// reports the same status for every payment it issued.
pub struct MockGateway {
    status: PaymentStatus,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::with_status(PaymentStatus::Paid)
    }

    pub fn with_status(status: PaymentStatus) -> Self {
        Self { status }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentResponse> {
        request.ensure_positive_amount()?;

        let suffix: u32 = rand::thread_rng().gen();
        let token = format!(
            "{PREFIX}{}_{suffix:08x}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
        );
        let payment_url = format!("https://checkout.mock.invalid/{token}");

        let mut raw = Map::new();
        raw.insert("token".into(), json!(token));
        raw.insert("url".into(), json!(payment_url));
        raw.insert("order_id".into(), json!(request.order_id));
        raw.insert("amount".into(), json!(request.amount.to_string()));

        tracing::debug!(order_id = %request.order_id, token = %token, "mock payment created");
        Ok(PaymentResponse {
            payment_url,
            transaction_id: token,
            raw_response: raw,
        })
    }

    async fn check_status(&self, transaction_id: &str) -> Result<PaymentStatus> {
        if transaction_id.starts_with(PREFIX) {
            Ok(self.status)
        } else {
            Ok(PaymentStatus::Unknown)
        }
    }
}
