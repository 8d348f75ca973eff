use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response, Url};
use serde_json::{Map, Value};

use crate::error::{PaymentError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by gateways. `timeout` bounds every call;
/// hitting it surfaces as [`PaymentError::Upstream`].
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_max_idle_per_host(4)
        .build()
}

/// Client used by the gateways' plain constructors, bounded by [`DEFAULT_TIMEOUT`].
pub(crate) fn default_client() -> Client {
    build_client(DEFAULT_TIMEOUT).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to an unconfigured HTTP client");
        Client::new()
    })
}

/// Append `id` to `base` as one percent-encoded path segment, so ids holding
/// `/`, `?` or `#` still address a single resource.
pub(crate) fn resource_url(processor: &'static str, base: &str, id: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| PaymentError::validation(format!("invalid {processor} url {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| PaymentError::validation(format!("{processor} url {base:?} cannot take a path")))?
        .pop_if_empty()
        .push(id);
    Ok(url)
}

/// Reject non-2xx responses, keeping a short excerpt of the body for the error.
pub(crate) async fn ensure_success(processor: &'static str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    tracing::warn!(processor, status = status.as_u16(), "non-success response");
    Err(PaymentError::upstream_status(
        processor,
        status.as_u16(),
        format!("{processor} API error: {status} {excerpt}").trim_end().to_string(),
    ))
}

/// Decode a response body that must be a JSON object.
pub(crate) async fn json_object(processor: &'static str, resp: Response) -> Result<Map<String, Value>> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| PaymentError::from_transport(processor, e))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PaymentError::upstream(
            processor,
            format!("expected a JSON object, got {}", kind(&other)),
        )),
        Err(e) => Err(PaymentError::upstream(
            processor,
            format!("malformed response body: {e}"),
        )),
    }
}

/// Read a string field, treating non-strings as absent.
pub(crate) fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_url_escapes_reserved_characters() {
        let url = resource_url("Lygos", "https://api.example/v1/gateway/payin", "inv#1?x=2/3").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example/v1/gateway/payin/inv%231%3Fx=2%2F3"
        );
        assert!(url.fragment().is_none());
        assert!(url.query().is_none());
    }

    #[test]
    fn resource_url_tolerates_trailing_slash() {
        let url = resource_url("MoneyFusion", "https://pay.example/paiementNotif/", "tok_1").unwrap();
        assert_eq!(url.as_str(), "https://pay.example/paiementNotif/tok_1");
    }

    #[test]
    fn resource_url_rejects_garbage_base() {
        assert!(matches!(
            resource_url("Lygos", "not a url", "x"),
            Err(PaymentError::Validation(_))
        ));
    }
}
