use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Debug, Error)]
pub enum PaymentError {
    /// The request breaks a processor precondition. Raised before any HTTP call.
    #[error("invalid payment request: {0}")]
    Validation(String),

    /// Transport failure, non-success HTTP status or an undecodable body.
    #[error("{processor} upstream error: {message}")]
    Upstream {
        processor: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The processor answered successfully at the HTTP level but refused the payment.
    #[error("{processor} declined the payment: {message}")]
    Declined {
        processor: &'static str,
        message: String,
    },
}

impl PaymentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(processor: &'static str, msg: impl Into<String>) -> Self {
        Self::Upstream {
            processor,
            status: None,
            message: msg.into(),
        }
    }

    pub fn upstream_status(processor: &'static str, status: u16, msg: impl Into<String>) -> Self {
        Self::Upstream {
            processor,
            status: Some(status),
            message: msg.into(),
        }
    }

    pub fn declined(processor: &'static str, msg: impl Into<String>) -> Self {
        Self::Declined {
            processor,
            message: msg.into(),
        }
    }

    pub fn from_transport(processor: &'static str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else if err.is_decode() {
            format!("malformed response body: {err}")
        } else {
            err.to_string()
        };
        Self::Upstream {
            processor,
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    /// Whether repeating the same request might succeed. 4xx answers and
    /// validation or decline errors need a different request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => !matches!(status, Some(s) if (400..500).contains(s)),
            Self::Validation(_) | Self::Declined { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_only_for_transport_and_server_errors() {
        assert!(PaymentError::upstream("Lygos", "connection reset").is_retryable());
        assert!(PaymentError::upstream_status("Lygos", 503, "unavailable").is_retryable());
        assert!(!PaymentError::upstream_status("Lygos", 401, "bad key").is_retryable());
        assert!(!PaymentError::validation("amount").is_retryable());
        assert!(!PaymentError::declined("MoneyFusion", "insufficient funds").is_retryable());
    }

    #[test]
    fn messages_name_the_processor() {
        let err = PaymentError::declined("MoneyFusion", "insufficient funds");
        assert_eq!(
            err.to_string(),
            "MoneyFusion declined the payment: insufficient funds"
        );
    }
}
