use crate::types::{
    PaymentIntentRequest, PaymentOrderResponse, VerificationReceipt, VerificationRequest,
};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod http;

pub use http::HttpPaymentsApi;

/// Backend error codes understood before falling back to message matching.
const CODE_ORDER_NOT_FOUND: &str = "order_not_found";
const CODE_AUTHENTICATION_FAILED: &str = "authentication_failed";

/// Backend failure, classified once at the client boundary.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The order record is not visible to the payments service yet.
    #[error("Order not found")]
    OrderNotFound { payload: Option<Value> },
    #[error("{message}")]
    Authentication {
        message: String,
        payload: Option<Value>,
    },
    #[error("{message}")]
    Backend {
        status: u16,
        message: String,
        payload: Option<Value>,
    },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ApiError {
    /// Classifies a non-2xx response.
    ///
    /// A structured `code` field wins. Without one, the `error`/`detail`
    /// strings are matched the way the storefront backend words them. The
    /// substring match is a compatibility path and misfires if the backend
    /// rewords its messages.
    pub fn from_response(status: u16, payload: Option<Value>) -> Self {
        let message = payload
            .as_ref()
            .and_then(Self::message_from_payload)
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        let error_field = payload
            .as_ref()
            .and_then(|p| p.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);

        match payload
            .as_ref()
            .and_then(|p| p.get("code"))
            .and_then(Value::as_str)
        {
            Some(CODE_ORDER_NOT_FOUND) => return ApiError::OrderNotFound { payload },
            Some(CODE_AUTHENTICATION_FAILED) => {
                return ApiError::Authentication { message, payload };
            }
            _ => {}
        }

        if error_field.as_deref() == Some("Order not found") {
            return ApiError::OrderNotFound { payload };
        }
        let auth_in_error = error_field
            .as_deref()
            .is_some_and(|e| e.to_lowercase().contains("authentication"));
        if auth_in_error || message.contains("Authentication failed") {
            return ApiError::Authentication { message, payload };
        }
        ApiError::Backend {
            status,
            message,
            payload,
        }
    }

    fn message_from_payload(payload: &Value) -> Option<String> {
        ["error", "detail", "message"]
            .iter()
            .find_map(|field| payload.get(*field).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// Structured body returned with the error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::OrderNotFound { payload }
            | ApiError::Authentication { payload, .. }
            | ApiError::Backend { payload, .. } => payload.as_ref(),
            ApiError::NetworkError(_) | ApiError::ParseError(_) => None,
        }
    }

    pub fn is_order_not_found(&self) -> bool {
        matches!(self, ApiError::OrderNotFound { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication { .. })
    }
}

/// The storefront backend's payments endpoints.
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    async fn create_payment_order(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentOrderResponse, ApiError>;

    async fn verify_payment(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationReceipt, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_not_found_by_error_field() {
        let err = ApiError::from_response(
            404,
            Some(json!({"error": "Order not found", "orderId": "ord_1"})),
        );
        assert!(err.is_order_not_found());
        assert_eq!(err.payload().unwrap()["orderId"], "ord_1");
    }

    #[test]
    fn test_structured_code_wins_over_message() {
        let err = ApiError::from_response(
            404,
            Some(json!({"error": "Something else", "code": "order_not_found"})),
        );
        assert!(err.is_order_not_found());

        let err = ApiError::from_response(
            500,
            Some(json!({"error": "Order not found", "code": "authentication_failed"})),
        );
        assert!(err.is_authentication());
    }

    #[test]
    fn test_authentication_by_substring() {
        let err = ApiError::from_response(
            401,
            Some(json!({"error": "Razorpay authentication failed", "details": "check keys"})),
        );
        assert!(err.is_authentication());
        assert_eq!(err.to_string(), "Razorpay authentication failed");

        let err = ApiError::from_response(
            400,
            Some(json!({"detail": "Authentication failed for merchant"})),
        );
        assert!(err.is_authentication());
    }

    #[test]
    fn test_other_errors_are_backend_errors() {
        let err = ApiError::from_response(
            500,
            Some(json!({"error": "Failed to create payment order"})),
        );
        match err {
            ApiError::Backend {
                status, message, ..
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to create payment order");
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_missing_payload_gets_generic_message() {
        let err = ApiError::from_response(502, None);
        assert_eq!(err.to_string(), "Request failed with status 502");
        assert!(err.payload().is_none());
    }

    #[test]
    fn test_not_found_with_different_wording_is_not_retryable() {
        let err = ApiError::from_response(404, Some(json!({"error": "Payment not found"})));
        assert!(!err.is_order_not_found());
    }
}
