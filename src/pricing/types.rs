//! Wire types for the `/retail` and `/wholesale` operations.

use serde::{Deserialize, Serialize};

use crate::endpoint::{Operation, OperationRequest};
use crate::error::{PricingError, PricingResult, INVALID_REQUEST};

/// Request payload for a retail total.
///
/// Missing fields decode to their zero values so that an empty object is
/// answered with a validation error rather than `Invalid Request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetailRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub qty: i64,
}

/// Request payload for a wholesale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WholesaleRequest {
    #[serde(default)]
    pub partner: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub qty: i64,
}

impl OperationRequest for RetailRequest {
    const OPERATION: Operation = Operation::Retail;
}

impl OperationRequest for WholesaleRequest {
    const OPERATION: Operation = Operation::Wholesale;
}

/// Response payload shared by both operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PricingResponse {
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl PricingResponse {
    pub fn ok(total: f64) -> Self {
        Self { total, err: None }
    }

    pub fn from_error(err: &PricingError) -> Self {
        Self {
            total: 0.0,
            err: Some(err.to_string()),
        }
    }

    /// Interpret the payload: a non-empty `err` wins over `total`.
    pub fn into_result(self) -> PricingResult<f64> {
        match self.err.as_deref() {
            Some(message) if !message.is_empty() => Err(PricingError::from_remote(message)),
            _ => Ok(self.total),
        }
    }
}

impl From<PricingResult<f64>> for PricingResponse {
    fn from(result: PricingResult<f64>) -> Self {
        match result {
            Ok(total) => PricingResponse::ok(total),
            Err(e) => PricingResponse::from_error(&e),
        }
    }
}

/// Body returned when the request itself could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub err: String,
}

impl ErrorResponse {
    pub fn invalid_request() -> Self {
        Self {
            err: INVALID_REQUEST.to_string(),
        }
    }
}
