use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AppError, Result};

/// Callback body as the gateway sends it
///
/// Accepts both plain field names and the M-Pesa style `input_*` / `output_*`
/// names. Everything is optional here; [`CallbackPayload::parse`] decides what
/// is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayCallback {
    #[serde(default, alias = "input_ThirdPartyReference", alias = "transactionReference")]
    pub transaction_reference: Option<String>,
    /// Gateways send this as a string ("INS-0") or a number (0)
    #[serde(default, alias = "output_ResponseCode", alias = "ResultCode")]
    pub result_code: Option<Value>,
    #[serde(default, alias = "input_TransactionID", alias = "output_TransactionID")]
    pub gateway_transaction_id: Option<String>,
}

/// A callback validated at the boundary
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackPayload {
    pub transaction_reference: String,
    pub result_code: String,
    pub gateway_transaction_id: Option<String>,
    /// Original body, stored on the payment as `gateway_response`
    pub raw: Value,
}

impl CallbackPayload {
    /// Parse and validate a raw callback body
    ///
    /// # Errors
    /// * `MalformedCallback` - not a JSON object, or missing reference / result code
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::MalformedCallback(format!("Callback is not valid JSON: {}", e)))?;

        if !raw.is_object() {
            return Err(AppError::MalformedCallback(
                "Callback body must be a JSON object".to_string(),
            ));
        }

        let callback: GatewayCallback = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::MalformedCallback(format!("Unexpected callback shape: {}", e)))?;

        Self::from_callback(callback, raw)
    }

    pub fn from_callback(callback: GatewayCallback, raw: Value) -> Result<Self> {
        let transaction_reference = non_empty(callback.transaction_reference).ok_or_else(|| {
            AppError::MalformedCallback("Callback has no transaction reference".to_string())
        })?;

        let result_code = callback
            .result_code
            .and_then(|code| match code {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .and_then(|code| non_empty(Some(code)))
            .ok_or_else(|| AppError::MalformedCallback("Callback has no result code".to_string()))?;

        Ok(Self {
            transaction_reference,
            result_code,
            gateway_transaction_id: non_empty(callback.gateway_transaction_id),
            raw,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Business meaning of a callback's result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackOutcome {
    Success,
    Failure,
}

/// Result-code mapping for the configured gateway
#[derive(Debug, Clone)]
pub struct GatewayProfile {
    success_code: String,
}

impl GatewayProfile {
    pub fn new(success_code: impl Into<String>) -> Self {
        Self {
            success_code: success_code.into(),
        }
    }

    pub fn classify(&self, result_code: &str) -> CallbackOutcome {
        if result_code.trim() == self.success_code {
            CallbackOutcome::Success
        } else {
            CallbackOutcome::Failure
        }
    }
}
