//! Culqi charges API client

use super::{ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::time::Duration;

/// HTTP client for `POST {api_url}/charges`
#[derive(Debug, Clone)]
pub struct CulqiGateway {
    client: reqwest::Client,
    api_url: String,
    secret_key: String,
    timeout_secs: u64,
}

impl CulqiGateway {
    /// Fails when the HTTP client cannot be built with the requested timeout
    pub fn new(
        api_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build the gateway HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            timeout_secs,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.secret_key)).map_err(|e| {
            GatewayError::Transport {
                message: format!("invalid gateway secret: {e}"),
                raw: Value::Null,
            }
        })?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// Customer-facing text from a Culqi error or decline body
fn rejection_message(body: &Value) -> Option<String> {
    ["user_message", "merchant_message", "mensaje"]
        .iter()
        .find_map(|key| {
            body.get(key)
                .or_else(|| body.get("outcome").and_then(|o| o.get(key)))
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
}

/// Map a parsed response onto the normalised outcome
fn interpret(status: reqwest::StatusCode, body: Value) -> Result<ChargeOutcome, GatewayError> {
    let transaction_id = body.get("id").and_then(Value::as_str).map(str::to_string);

    if status.is_success() {
        let approved = body.get("status").and_then(Value::as_str) == Some("successful")
            || body
                .get("outcome")
                .and_then(|o| o.get("type"))
                .and_then(Value::as_str)
                == Some("venta_exitosa");

        return match (approved, transaction_id) {
            (true, Some(transaction_id)) => Ok(ChargeOutcome::Approved {
                transaction_id,
                raw: body,
            }),
            (true, None) => Err(GatewayError::Transport {
                message: "approved charge without an id".to_string(),
                raw: body,
            }),
            (false, transaction_id) => Ok(ChargeOutcome::Declined {
                transaction_id,
                message: rejection_message(&body),
                raw: body,
            }),
        };
    }

    if status.is_client_error() {
        return Ok(ChargeOutcome::Declined {
            transaction_id,
            message: rejection_message(&body),
            raw: body,
        });
    }

    Err(GatewayError::Transport {
        message: format!("gateway answered {status}"),
        raw: body,
    })
}

#[async_trait]
impl PaymentGateway for CulqiGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let body = json!({
            "amount": request.amount_minor,
            "currency_code": request.currency,
            "email": request.email,
            "source_id": request.token,
            "description": request.description,
            "metadata": request.metadata,
        });

        let response = self
            .client
            .post(format!("{}/charges", self.api_url))
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout_secs)
                } else {
                    GatewayError::Transport {
                        message: e.to_string(),
                        raw: Value::Null,
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout_secs)
            } else {
                GatewayError::Transport {
                    message: e.to_string(),
                    raw: Value::Null,
                }
            }
        })?;

        let parsed = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "body": text }));
        // Some proxies wrap the charge in a `data` envelope
        let parsed = match parsed.get("data") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => parsed,
        };

        interpret(status, parsed)
    }
}
