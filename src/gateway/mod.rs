//! Card payment gateway seam
//!
//! The coordinator only ever sees [`ChargeOutcome`] and [`GatewayError`]:
//! whatever envelope the processor answers with is normalised inside the
//! gateway implementation.

pub mod culqi;
pub mod scripted;

pub use culqi::CulqiGateway;
pub use scripted::{Script, ScriptedGateway};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A charge as sent to the processor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    /// Integer minor units (céntimos)
    pub amount_minor: i64,
    pub currency: String,
    /// Single-use token produced by the processor's hosted form
    pub token: String,
    pub email: String,
    pub description: String,
    pub metadata: Value,
}

/// Normalised answer from the processor
#[derive(Debug, Clone, PartialEq)]
pub enum ChargeOutcome {
    /// The card was charged
    Approved { transaction_id: String, raw: Value },
    /// The processor answered and refused the charge
    Declined {
        transaction_id: Option<String>,
        /// Customer-facing reason, when the processor gives one
        message: Option<String>,
        raw: Value,
    },
}

/// The processor could not give a definitive answer
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No answer in time; the charge may exist at the processor
    #[error("gateway timed out after {0}s")]
    Timeout(u64),

    /// Connection failure or an unexpected response
    #[error("gateway transport error: {message}")]
    Transport { message: String, raw: Value },
}

impl GatewayError {
    /// Payload to keep on the failed payment row
    pub fn raw(&self) -> Value {
        match self {
            GatewayError::Timeout(secs) => serde_json::json!({
                "error": "timeout",
                "timeout_secs": secs,
                "reconciliation_required": true,
            }),
            GatewayError::Transport { message, raw } => serde_json::json!({
                "error": message,
                "response": raw,
            }),
        }
    }
}

/// A card payment processor
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit one charge; never retried by the caller
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError>;
}
