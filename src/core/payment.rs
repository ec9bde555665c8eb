//! Payment attempts against an order

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pendiente,
    Completado,
    Fallido,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendiente => "pendiente",
            PaymentStatus::Completado => "completado",
            PaymentStatus::Fallido => "fallido",
        }
    }

    /// Parse the stored column value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(PaymentStatus::Pendiente),
            "completado" => Some(PaymentStatus::Completado),
            "fallido" => Some(PaymentStatus::Fallido),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded payment attempt
///
/// An order may have many attempts; at most one is `completado`.
/// `gateway_response` is the raw gateway payload kept for disputes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub method: String,
    pub gateway_response: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A payment attempt ready to be persisted
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub method: String,
    pub gateway_response: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
}

impl NewPayment {
    pub fn completed(
        order_id: i64,
        amount: Decimal,
        transaction_id: String,
        gateway_response: serde_json::Value,
    ) -> Self {
        Self {
            order_id,
            transaction_id: Some(transaction_id),
            amount,
            status: PaymentStatus::Completado,
            method: CARD_METHOD.to_string(),
            gateway_response,
            paid_at: Some(Utc::now()),
        }
    }

    pub fn failed(
        order_id: i64,
        amount: Decimal,
        transaction_id: Option<String>,
        gateway_response: serde_json::Value,
    ) -> Self {
        Self {
            order_id,
            transaction_id,
            amount,
            status: PaymentStatus::Fallido,
            method: CARD_METHOD.to_string(),
            gateway_response,
            paid_at: None,
        }
    }
}

/// Method label stored for gateway-settled payments
pub const CARD_METHOD: &str = "tarjeta";

/// Result of a conditional payment insert
#[derive(Debug, Clone)]
pub enum PaymentInsert {
    /// The row was written
    Recorded(Payment),
    /// A completed payment already exists for the order; nothing was written
    AlreadyCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_sets_paid_at() {
        let payment = NewPayment::completed(
            1,
            Decimal::new(3550, 2),
            "chr_1".to_string(),
            serde_json::json!({}),
        );
        assert_eq!(payment.status, PaymentStatus::Completado);
        assert!(payment.paid_at.is_some());
    }

    #[test]
    fn test_failed_leaves_paid_at_unset() {
        let payment = NewPayment::failed(1, Decimal::ONE, None, serde_json::json!({}));
        assert_eq!(payment.status, PaymentStatus::Fallido);
        assert!(payment.paid_at.is_none());
        assert!(payment.transaction_id.is_none());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(PaymentStatus::parse("completado"), Some(PaymentStatus::Completado));
        assert_eq!(PaymentStatus::parse("done"), None);
    }
}
