//! Order aggregate: header plus immutable lines

use crate::core::money::{line_subtotal, saturating_sum};
use crate::core::status::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer purchase
///
/// `total` is computed once, at creation, from the lines and is never
/// recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub total: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Sum of the line subtotals
    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.subtotal).sum()
    }
}

/// One product line of an order, captured at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// A line priced by the server, not yet persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedLine {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl PricedLine {
    pub fn new(product_id: i64, name: String, quantity: i64, unit_price: Decimal) -> Self {
        Self {
            product_id,
            name,
            quantity,
            unit_price,
            subtotal: line_subtotal(unit_price, quantity),
        }
    }
}

/// Server-priced cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total: Decimal,
}

impl PricedCart {
    pub fn new(lines: Vec<PricedLine>) -> Self {
        let total = saturating_sum(lines.iter().map(|l| l.subtotal));
        Self { lines, total }
    }
}

/// Everything the store needs to persist an order atomically
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: i64,
    pub notes: Option<String>,
    pub cart: PricedCart,
}

/// How the customer intends to settle the order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card charged through the gateway after the order exists
    #[default]
    #[serde(alias = "tarjeta")]
    Card,
    /// Paid on pickup
    #[serde(alias = "efectivo")]
    Cash,
    /// Manual mobile transfer, verified by staff using the reference code
    #[serde(alias = "transferencia")]
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "tarjeta",
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Transfer => "transferencia",
        }
    }
}

/// Listing filter for orders
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.customer_id.is_none_or(|c| order.customer_id == c)
            && self.status.is_none_or(|s| order.status == s)
    }
}
