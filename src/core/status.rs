//! Order lifecycle
//!
//! The canonical machine has five states:
//!
//! ```text
//! pendiente ──▶ confirmado ──▶ preparando ──▶ listo
//!     │             │  └───────────────────────▲
//!     ▼             ▼              │
//! cancelado ◀───────┴──────────────┘
//! ```
//!
//! - `pendiente` is initial; `listo` (fulfilled) and `cancelado` are terminal.
//! - `preparando` is optional: `confirmado ──▶ listo` is a single step.
//! - The kitchen view's `entregado` is accepted as an alias of `listo`.
//! - Nothing moves backwards, and `pendiente` can never jump to `listo`.

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pendiente,
    Confirmado,
    Preparando,
    #[serde(alias = "entregado")]
    Listo,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pendiente,
        OrderStatus::Confirmado,
        OrderStatus::Preparando,
        OrderStatus::Listo,
        OrderStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::Confirmado => "confirmado",
            OrderStatus::Preparando => "preparando",
            OrderStatus::Listo => "listo",
            OrderStatus::Cancelado => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Listo | OrderStatus::Cancelado)
    }

    /// Whether orders in this state count as sales
    pub fn is_sale(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmado | OrderStatus::Preparando | OrderStatus::Listo
        )
    }

    /// States reachable in exactly one step
    pub fn next_states(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pendiente => &[OrderStatus::Confirmado, OrderStatus::Cancelado],
            OrderStatus::Confirmado => &[
                OrderStatus::Preparando,
                OrderStatus::Listo,
                OrderStatus::Cancelado,
            ],
            OrderStatus::Preparando => &[OrderStatus::Listo, OrderStatus::Cancelado],
            OrderStatus::Listo | OrderStatus::Cancelado => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.next_states().contains(&next)
    }

    /// Validate a single forward step
    pub fn transition(&self, next: OrderStatus) -> Result<OrderStatus, ValidationError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ValidationError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" => Ok(OrderStatus::Pendiente),
            "confirmado" => Ok(OrderStatus::Confirmado),
            "preparando" => Ok(OrderStatus::Preparando),
            "listo" | "entregado" => Ok(OrderStatus::Listo),
            "cancelado" => Ok(OrderStatus::Cancelado),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}
