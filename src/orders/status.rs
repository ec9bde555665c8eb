//! Staff-driven order transitions

use crate::core::error::{ComandaError, ComandaResult, EntityError};
use crate::core::order::Order;
use crate::core::service::{StatusUpdate, Store};
use crate::core::status::OrderStatus;
use anyhow::anyhow;
use std::sync::Arc;

/// Compare-and-set attempts before giving up on a contended order
const MAX_ATTEMPTS: usize = 3;

/// Applies one forward step at a time on behalf of staff
#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn Store>,
}

impl StatusService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Move an order to `next` if the machine allows it from the current state
    ///
    /// The write is conditional on the state that was validated, so a payment
    /// confirming the order concurrently cannot be overwritten.
    pub async fn advance(&self, order_id: i64, next: OrderStatus, admin_id: i64) -> ComandaResult<Order> {
        for _ in 0..MAX_ATTEMPTS {
            let order = self
                .store
                .get_order(order_id)
                .await?
                .ok_or_else(|| EntityError::not_found("order", order_id))?;

            order.status.transition(next)?;

            match self
                .store
                .update_order_status(order_id, order.status, next)
                .await?
            {
                StatusUpdate::Updated(updated) => {
                    tracing::info!(
                        order_id,
                        numero_pedido = %updated.order_number,
                        admin_id,
                        from = %order.status,
                        to = %next,
                        "order status changed"
                    );
                    return Ok(updated);
                }
                StatusUpdate::NotFound => {
                    return Err(EntityError::not_found("order", order_id).into());
                }
                StatusUpdate::Stale(actual) => {
                    tracing::debug!(order_id, expected = %order.status, %actual, "status changed underneath, retrying");
                }
            }
        }

        Err(ComandaError::from(anyhow!(
            "order {} kept changing while updating its status",
            order_id
        )))
    }
}
