//! Card settlement: charge the gateway, record the attempt, confirm the order

use crate::core::error::{ComandaResult, EntityError, PaymentError, ValidationError};
use crate::core::money::to_minor_units;
use crate::core::order::Order;
use crate::core::payment::{NewPayment, Payment, PaymentInsert, PaymentStatus};
use crate::core::service::{StatusUpdate, Store};
use crate::core::status::OrderStatus;
use crate::gateway::{ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Shown to the customer when the gateway gives no reason of its own
pub const GENERIC_REJECTION: &str = "payment rejected, try another card";

/// Card payment request; the token comes from the gateway's hosted form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PayOrder {
    pub order_id: i64,
    #[serde(default)]
    #[validate(length(min = 1, message = "payment token is required"))]
    pub payment_token: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
}

/// Successful settlement
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub status: PaymentStatus,
    pub order: Order,
}

/// Every attempt for one order
#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistory {
    pub order_id: i64,
    pub completed: Option<Payment>,
    pub attempts: Vec<Payment>,
}

/// Coordinates the gateway, the payment table and the order state
#[derive(Clone)]
pub struct PaymentCoordinator {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
    timeout: Duration,
}

impl PaymentCoordinator {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            currency: currency.into(),
            timeout,
        }
    }

    /// Charge the order's total once
    ///
    /// Every gateway answer other than a clean approval is recorded as a
    /// `fallido` attempt and leaves the order where it was.
    pub async fn pay(&self, request: PayOrder) -> ComandaResult<PaymentReceipt> {
        if request.payment_token.trim().is_empty() {
            return Err(ValidationError::field("payment_token", "payment token is required").into());
        }
        request.validate()?;

        let order = self
            .store
            .get_order(request.order_id)
            .await?
            .ok_or_else(|| EntityError::not_found("order", request.order_id))?;

        if matches!(order.status, OrderStatus::Cancelado | OrderStatus::Listo) {
            return Err(ValidationError::OrderNotPayable {
                status: order.status.to_string(),
            }
            .into());
        }

        if self.store.completed_payment(order.id).await?.is_some() {
            return Err(PaymentError::AlreadyPaid { order_id: order.id }.into());
        }

        let charge = ChargeRequest {
            amount_minor: to_minor_units(order.total)?,
            currency: self.currency.clone(),
            token: request.payment_token,
            email: request.email,
            description: format!("Pedido {}", order.order_number),
            metadata: json!({
                "pedido_id": order.id,
                "numero_pedido": order.order_number,
            }),
        };

        tracing::info!(
            order_id = order.id,
            numero_pedido = %order.order_number,
            amount_minor = charge.amount_minor,
            "charging card"
        );

        let outcome = match tokio::time::timeout(self.timeout, self.gateway.charge(charge)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_secs())),
        };

        match outcome {
            Ok(ChargeOutcome::Approved {
                transaction_id,
                raw,
            }) => self.settle(order, transaction_id, raw).await,

            Ok(ChargeOutcome::Declined {
                transaction_id,
                message,
                raw,
            }) => {
                let payment = self
                    .record_failure(&order, transaction_id, raw)
                    .await?;
                let message = message.unwrap_or_else(|| GENERIC_REJECTION.to_string());
                tracing::warn!(
                    order_id = order.id,
                    payment_id = payment.id,
                    reason = %message,
                    "card declined"
                );
                Err(PaymentError::Rejected {
                    order_id: order.id,
                    message,
                }
                .into())
            }

            Err(err @ GatewayError::Timeout(_)) => {
                let payment = self.record_failure(&order, None, err.raw()).await?;
                tracing::error!(
                    order_id = order.id,
                    payment_id = payment.id,
                    "gateway timed out; charge outcome must be reconciled manually"
                );
                Err(PaymentError::OutcomeUnknown {
                    order_id: order.id,
                    payment_id: payment.id,
                }
                .into())
            }

            Err(err @ GatewayError::Transport { .. }) => {
                let payment = self.record_failure(&order, None, err.raw()).await?;
                tracing::warn!(
                    order_id = order.id,
                    payment_id = payment.id,
                    error = %err,
                    "gateway failure"
                );
                Err(PaymentError::Rejected {
                    order_id: order.id,
                    message: GENERIC_REJECTION.to_string(),
                }
                .into())
            }
        }
    }

    /// All attempts for an order, newest first
    pub async fn history(&self, order_id: i64) -> ComandaResult<PaymentHistory> {
        let attempts = self.store.payments_for_order(order_id).await?;
        if attempts.is_empty() {
            return Err(EntityError::not_found("payment", order_id).into());
        }
        let completed = attempts
            .iter()
            .find(|p| p.status == PaymentStatus::Completado)
            .cloned();
        Ok(PaymentHistory {
            order_id,
            completed,
            attempts,
        })
    }

    async fn settle(
        &self,
        order: Order,
        transaction_id: String,
        raw: Value,
    ) -> ComandaResult<PaymentReceipt> {
        let insert = self
            .store
            .insert_payment(NewPayment::completed(
                order.id,
                order.total,
                transaction_id.clone(),
                raw.clone(),
            ))
            .await
            .inspect_err(|e| {
                tracing::error!(
                    order_id = order.id,
                    transaction_id = %transaction_id,
                    error = %format!("{e:#}"),
                    "card charged but payment could not be recorded"
                );
            })?;

        let payment = match insert {
            PaymentInsert::Recorded(payment) => payment,
            PaymentInsert::AlreadyCompleted => {
                // A concurrent attempt won; this charge has to be refunded.
                let flagged = json!({
                    "duplicate_charge": true,
                    "refund_required": true,
                    "response": raw,
                });
                let payment = self
                    .record_failure(&order, Some(transaction_id.clone()), flagged)
                    .await?;
                tracing::error!(
                    order_id = order.id,
                    payment_id = payment.id,
                    transaction_id = %transaction_id,
                    "order charged twice; refund required"
                );
                return Err(PaymentError::DuplicateCharge {
                    order_id: order.id,
                    transaction_id,
                }
                .into());
            }
        };

        let order = self.confirm(order, &payment).await?;

        tracing::info!(
            order_id = order.id,
            numero_pedido = %order.order_number,
            payment_id = payment.id,
            transaction_id = %transaction_id,
            "payment completed"
        );

        Ok(PaymentReceipt {
            status: payment.status,
            payment,
            order,
        })
    }

    /// `pendiente -> confirmado`; an order already past confirmation is left alone
    async fn confirm(&self, order: Order, payment: &Payment) -> ComandaResult<Order> {
        if order.status != OrderStatus::Pendiente {
            return self.reload(order.id, payment).await;
        }

        match self
            .store
            .update_order_status(order.id, OrderStatus::Pendiente, OrderStatus::Confirmado)
            .await
        {
            Ok(StatusUpdate::Updated(order)) => Ok(order),
            Ok(StatusUpdate::Stale(actual)) if actual.is_sale() => self.reload(order.id, payment).await,
            Ok(StatusUpdate::Stale(actual)) => {
                tracing::error!(
                    order_id = order.id,
                    payment_id = payment.id,
                    status = %actual,
                    "payment recorded but order could not be confirmed"
                );
                Err(PaymentError::ReconciliationRequired {
                    order_id: order.id,
                    payment_id: payment.id,
                }
                .into())
            }
            Ok(StatusUpdate::NotFound) => {
                tracing::error!(
                    order_id = order.id,
                    payment_id = payment.id,
                    "payment recorded for a vanished order"
                );
                Err(PaymentError::ReconciliationRequired {
                    order_id: order.id,
                    payment_id: payment.id,
                }
                .into())
            }
            Err(e) => {
                tracing::error!(
                    order_id = order.id,
                    payment_id = payment.id,
                    error = %format!("{e:#}"),
                    "payment recorded but order update failed"
                );
                Err(PaymentError::ReconciliationRequired {
                    order_id: order.id,
                    payment_id: payment.id,
                }
                .into())
            }
        }
    }

    async fn reload(&self, order_id: i64, payment: &Payment) -> ComandaResult<Order> {
        match self.store.get_order(order_id).await {
            Ok(Some(order)) => Ok(order),
            _ => Err(PaymentError::ReconciliationRequired {
                order_id,
                payment_id: payment.id,
            }
            .into()),
        }
    }

    async fn record_failure(
        &self,
        order: &Order,
        transaction_id: Option<String>,
        raw: Value,
    ) -> ComandaResult<Payment> {
        match self
            .store
            .insert_payment(NewPayment::failed(order.id, order.total, transaction_id, raw))
            .await?
        {
            PaymentInsert::Recorded(payment) => Ok(payment),
            PaymentInsert::AlreadyCompleted => Err(anyhow!(
                "store refused a failed attempt for order {}",
                order.id
            )
            .into()),
        }
    }
}
