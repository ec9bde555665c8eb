//! Cart validation, server-side pricing and atomic order creation

use crate::core::error::{ComandaResult, EntityError, ValidationError};
use crate::core::money::{is_storable_amount, max_amount};
use crate::core::order::{NewOrder, Order, PaymentMethod, PricedCart, PricedLine};
use crate::core::service::Store;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Largest cart accepted in one order
pub const MAX_CART_LINES: usize = 100;

/// Largest quantity accepted on one line
pub const MAX_LINE_QUANTITY: i64 = 99;

/// One `{product_id, quantity}` pair as submitted by the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// Order submission
///
/// `total` is whatever the client computed; it is logged when it disagrees
/// and otherwise ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub customer_id: i64,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transfer_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Builds orders from carts against the catalog
#[derive(Clone)]
pub struct OrderBuilder {
    store: Arc<dyn Store>,
}

impl OrderBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Price a cart with authoritative catalog data
    ///
    /// Rejects empty or oversized carts, quantities outside
    /// `1..=MAX_LINE_QUANTITY`, unknown products, unavailable products and
    /// totals that cannot be stored or charged. Lines keep the submitted order.
    pub async fn price_cart(&self, items: &[CartItem]) -> ComandaResult<PricedCart> {
        check_cart_shape(items)?;

        let ids: Vec<i64> = items
            .iter()
            .map(|i| i.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products: HashMap<i64, _> = self
            .store
            .products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let unknown: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !products.contains_key(id))
            .collect();
        if !unknown.is_empty() {
            return Err(ValidationError::UnknownProducts { ids: unknown }.into());
        }

        let mut unavailable: Vec<String> = Vec::new();
        for id in &ids {
            if let Some(product) = products.get(id).filter(|p| !p.available) {
                unavailable.push(product.name.clone());
            }
        }
        if !unavailable.is_empty() {
            return Err(ValidationError::UnavailableProducts { names: unavailable }.into());
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let Some(product) = products.get(&item.product_id) else {
                return Err(ValidationError::UnknownProducts {
                    ids: vec![item.product_id],
                }
                .into());
            };
            lines.push(PricedLine::new(
                product.id,
                product.name.clone(),
                item.quantity,
                product.price,
            ));
        }

        let cart = PricedCart::new(lines);
        if !is_storable_amount(cart.total) {
            return Err(ValidationError::TotalTooLarge {
                total: cart.total.to_string(),
                max: max_amount().to_string(),
            }
            .into());
        }
        Ok(cart)
    }

    /// Validate, price and persist an order in state `pendiente`
    pub async fn place_order(&self, request: PlaceOrder) -> ComandaResult<Order> {
        check_cart_shape(&request.items)?;
        let notes = compose_notes(
            &request.payment_method,
            request.transfer_reference.as_deref(),
            request.notes.as_deref(),
        )?;

        if self.store.get_customer(request.customer_id).await?.is_none() {
            return Err(EntityError::not_found("customer", request.customer_id).into());
        }

        let cart = self.price_cart(&request.items).await?;

        if let Some(client_total) = request.total.filter(|t| *t != cart.total) {
            tracing::info!(
                customer_id = request.customer_id,
                client_total = %client_total,
                server_total = %cart.total,
                "client total disregarded"
            );
        }

        let order_number = generate_order_number();
        let order = self
            .store
            .insert_order(NewOrder {
                order_number,
                customer_id: request.customer_id,
                notes,
                cart,
            })
            .await?;

        tracing::info!(
            order_id = order.id,
            numero_pedido = %order.order_number,
            total = %order.total,
            payment_method = request.payment_method.as_str(),
            "order created"
        );
        Ok(order)
    }
}

fn check_cart_shape(items: &[CartItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    if items.len() > MAX_CART_LINES {
        return Err(ValidationError::CartTooLarge {
            count: items.len(),
            max: MAX_CART_LINES,
        });
    }
    if let Some(item) = items
        .iter()
        .find(|i| !(1..=MAX_LINE_QUANTITY).contains(&i.quantity))
    {
        return Err(ValidationError::InvalidQuantity {
            product_id: item.product_id,
            quantity: item.quantity,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// `PED-<unix millis>-<5 uppercase alphanumerics>`
///
/// Uniqueness is probabilistic; the store's unique constraint is the backstop.
pub fn generate_order_number() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect::<String>()
        .to_uppercase();
    format!("PED-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Staff-facing notes: a method tag for manual methods, then the customer's text
fn compose_notes(
    method: &PaymentMethod,
    transfer_reference: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    let tag = match method {
        PaymentMethod::Card => None,
        PaymentMethod::Cash => Some("[EFECTIVO] Pago al recoger".to_string()),
        PaymentMethod::Transfer => {
            let reference = transfer_reference
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    ValidationError::field(
                        "transfer_reference",
                        "a transfer reference code is required",
                    )
                })?;
            Some(format!("[TRANSFERENCIA] Código de operación: {reference}"))
        }
    };

    Ok(match (tag, notes) {
        (Some(tag), Some(notes)) => Some(format!("{tag}\n{notes}")),
        (Some(tag), None) => Some(tag),
        (None, notes) => notes.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::NewProduct;
    use crate::core::customer::NewCustomer;
    use crate::core::error::ComandaError;
    use crate::core::order::OrderFilter;
    use crate::core::query::PageRequest;
    use crate::core::service::{CatalogService, CustomerService, OrderService};
    use crate::core::status::OrderStatus;
    use crate::storage::InMemoryStore;

    async fn fixture() -> (OrderBuilder, InMemoryStore, i64) {
        let store = InMemoryStore::new();
        for (name, price, available) in [
            ("Lomo saltado", Decimal::new(1000, 2), true),
            ("Ají de gallina", Decimal::new(2550, 2), true),
            ("Rocoto relleno", Decimal::new(1800, 2), false),
        ] {
            store
                .create_product(NewProduct {
                    category_id: None,
                    name: name.into(),
                    description: None,
                    price,
                    available,
                    image_url: None,
                })
                .await
                .unwrap();
        }
        let customer = store
            .create_customer(NewCustomer {
                name: "Rosa".into(),
                email: "rosa@example.pe".into(),
                phone: None,
                city: None,
                district: None,
            })
            .await
            .unwrap()
            .unwrap();
        (OrderBuilder::new(Arc::new(store.clone())), store, customer.id)
    }

    fn request(customer_id: i64, items: Vec<CartItem>) -> PlaceOrder {
        PlaceOrder {
            customer_id,
            items,
            total: None,
            payment_method: PaymentMethod::Card,
            transfer_reference: None,
            notes: None,
        }
    }

    async fn order_count(store: &InMemoryStore) -> usize {
        store
            .list_orders(OrderFilter::default(), PageRequest::default().resolve(10, 50))
            .await
            .unwrap()
            .pagination
            .total
    }

    #[tokio::test]
    async fn test_client_total_is_ignored() {
        let (builder, _, customer_id) = fixture().await;
        let mut req = request(
            customer_id,
            vec![CartItem {
                product_id: 1,
                quantity: 2,
            }],
        );
        req.total = Some(Decimal::new(99900, 2));

        let order = builder.place_order(req).await.unwrap();
        assert_eq!(order.total.to_string(), "20.00");
        assert_eq!(order.status, OrderStatus::Pendiente);
        assert_eq!(order.total, order.lines_total());
    }

    #[tokio::test]
    async fn test_unavailable_product_writes_nothing() {
        let (builder, store, customer_id) = fixture().await;
        let err = builder
            .place_order(request(
                customer_id,
                vec![
                    CartItem {
                        product_id: 1,
                        quantity: 1,
                    },
                    CartItem {
                        product_id: 3,
                        quantity: 1,
                    },
                ],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ComandaError::Validation(ValidationError::UnavailableProducts { ref names }) if names == &["Rocoto relleno"]
        ));
        assert_eq!(order_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_any_unknown_product_rejects() {
        let (builder, _, _) = fixture().await;
        let err = builder
            .price_cart(&[
                CartItem {
                    product_id: 1,
                    quantity: 1,
                },
                CartItem {
                    product_id: 42,
                    quantity: 1,
                },
            ])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ComandaError::Validation(ValidationError::UnknownProducts { ref ids }) if ids == &[42]
        ));
    }

    #[tokio::test]
    async fn test_shape_checks() {
        let (builder, _, customer_id) = fixture().await;
        assert!(matches!(
            builder.place_order(request(customer_id, vec![])).await,
            Err(ComandaError::Validation(ValidationError::EmptyCart))
        ));
        assert!(matches!(
            builder
                .place_order(request(
                    customer_id,
                    vec![CartItem {
                        product_id: 1,
                        quantity: 0
                    }]
                ))
                .await,
            Err(ComandaError::Validation(ValidationError::InvalidQuantity { .. }))
        ));
        let too_many = vec![
            CartItem {
                product_id: 1,
                quantity: 1
            };
            MAX_CART_LINES + 1
        ];
        assert!(matches!(
            builder.place_order(request(customer_id, too_many)).await,
            Err(ComandaError::Validation(ValidationError::CartTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_quantity_above_limit_writes_nothing() {
        let (builder, store, customer_id) = fixture().await;
        for quantity in [MAX_LINE_QUANTITY + 1, i64::MAX] {
            let err = builder
                .place_order(request(
                    customer_id,
                    vec![CartItem {
                        product_id: 1,
                        quantity,
                    }],
                ))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ComandaError::Validation(ValidationError::InvalidQuantity { max: MAX_LINE_QUANTITY, .. })
            ));
        }
        assert_eq!(order_count(&store).await, 0);

        let cart = builder
            .price_cart(&[CartItem {
                product_id: 1,
                quantity: MAX_LINE_QUANTITY,
            }])
            .await
            .unwrap();
        assert_eq!(cart.total.to_string(), "990.00");
    }

    #[tokio::test]
    async fn test_unstorable_total_is_rejected() {
        let (builder, store, customer_id) = fixture().await;
        let banquet = store
            .create_product(NewProduct {
                category_id: None,
                name: "Banquete".into(),
                description: None,
                price: max_amount(),
                available: true,
                image_url: None,
            })
            .await
            .unwrap();

        let err = builder
            .place_order(request(
                customer_id,
                vec![CartItem {
                    product_id: banquet.id,
                    quantity: 2,
                }],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ComandaError::Validation(ValidationError::TotalTooLarge { .. })
        ));
        assert_eq!(order_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let (builder, _, _) = fixture().await;
        let err = builder
            .place_order(request(
                777,
                vec![CartItem {
                    product_id: 1,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transfer_reference_lands_in_notes() {
        let (builder, _, customer_id) = fixture().await;
        let mut req = request(
            customer_id,
            vec![CartItem {
                product_id: 2,
                quantity: 1,
            }],
        );
        req.payment_method = PaymentMethod::Transfer;
        req.transfer_reference = Some(" 004512 ".into());
        req.notes = Some("sin cebolla".into());

        let order = builder.place_order(req).await.unwrap();
        let notes = order.notes.unwrap();
        assert!(notes.starts_with("[TRANSFERENCIA]"));
        assert!(notes.contains("004512"));
        assert!(notes.ends_with("sin cebolla"));
    }

    #[test]
    fn test_transfer_without_reference_is_rejected() {
        assert!(compose_notes(&PaymentMethod::Transfer, Some("  "), None).is_err());
        assert_eq!(compose_notes(&PaymentMethod::Card, None, Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PED");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 5);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
        assert_ne!(number, generate_order_number());
    }
}
