//! In-memory store for tests and development
//!
//! Each table lives behind its own `RwLock`. Operations that the relational
//! backend runs inside a transaction (order header + lines, completed-payment
//! check + insert) run here under a single write guard.

use crate::core::admin::AdminAccount;
use crate::core::catalog::{Category, NewProduct, Product, ProductFilter, ProductUpdate};
use crate::core::customer::{Customer, NewCustomer};
use crate::core::order::{NewOrder, Order, OrderFilter, OrderLine};
use crate::core::payment::{NewPayment, Payment, PaymentInsert, PaymentStatus};
use crate::core::query::{Page, Paginated};
use crate::core::service::{
    AdminService, CatalogService, CustomerService, NewAdmin, OrderService, PaymentService,
    StatusUpdate,
};
use crate::core::status::OrderStatus;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Monotonic surrogate keys, one sequence per table
#[derive(Default)]
struct Sequences {
    categories: AtomicI64,
    products: AtomicI64,
    customers: AtomicI64,
    orders: AtomicI64,
    order_lines: AtomicI64,
    payments: AtomicI64,
    admins: AtomicI64,
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

/// In-memory store implementation
///
/// Cloning is cheap and clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    categories: Arc<RwLock<BTreeMap<i64, Category>>>,
    products: Arc<RwLock<BTreeMap<i64, Product>>>,
    customers: Arc<RwLock<BTreeMap<i64, Customer>>>,
    orders: Arc<RwLock<BTreeMap<i64, Order>>>,
    payments: Arc<RwLock<BTreeMap<i64, Payment>>>,
    admins: Arc<RwLock<BTreeMap<i64, AdminAccount>>>,
    sequences: Arc<Sequences>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
}

#[async_trait]
impl CatalogService for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = read(&self.categories)?.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(read(&self.categories)?.get(&id).cloned())
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category> {
        let category = Category {
            id: next_id(&self.sequences.categories),
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        write(&self.categories)?.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_products(&self, filter: ProductFilter, page: Page) -> Result<Paginated<Product>> {
        let mut products: Vec<Product> = read(&self.products)?
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page.slice(products))
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        Ok(read(&self.products)?.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let products = read(&self.products)?;
        Ok(products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        if product.price < Decimal::ZERO {
            bail!("product price must not be negative");
        }
        let product = Product {
            id: next_id(&self.sequences.products),
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            available: product.available,
            image_url: product.image_url,
        };
        write(&self.products)?.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>> {
        let mut products = write(&self.products)?;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(product);
        Ok(Some(product.clone()))
    }
}

#[async_trait]
impl CustomerService for InMemoryStore {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Option<Customer>> {
        let mut customers = write(&self.customers)?;
        if customers.values().any(|c| c.email == customer.email) {
            return Ok(None);
        }
        let customer = Customer {
            id: next_id(&self.sequences.customers),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            city: customer.city,
            district: customer.district,
            created_at: Utc::now(),
        };
        customers.insert(customer.id, customer.clone());
        Ok(Some(customer))
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(read(&self.customers)?.get(&id).cloned())
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        Ok(read(&self.customers)?
            .values()
            .find(|c| c.email == email)
            .cloned())
    }
}

#[async_trait]
impl OrderService for InMemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        // Lines are checked before anything is written so a bad line leaves no header behind.
        if order.cart.lines.is_empty() {
            bail!("order {} has no lines", order.order_number);
        }
        for line in &order.cart.lines {
            if line.quantity < 1 || line.unit_price < Decimal::ZERO {
                bail!(
                    "invalid line for product {} in order {}",
                    line.product_id,
                    order.order_number
                );
            }
        }

        let mut orders = write(&self.orders)?;
        if orders.values().any(|o| o.order_number == order.order_number) {
            bail!("duplicate order number {}", order.order_number);
        }

        let id = next_id(&self.sequences.orders);
        let lines = order
            .cart
            .lines
            .iter()
            .map(|line| OrderLine {
                id: next_id(&self.sequences.order_lines),
                order_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .collect();

        let created = Order {
            id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            total: order.cart.total,
            status: OrderStatus::Pendiente,
            notes: order.notes,
            created_at: Utc::now(),
            lines,
        };
        orders.insert(id, created.clone());
        Ok(created)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        Ok(read(&self.orders)?.get(&id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter, page: Page) -> Result<Paginated<Order>> {
        let mut orders: Vec<Order> = read(&self.orders)?
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.slice(orders))
    }

    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<StatusUpdate> {
        let mut orders = write(&self.orders)?;
        let Some(order) = orders.get_mut(&id) else {
            return Ok(StatusUpdate::NotFound);
        };
        if order.status != expected {
            return Ok(StatusUpdate::Stale(order.status));
        }
        order.status = next;
        Ok(StatusUpdate::Updated(order.clone()))
    }

    async fn orders_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        Ok(read(&self.orders)?
            .values()
            .filter(|o| o.created_at >= from && o.created_at < to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentService for InMemoryStore {
    async fn completed_payment(&self, order_id: i64) -> Result<Option<Payment>> {
        Ok(read(&self.payments)?
            .values()
            .find(|p| p.order_id == order_id && p.status == PaymentStatus::Completado)
            .cloned())
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<PaymentInsert> {
        let mut payments = write(&self.payments)?;
        if payment.status == PaymentStatus::Completado
            && payments
                .values()
                .any(|p| p.order_id == payment.order_id && p.status == PaymentStatus::Completado)
        {
            return Ok(PaymentInsert::AlreadyCompleted);
        }

        let recorded = Payment {
            id: next_id(&self.sequences.payments),
            order_id: payment.order_id,
            transaction_id: payment.transaction_id,
            amount: payment.amount,
            status: payment.status,
            method: payment.method,
            gateway_response: payment.gateway_response,
            paid_at: payment.paid_at,
            created_at: Utc::now(),
        };
        payments.insert(recorded.id, recorded.clone());
        Ok(PaymentInsert::Recorded(recorded))
    }

    async fn payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = read(&self.payments)?
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payments)
    }
}

#[async_trait]
impl AdminService for InMemoryStore {
    async fn create_admin(&self, admin: NewAdmin) -> Result<AdminAccount> {
        let mut admins = write(&self.admins)?;
        if admins.values().any(|a| a.email == admin.email) {
            bail!("admin {} already exists", admin.email);
        }
        let account = AdminAccount {
            id: next_id(&self.sequences.admins),
            name: admin.name,
            email: admin.email,
            password_hash: admin.password_hash,
            role: admin.role,
            active: admin.active,
        };
        admins.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>> {
        Ok(read(&self.admins)?
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn get_admin(&self, id: i64) -> Result<Option<AdminAccount>> {
        Ok(read(&self.admins)?.get(&id).cloned())
    }

    async fn update_admin_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let mut admins = write(&self.admins)?;
        match admins.get_mut(&id) {
            Some(admin) => {
                admin.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::{PricedCart, PricedLine};
    use crate::core::query::PageRequest;

    fn cart(lines: Vec<PricedLine>) -> PricedCart {
        PricedCart::new(lines)
    }

    fn new_order(number: &str, lines: Vec<PricedLine>) -> NewOrder {
        NewOrder {
            order_number: number.to_string(),
            customer_id: 1,
            notes: None,
            cart: cart(lines),
        }
    }

    #[tokio::test]
    async fn test_insert_order_persists_header_and_lines() {
        let store = InMemoryStore::new();
        let order = store
            .insert_order(new_order(
                "PED-1",
                vec![PricedLine::new(1, "Causa".into(), 2, Decimal::new(1200, 2))],
            ))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pendiente);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].order_id, order.id);
        assert_eq!(order.total, order.lines_total());

        let fetched = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(fetched, order);
    }

    #[tokio::test]
    async fn test_bad_line_leaves_no_header() {
        let store = InMemoryStore::new();
        let mut bad = PricedLine::new(1, "Causa".into(), 1, Decimal::ONE);
        bad.quantity = 0;
        let result = store
            .insert_order(new_order(
                "PED-2",
                vec![PricedLine::new(2, "Inca Kola".into(), 1, Decimal::ONE), bad],
            ))
            .await;
        assert!(result.is_err());

        let page = PageRequest::default().resolve(10, 50);
        let orders = store.list_orders(OrderFilter::default(), page).await.unwrap();
        assert_eq!(orders.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_second_completed_payment_is_refused() {
        let store = InMemoryStore::new();
        let first = store
            .insert_payment(NewPayment::completed(
                9,
                Decimal::TEN,
                "chr_a".into(),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert!(matches!(first, PaymentInsert::Recorded(_)));

        let second = store
            .insert_payment(NewPayment::completed(
                9,
                Decimal::TEN,
                "chr_b".into(),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert!(matches!(second, PaymentInsert::AlreadyCompleted));

        // failed attempts are always recorded
        let failed = store
            .insert_payment(NewPayment::failed(9, Decimal::TEN, None, serde_json::json!({})))
            .await
            .unwrap();
        assert!(matches!(failed, PaymentInsert::Recorded(_)));
        assert_eq!(store.payments_for_order(9).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let store = InMemoryStore::new();
        let order = store
            .insert_order(new_order(
                "PED-3",
                vec![PricedLine::new(1, "Causa".into(), 1, Decimal::ONE)],
            ))
            .await
            .unwrap();

        let updated = store
            .update_order_status(order.id, OrderStatus::Pendiente, OrderStatus::Confirmado)
            .await
            .unwrap();
        assert!(matches!(updated, StatusUpdate::Updated(ref o) if o.status == OrderStatus::Confirmado));

        let stale = store
            .update_order_status(order.id, OrderStatus::Pendiente, OrderStatus::Cancelado)
            .await
            .unwrap();
        assert!(matches!(stale, StatusUpdate::Stale(OrderStatus::Confirmado)));

        let missing = store
            .update_order_status(999, OrderStatus::Pendiente, OrderStatus::Confirmado)
            .await
            .unwrap();
        assert!(matches!(missing, StatusUpdate::NotFound));
    }

    #[tokio::test]
    async fn test_duplicate_customer_email() {
        let store = InMemoryStore::new();
        let customer = NewCustomer {
            name: "Rosa".into(),
            email: "rosa@example.pe".into(),
            phone: None,
            city: None,
            district: None,
        };
        assert!(store.create_customer(customer.clone()).await.unwrap().is_some());
        assert!(store.create_customer(customer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_products_listed_by_name_with_filter() {
        let store = InMemoryStore::new();
        for (name, available) in [("Tamal", true), ("Anticucho", false), ("Ceviche", true)] {
            store
                .create_product(NewProduct {
                    category_id: Some(1),
                    name: name.into(),
                    description: None,
                    price: Decimal::ONE,
                    available,
                    image_url: None,
                })
                .await
                .unwrap();
        }
        let page = PageRequest::default().resolve(12, 50);
        let listed = store
            .list_products(
                ProductFilter {
                    category_id: None,
                    available: Some(true),
                },
                page,
            )
            .await
            .unwrap();
        let names: Vec<&str> = listed.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ceviche", "Tamal"]);
    }
}
