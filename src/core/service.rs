//! Service traits for the persistent store
//!
//! The domain is agnostic to the storage mechanism: every backend implements
//! these traits and the blanket [`Store`] bundle. Backends are responsible for
//! the two atomicity guarantees the order flow depends on:
//!
//! - [`OrderService::insert_order`] writes the header and all lines, or nothing.
//! - [`PaymentService::insert_payment`] never lets a second `completado` row
//!   exist for the same order, even under concurrent attempts.

use crate::core::admin::{AdminAccount, AdminRole};
use crate::core::catalog::{Category, NewProduct, Product, ProductFilter, ProductUpdate};
use crate::core::customer::{Customer, NewCustomer};
use crate::core::order::{NewOrder, Order, OrderFilter};
use crate::core::payment::{NewPayment, Payment, PaymentInsert};
use crate::core::query::{Page, Paginated};
use crate::core::status::OrderStatus;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Catalog reads plus menu maintenance
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// All categories ordered by name
    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn get_category(&self, id: i64) -> Result<Option<Category>>;

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category>;

    /// Products matching the filter, ordered by name
    async fn list_products(&self, filter: ProductFilter, page: Page) -> Result<Paginated<Product>>;

    async fn get_product(&self, id: i64) -> Result<Option<Product>>;

    /// Fetch every product whose id is listed; unknown ids are simply absent
    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>>;

    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Returns `None` when the product does not exist
    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>>;
}

/// Storefront customers
#[async_trait]
pub trait CustomerService: Send + Sync {
    /// Returns `None` when the email is already registered
    async fn create_customer(&self, customer: NewCustomer) -> Result<Option<Customer>>;

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>>;

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;
}

/// Outcome of a compare-and-set status update
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Updated(Order),
    NotFound,
    /// The order was not in the expected state; carries the actual one
    Stale(OrderStatus),
}

/// Orders and their lines
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Persist header and lines as one atomic unit, in state `pendiente`
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Order with its lines
    async fn get_order(&self, id: i64) -> Result<Option<Order>>;

    /// Orders matching the filter, newest first, with lines
    async fn list_orders(&self, filter: OrderFilter, page: Page) -> Result<Paginated<Order>>;

    /// Move `id` from `expected` to `next` only if it is still in `expected`
    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<StatusUpdate>;

    /// Orders created in `[from, to)`, with lines
    async fn orders_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>>;
}

/// Payment attempts
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// The completed payment of an order, if any
    async fn completed_payment(&self, order_id: i64) -> Result<Option<Payment>>;

    /// Record an attempt; a `completado` attempt is refused if one already exists
    async fn insert_payment(&self, payment: NewPayment) -> Result<PaymentInsert>;

    /// Every attempt for an order, newest first
    async fn payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>>;
}

/// Data needed to create an admin account
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub active: bool,
}

/// Back-office accounts
#[async_trait]
pub trait AdminService: Send + Sync {
    async fn create_admin(&self, admin: NewAdmin) -> Result<AdminAccount>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>>;

    async fn get_admin(&self, id: i64) -> Result<Option<AdminAccount>>;

    /// Returns `false` when the admin does not exist
    async fn update_admin_password(&self, id: i64, password_hash: &str) -> Result<bool>;
}

/// Everything a backend must provide
pub trait Store:
    CatalogService + CustomerService + OrderService + PaymentService + AdminService
{
}

impl<T> Store for T where
    T: CatalogService + CustomerService + OrderService + PaymentService + AdminService
{
}
