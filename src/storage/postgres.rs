//! PostgreSQL storage backend using sqlx.
//!
//! Provides [`PostgresStore`], implementing every service trait against a
//! `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! comanda = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! Tables keep the restaurant's historical names (`pedidos`,
//! `detalles_pedidos`, `pagos`...). The at-most-one completed payment rule is
//! enforced by a partial unique index on `pagos(pedido_id)`, so concurrent
//! attempts are serialized by the database rather than by the caller.

use crate::core::admin::{AdminAccount, AdminRole};
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
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

const SCHEMA: &[(&str, &str)] = &[
    (
        "categorias",
        "CREATE TABLE IF NOT EXISTS categorias (
            id BIGSERIAL PRIMARY KEY,
            nombre VARCHAR(100) NOT NULL,
            descripcion TEXT
        )",
    ),
    (
        "productos",
        "CREATE TABLE IF NOT EXISTS productos (
            id BIGSERIAL PRIMARY KEY,
            categoria_id BIGINT REFERENCES categorias(id),
            nombre VARCHAR(150) NOT NULL,
            descripcion TEXT,
            precio NUMERIC(10, 2) NOT NULL CHECK (precio >= 0),
            disponible BOOLEAN NOT NULL DEFAULT TRUE,
            imagen_url TEXT
        )",
    ),
    (
        "usuarios",
        "CREATE TABLE IF NOT EXISTS usuarios (
            id BIGSERIAL PRIMARY KEY,
            nombre VARCHAR(150) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            telefono VARCHAR(30),
            ciudad VARCHAR(100),
            distrito VARCHAR(100),
            creado_en TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "pedidos",
        "CREATE TABLE IF NOT EXISTS pedidos (
            id BIGSERIAL PRIMARY KEY,
            numero_pedido VARCHAR(40) NOT NULL UNIQUE,
            usuario_id BIGINT NOT NULL REFERENCES usuarios(id),
            total NUMERIC(10, 2) NOT NULL CHECK (total >= 0),
            estado VARCHAR(20) NOT NULL DEFAULT 'pendiente'
                CHECK (estado IN ('pendiente', 'confirmado', 'preparando', 'listo', 'cancelado')),
            observaciones TEXT,
            creado_en TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "detalles_pedidos",
        "CREATE TABLE IF NOT EXISTS detalles_pedidos (
            id BIGSERIAL PRIMARY KEY,
            pedido_id BIGINT NOT NULL REFERENCES pedidos(id) ON DELETE CASCADE,
            producto_id BIGINT NOT NULL REFERENCES productos(id),
            cantidad BIGINT NOT NULL CHECK (cantidad > 0),
            precio_unitario NUMERIC(10, 2) NOT NULL CHECK (precio_unitario >= 0),
            subtotal NUMERIC(10, 2) NOT NULL
        )",
    ),
    (
        "pagos",
        "CREATE TABLE IF NOT EXISTS pagos (
            id BIGSERIAL PRIMARY KEY,
            pedido_id BIGINT NOT NULL REFERENCES pedidos(id),
            transaccion_id VARCHAR(100),
            monto NUMERIC(10, 2) NOT NULL,
            estado VARCHAR(20) NOT NULL
                CHECK (estado IN ('pendiente', 'completado', 'fallido')),
            metodo VARCHAR(30) NOT NULL,
            respuesta_pasarela JSONB NOT NULL DEFAULT '{}'::jsonb,
            pagado_en TIMESTAMPTZ,
            creado_en TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "pagos_un_completado",
        "CREATE UNIQUE INDEX IF NOT EXISTS pagos_un_completado
            ON pagos (pedido_id) WHERE estado = 'completado'",
    ),
    (
        "administradores",
        "CREATE TABLE IF NOT EXISTS administradores (
            id BIGSERIAL PRIMARY KEY,
            nombre VARCHAR(150) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            rol VARCHAR(20) NOT NULL DEFAULT 'admin',
            activo BOOLEAN NOT NULL DEFAULT TRUE
        )",
    ),
    (
        "idx_pedidos_usuario",
        "CREATE INDEX IF NOT EXISTS idx_pedidos_usuario ON pedidos (usuario_id, creado_en DESC)",
    ),
    (
        "idx_detalles_pedido",
        "CREATE INDEX IF NOT EXISTS idx_detalles_pedido ON detalles_pedidos (pedido_id)",
    ),
];

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for (name, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", name, e))?;
    }
    Ok(())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

type ProductRow = (
    i64,
    Option<i64>,
    String,
    Option<String>,
    Decimal,
    bool,
    Option<String>,
);

fn product_from_row(row: ProductRow) -> Product {
    let (id, category_id, name, description, price, available, image_url) = row;
    Product {
        id,
        category_id,
        name,
        description,
        price,
        available,
        image_url,
    }
}

const PRODUCT_COLUMNS: &str =
    "id, categoria_id, nombre, descripcion, precio, disponible, imagen_url";

type CustomerRow = (
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
);

fn customer_from_row(row: CustomerRow) -> Customer {
    let (id, name, email, phone, city, district, created_at) = row;
    Customer {
        id,
        name,
        email,
        phone,
        city,
        district,
        created_at,
    }
}

const CUSTOMER_COLUMNS: &str = "id, nombre, email, telefono, ciudad, distrito, creado_en";

type OrderRow = (
    i64,
    String,
    i64,
    Decimal,
    String,
    Option<String>,
    DateTime<Utc>,
);

const ORDER_COLUMNS: &str =
    "id, numero_pedido, usuario_id, total, estado, observaciones, creado_en";

fn order_from_row(row: OrderRow) -> Result<Order> {
    let (id, order_number, customer_id, total, status, notes, created_at) = row;
    Ok(Order {
        id,
        order_number,
        customer_id,
        total,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| anyhow!("Corrupt estado on pedido {}: {}", id, e))?,
        notes,
        created_at,
        lines: Vec::new(),
    })
}

type LineRow = (i64, i64, i64, i64, Decimal, Decimal);

type PaymentRow = (
    i64,
    i64,
    Option<String>,
    Decimal,
    String,
    String,
    serde_json::Value,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
);

const PAYMENT_COLUMNS: &str = "id, pedido_id, transaccion_id, monto, estado, metodo, \
                               respuesta_pasarela, pagado_en, creado_en";

fn payment_from_row(row: PaymentRow) -> Result<Payment> {
    let (id, order_id, transaction_id, amount, status, method, gateway_response, paid_at, created_at) =
        row;
    Ok(Payment {
        id,
        order_id,
        transaction_id,
        amount,
        status: PaymentStatus::parse(&status)
            .ok_or_else(|| anyhow!("Corrupt estado '{}' on pago {}", status, id))?,
        method,
        gateway_response,
        paid_at,
        created_at,
    })
}

type AdminRow = (i64, String, String, String, String, bool);

const ADMIN_COLUMNS: &str = "id, nombre, email, password_hash, rol, activo";

fn admin_from_row(row: AdminRow) -> Result<AdminAccount> {
    let (id, name, email, password_hash, role, active) = row;
    Ok(AdminAccount {
        id,
        name,
        email,
        password_hash,
        role: role.parse::<AdminRole>()?,
        active,
    })
}

// ---------------------------------------------------------------------------
// PostgresStore
// ---------------------------------------------------------------------------

/// Relational store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// let store = PostgresStore::connect("postgres://localhost/comanda", 10).await?;
/// comanda::storage::postgres::ensure_schema(store.pool()).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to PostgreSQL: {}", e))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach lines to the given orders with a single query
    async fn with_lines(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
        if orders.is_empty() {
            return Ok(orders);
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT id, pedido_id, producto_id, cantidad, precio_unitario, subtotal \
             FROM detalles_pedidos WHERE pedido_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to load order lines: {}", e))?;

        let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for (id, order_id, product_id, quantity, unit_price, subtotal) in rows {
            by_order.entry(order_id).or_default().push(OrderLine {
                id,
                order_id,
                product_id,
                quantity,
                unit_price,
                subtotal,
            });
        }
        for order in &mut orders {
            order.lines = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }
}

#[async_trait]
impl CatalogService for PostgresStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, (i64, String, Option<String>)>(
            "SELECT id, nombre, descripcion FROM categorias ORDER BY nombre",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to list categories: {}", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, name, description)| Category {
                id,
                name,
                description,
            })
            .collect())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, (i64, String, Option<String>)>(
            "SELECT id, nombre, descripcion FROM categorias WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to get category: {}", e))?;

        Ok(row.map(|(id, name, description)| Category {
            id,
            name,
            description,
        }))
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO categorias (nombre, descripcion) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to create category: {}", e))?;

        Ok(Category {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }

    async fn list_products(&self, filter: ProductFilter, page: Page) -> Result<Paginated<Product>> {
        let (total,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM productos \
             WHERE ($1::BIGINT IS NULL OR categoria_id = $1) \
               AND ($2::BOOLEAN IS NULL OR disponible = $2)",
        )
        .bind(filter.category_id)
        .bind(filter.available)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to count products: {}", e))?;

        let sql = format!(
            "SELECT {} FROM productos \
             WHERE ($1::BIGINT IS NULL OR categoria_id = $1) \
               AND ($2::BOOLEAN IS NULL OR disponible = $2) \
             ORDER BY nombre LIMIT $3 OFFSET $4",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.category_id)
            .bind(filter.available)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to list products: {}", e))?;

        Ok(Paginated::new(
            rows.into_iter().map(product_from_row).collect(),
            page,
            total as usize,
        ))
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM productos WHERE id = $1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to get product: {}", e))?;
        Ok(row.map(product_from_row))
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let sql = format!("SELECT {} FROM productos WHERE id = ANY($1)", PRODUCT_COLUMNS);
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to fetch products: {}", e))?;
        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let sql = format!(
            "INSERT INTO productos (categoria_id, nombre, descripcion, precio, disponible, imagen_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.available)
            .bind(&product.image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to create product: {}", e))?;
        Ok(product_from_row(row))
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>> {
        let sql = format!(
            "UPDATE productos SET \
                categoria_id = COALESCE($2, categoria_id), \
                nombre = COALESCE($3, nombre), \
                descripcion = COALESCE($4, descripcion), \
                precio = COALESCE($5, precio), \
                disponible = COALESCE($6, disponible), \
                imagen_url = COALESCE($7, imagen_url) \
             WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(update.category_id)
            .bind(&update.name)
            .bind(&update.description)
            .bind(update.price)
            .bind(update.available)
            .bind(&update.image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to update product: {}", e))?;
        Ok(row.map(product_from_row))
    }
}

#[async_trait]
impl CustomerService for PostgresStore {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Option<Customer>> {
        let sql = format!(
            "INSERT INTO usuarios (nombre, email, telefono, ciudad, distrito) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CUSTOMER_COLUMNS
        );
        let result = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .bind(&customer.city)
            .bind(&customer.district)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(Some(customer_from_row(row))),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(anyhow!("Failed to create customer: {}", e)),
        }
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let sql = format!("SELECT {} FROM usuarios WHERE id = $1", CUSTOMER_COLUMNS);
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to get customer: {}", e))?;
        Ok(row.map(customer_from_row))
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let sql = format!("SELECT {} FROM usuarios WHERE email = $1", CUSTOMER_COLUMNS);
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to find customer: {}", e))?;
        Ok(row.map(customer_from_row))
    }
}

#[async_trait]
impl OrderService for PostgresStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))?;

        let sql = format!(
            "INSERT INTO pedidos (numero_pedido, usuario_id, total, estado, observaciones) \
             VALUES ($1, $2, $3, 'pendiente', $4) RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&order.order_number)
            .bind(order.customer_id)
            .bind(order.cart.total)
            .bind(&order.notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| anyhow!("Failed to insert order header: {}", e))?;
        let mut created = order_from_row(row)?;

        // Any failure below drops `tx`, which rolls the header back.
        for line in &order.cart.lines {
            let (id,) = sqlx::query_as::<_, (i64,)>(
                "INSERT INTO detalles_pedidos (pedido_id, producto_id, cantidad, precio_unitario, subtotal) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(created.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| anyhow!("Failed to insert order line: {}", e))?;

            created.lines.push(OrderLine {
                id,
                order_id: created.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }

        tx.commit()
            .await
            .map_err(|e| anyhow!("Failed to commit order: {}", e))?;
        Ok(created)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let sql = format!("SELECT {} FROM pedidos WHERE id = $1", ORDER_COLUMNS);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to get order: {}", e))?;

        match row {
            Some(row) => {
                let order = order_from_row(row)?;
                Ok(self.with_lines(vec![order]).await?.pop())
            }
            None => Ok(None),
        }
    }

    async fn list_orders(&self, filter: OrderFilter, page: Page) -> Result<Paginated<Order>> {
        let status = filter.status.map(|s| s.as_str());

        let (total,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM pedidos \
             WHERE ($1::BIGINT IS NULL OR usuario_id = $1) \
               AND ($2::VARCHAR IS NULL OR estado = $2)",
        )
        .bind(filter.customer_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to count orders: {}", e))?;

        let sql = format!(
            "SELECT {} FROM pedidos \
             WHERE ($1::BIGINT IS NULL OR usuario_id = $1) \
               AND ($2::VARCHAR IS NULL OR estado = $2) \
             ORDER BY creado_en DESC, id DESC LIMIT $3 OFFSET $4",
            ORDER_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(filter.customer_id)
            .bind(status)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to list orders: {}", e))?;

        let orders = rows
            .into_iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>>>()?;
        let orders = self.with_lines(orders).await?;
        Ok(Paginated::new(orders, page, total as usize))
    }

    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<StatusUpdate> {
        let sql = format!(
            "UPDATE pedidos SET estado = $3 WHERE id = $1 AND estado = $2 RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(expected.as_str())
            .bind(next.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to update order status: {}", e))?;

        if let Some(row) = row {
            let order = order_from_row(row)?;
            let order = self
                .with_lines(vec![order])
                .await?
                .pop()
                .ok_or_else(|| anyhow!("Order {} vanished after update", id))?;
            return Ok(StatusUpdate::Updated(order));
        }

        let current = sqlx::query_as::<_, (String,)>("SELECT estado FROM pedidos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to read order status: {}", e))?;

        match current {
            Some((status,)) => Ok(StatusUpdate::Stale(
                status
                    .parse::<OrderStatus>()
                    .map_err(|e| anyhow!("Corrupt estado on pedido {}: {}", id, e))?,
            )),
            None => Ok(StatusUpdate::NotFound),
        }
    }

    async fn orders_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM pedidos WHERE creado_en >= $1 AND creado_en < $2 ORDER BY creado_en",
            ORDER_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to list orders by date: {}", e))?;

        let orders = rows
            .into_iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>>>()?;
        self.with_lines(orders).await
    }
}

#[async_trait]
impl PaymentService for PostgresStore {
    async fn completed_payment(&self, order_id: i64) -> Result<Option<Payment>> {
        let sql = format!(
            "SELECT {} FROM pagos WHERE pedido_id = $1 AND estado = 'completado'",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to get completed payment: {}", e))?;
        row.map(payment_from_row).transpose()
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<PaymentInsert> {
        let sql = format!(
            "INSERT INTO pagos (pedido_id, transaccion_id, monto, estado, metodo, respuesta_pasarela, pagado_en) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PAYMENT_COLUMNS
        );
        let result = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment.order_id)
            .bind(&payment.transaction_id)
            .bind(payment.amount)
            .bind(payment.status.as_str())
            .bind(&payment.method)
            .bind(&payment.gateway_response)
            .bind(payment.paid_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(PaymentInsert::Recorded(payment_from_row(row)?)),
            // Only the partial index can reject a payment insert as a duplicate.
            Err(e) if is_unique_violation(&e) => Ok(PaymentInsert::AlreadyCompleted),
            Err(e) => Err(anyhow!("Failed to insert payment: {}", e)),
        }
    }

    async fn payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM pagos WHERE pedido_id = $1 ORDER BY creado_en DESC, id DESC",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to list payments: {}", e))?;
        rows.into_iter().map(payment_from_row).collect()
    }
}

#[async_trait]
impl AdminService for PostgresStore {
    async fn create_admin(&self, admin: NewAdmin) -> Result<AdminAccount> {
        let sql = format!(
            "INSERT INTO administradores (nombre, email, password_hash, rol, activo) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ADMIN_COLUMNS
        );
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(&admin.name)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(admin.role.as_str())
            .bind(admin.active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to create admin: {}", e))?;
        admin_from_row(row)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>> {
        let sql = format!("SELECT {} FROM administradores WHERE email = $1", ADMIN_COLUMNS);
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to find admin: {}", e))?;
        row.map(admin_from_row).transpose()
    }

    async fn get_admin(&self, id: i64) -> Result<Option<AdminAccount>> {
        let sql = format!("SELECT {} FROM administradores WHERE id = $1", ADMIN_COLUMNS);
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to get admin: {}", e))?;
        row.map(admin_from_row).transpose()
    }

    async fn update_admin_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE administradores SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to update admin password: {}", e))?;
        Ok(result.rows_affected() > 0)
    }
}
