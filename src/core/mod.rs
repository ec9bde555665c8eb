//! Core module containing domain types and storage traits

pub mod admin;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod query;
pub mod service;
pub mod status;

pub use admin::{AdminAccount, AdminProfile, AdminRole};
pub use catalog::{Category, NewProduct, Product, ProductFilter, ProductUpdate};
pub use customer::{Customer, NewCustomer};
pub use error::{ComandaError, ComandaResult};
pub use order::{NewOrder, Order, OrderFilter, OrderLine, PaymentMethod, PricedCart, PricedLine};
pub use payment::{NewPayment, Payment, PaymentInsert, PaymentStatus};
pub use query::{Page, PageRequest, Paginated};
pub use service::{
    AdminService, CatalogService, CustomerService, NewAdmin, OrderService, PaymentService,
    StatusUpdate, Store,
};
pub use status::OrderStatus;
