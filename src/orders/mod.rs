//! Order creation and lifecycle

pub mod builder;
pub mod status;

pub use builder::{
    CartItem, MAX_CART_LINES, MAX_LINE_QUANTITY, OrderBuilder, PlaceOrder, generate_order_number,
};
pub use status::StatusService;
