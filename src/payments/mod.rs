//! Payment settlement

pub mod coordinator;

pub use coordinator::{
    GENERIC_REJECTION, PayOrder, PaymentCoordinator, PaymentHistory, PaymentReceipt,
};
