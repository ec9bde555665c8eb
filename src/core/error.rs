//! Typed error handling for the ordering service
//!
//! Every failure a handler can produce is a [`ComandaError`]. Each category
//! knows its HTTP status and a stable error code, so clients can branch on
//! `code` instead of parsing messages.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed or out-of-range input (400)
//! - [`EntityError`]: referenced entity absent or duplicated (404 / 409)
//! - [`PaymentError`]: settlement outcomes that are not a plain success
//! - [`RequestError`]: credential problems (401 / 403)
//! - [`ConfigError`]: configuration parsing and validation
//!
//! # Example
//!
//! ```rust,ignore
//! use comanda::prelude::*;
//!
//! match coordinator.pay(request).await {
//!     Ok(receipt) => println!("paid: {}", receipt.payment.id),
//!     Err(ComandaError::Payment(PaymentError::AlreadyPaid { order_id })) => {
//!         println!("order {} was already settled", order_id);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Message returned to clients for failures whose detail stays server-side
const GENERIC_INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// The main error type of the service
#[derive(Debug, Error)]
pub enum ComandaError {
    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Entity lookup/uniqueness errors
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Payment settlement errors
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Credential errors
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store and infrastructure failures; detail is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used by the domain services
pub type ComandaResult<T> = std::result::Result<T, ComandaError>;

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComandaError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ComandaError::Validation(_) => StatusCode::BAD_REQUEST,
            ComandaError::Entity(e) => e.status_code(),
            ComandaError::Payment(e) => e.status_code(),
            ComandaError::Request(e) => e.status_code(),
            ComandaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ComandaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ComandaError::Validation(e) => e.error_code(),
            ComandaError::Entity(e) => e.error_code(),
            ComandaError::Payment(e) => e.error_code(),
            ComandaError::Request(e) => e.error_code(),
            ComandaError::Config(_) => "CONFIG_ERROR",
            ComandaError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the message may be shown to the client verbatim
    fn is_client_visible(&self) -> bool {
        !matches!(self, ComandaError::Config(_) | ComandaError::Internal(_))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        let message = if self.is_client_visible() {
            self.to_string()
        } else {
            GENERIC_INTERNAL_MESSAGE.to_string()
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ComandaError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({ "entity_type": entity_type, "id": id }))
            }
            ComandaError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            ComandaError::Validation(ValidationError::UnknownProducts { ids }) => {
                Some(serde_json::json!({ "product_ids": ids }))
            }
            ComandaError::Validation(ValidationError::UnavailableProducts { names }) => {
                Some(serde_json::json!({ "products": names }))
            }
            ComandaError::Validation(ValidationError::InvalidTransition { from, to }) => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            ComandaError::Payment(PaymentError::OutcomeUnknown {
                order_id,
                payment_id,
            })
            | ComandaError::Payment(PaymentError::ReconciliationRequired {
                order_id,
                payment_id,
            }) => Some(serde_json::json!({ "order_id": order_id, "payment_id": payment_id })),
            _ => None,
        }
    }
}

impl IntoResponse for ComandaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ComandaError {
    fn from(err: anyhow::Error) -> Self {
        ComandaError::Internal(format!("{:#}", err))
    }
}

impl From<JsonRejection> for ComandaError {
    fn from(rejection: JsonRejection) -> Self {
        ComandaError::Validation(ValidationError::InvalidJson {
            message: rejection.body_text(),
        })
    }
}

impl From<QueryRejection> for ComandaError {
    fn from(rejection: QueryRejection) -> Self {
        ComandaError::Validation(ValidationError::InvalidQuery {
            message: rejection.body_text(),
        })
    }
}

impl From<PathRejection> for ComandaError {
    fn from(rejection: PathRejection) -> Self {
        ComandaError::Validation(ValidationError::InvalidPath {
            message: rejection.body_text(),
        })
    }
}

impl From<validator::ValidationErrors> for ComandaError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ComandaError::Validation(ValidationError::FieldErrors(fields))
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A single field is invalid
    #[error("Invalid field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Several fields are invalid
    #[error("Validation failed for {} field(s)", .0.len())]
    FieldErrors(Vec<FieldValidationError>),

    /// Request body could not be parsed
    #[error("Invalid JSON body: {message}")]
    InvalidJson { message: String },

    /// Query string could not be parsed
    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },

    /// A path segment could not be parsed
    #[error("Invalid path parameter: {message}")]
    InvalidPath { message: String },

    /// Cart has no lines
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has more lines than accepted
    #[error("Cart has {count} lines, at most {max} are accepted")]
    CartTooLarge { count: usize, max: usize },

    /// A line quantity is outside `1..=max`
    #[error("Quantity for product {product_id} must be between 1 and {max} (got {quantity})")]
    InvalidQuantity {
        product_id: i64,
        quantity: i64,
        max: i64,
    },

    /// The priced cart exceeds the largest amount that can be stored or charged
    #[error("Order total {total} exceeds the maximum of {max}")]
    TotalTooLarge { total: String, max: String },

    /// Some referenced products do not exist
    #[error("Some products do not exist: {ids:?}")]
    UnknownProducts { ids: Vec<i64> },

    /// Some referenced products are not currently offered
    #[error("Products not available: {}", names.join(", "))]
    UnavailableProducts { names: Vec<String> },

    /// Status string is not one of the known order states
    #[error("Invalid order status '{value}'")]
    InvalidStatus { value: String },

    /// Transition is not allowed by the order lifecycle
    #[error("Order cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// The order cannot accept a payment in its current state
    #[error("Order in state '{status}' cannot be paid")]
    OrderNotPayable { status: String },
}

/// A field-level validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidStatus { .. } => "INVALID_ORDER_STATUS",
            ValidationError::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
            _ => "VALIDATION_ERROR",
        }
    }

    /// Shorthand for a single-field error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entity lookups
#[derive(Debug, Error)]
pub enum EntityError {
    /// Entity was not found
    #[error("{entity_type} '{id}' not found")]
    NotFound { entity_type: String, id: String },

    /// Entity with the same unique key already exists
    #[error("{entity_type} '{key}' already exists")]
    AlreadyExists { entity_type: String, key: String },
}

impl EntityError {
    /// Build a not-found error for any displayable identifier
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::AlreadyExists { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
        }
    }
}

// =============================================================================
// Payment Errors
// =============================================================================

/// Settlement outcomes other than a clean success
#[derive(Debug, Error)]
pub enum PaymentError {
    /// A completed payment already exists for the order
    #[error("Order {order_id} already has a completed payment")]
    AlreadyPaid { order_id: i64 },

    /// The gateway declined the charge or failed
    #[error("{message}")]
    Rejected { order_id: i64, message: String },

    /// The gateway did not answer in time; the charge may or may not exist
    #[error(
        "Payment outcome for order {order_id} is unknown; it will be reconciled manually (attempt {payment_id})"
    )]
    OutcomeUnknown { order_id: i64, payment_id: i64 },

    /// The gateway charged again while another attempt had already completed
    #[error("Order {order_id} was charged twice (transaction {transaction_id}); a refund is required")]
    DuplicateCharge {
        order_id: i64,
        transaction_id: String,
    },

    /// The payment was recorded but the order could not be confirmed
    #[error("Payment {payment_id} was recorded but order {order_id} could not be confirmed")]
    ReconciliationRequired { order_id: i64, payment_id: i64 },
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::AlreadyPaid { .. } => StatusCode::CONFLICT,
            PaymentError::Rejected { .. } => StatusCode::BAD_REQUEST,
            PaymentError::OutcomeUnknown { .. } => StatusCode::GATEWAY_TIMEOUT,
            PaymentError::DuplicateCharge { .. } => StatusCode::CONFLICT,
            PaymentError::ReconciliationRequired { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PaymentError::AlreadyPaid { .. } => "PAYMENT_ALREADY_COMPLETED",
            PaymentError::Rejected { .. } => "PAYMENT_REJECTED",
            PaymentError::OutcomeUnknown { .. } => "PAYMENT_OUTCOME_UNKNOWN",
            PaymentError::DuplicateCharge { .. } => "PAYMENT_DUPLICATE_CHARGE",
            PaymentError::ReconciliationRequired { .. } => "PAYMENT_RECONCILIATION_REQUIRED",
        }
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to admin credentials
#[derive(Debug, Error)]
pub enum RequestError {
    /// Missing, invalid or expired credential, or bad login
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Authenticated but not allowed (e.g. deactivated account)
    #[error("Forbidden: {message}")]
    Forbidden { message: String },
}

impl RequestError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        RequestError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        RequestError::Forbidden {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse a configuration file
    #[error("Failed to parse config{}: {message}", file.as_ref().map(|f| format!(" '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// A configuration value is invalid
    #[error("Invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
