//! Storefront customers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A registered customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(min = 2, max = 150, message = "name must have 2 to 150 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

impl NewCustomer {
    /// Trim the name and lowercase the email before storing
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self
    }
}
