//! Back-office staff accounts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff role; informational, every active admin may use the back office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Gerente,
    Cocinero,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Gerente => "gerente",
            AdminRole::Cocinero => "cocinero",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AdminRole::Admin),
            "gerente" => Ok(AdminRole::Gerente),
            "cocinero" => Ok(AdminRole::Cocinero),
            other => Err(anyhow::anyhow!("unknown admin role '{}'", other)),
        }
    }
}

/// Stored admin record, including the password hash
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub active: bool,
}

/// Public view of an admin, never carries the hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub active: bool,
}

impl From<&AdminAccount> for AdminProfile {
    fn from(account: &AdminAccount) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            active: account.active,
        }
    }
}
