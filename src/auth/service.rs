//! Admin login, profile and password change

use super::password::{check_password_policy, hash_password, verify_password};
use super::session::{IssuedSession, SessionGuard};
use crate::core::admin::{AdminAccount, AdminProfile, AdminRole};
use crate::core::error::{ComandaResult, EntityError, RequestError};
use crate::core::service::{NewAdmin, Store};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Returned by a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminProfile,
}

/// Ties admin accounts to session credentials
#[derive(Clone)]
pub struct AdminAuthService {
    store: Arc<dyn Store>,
    guard: SessionGuard,
    min_password_len: usize,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// argon2 is CPU bound; keep it off the async workers
async fn hash_blocking(password: String) -> ComandaResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow!("password hashing task failed: {}", e))??;
    Ok(hash)
}

async fn verify_blocking(password: String, stored_hash: String) -> ComandaResult<bool> {
    Ok(
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| anyhow!("password verification task failed: {}", e))?,
    )
}

impl AdminAuthService {
    pub fn new(store: Arc<dyn Store>, guard: SessionGuard, min_password_len: usize) -> Self {
        Self {
            store,
            guard,
            min_password_len,
        }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Check credentials and issue a session
    ///
    /// Unknown email or wrong password is 401; a deactivated account is 403
    /// and never receives a credential.
    pub async fn authenticate(&self, email: &str, password: &str) -> ComandaResult<LoginResponse> {
        let email = normalize_email(email);
        let Some(admin) = self.store.find_admin_by_email(&email).await? else {
            tracing::warn!(email = %email, "login for unknown admin");
            return Err(RequestError::unauthorized("invalid email or password").into());
        };

        if !admin.active {
            tracing::warn!(admin_id = admin.id, "login attempt on deactivated account");
            return Err(RequestError::forbidden("account is deactivated").into());
        }

        if !verify_blocking(password.to_string(), admin.password_hash.clone()).await? {
            tracing::warn!(admin_id = admin.id, "wrong password");
            return Err(RequestError::unauthorized("invalid email or password").into());
        }

        let IssuedSession { token, expires_at } = self.guard.issue(&admin)?;
        tracing::info!(admin_id = admin.id, role = %admin.role, "admin logged in");

        Ok(LoginResponse {
            token,
            expires_at,
            admin: AdminProfile::from(&admin),
        })
    }

    /// The account behind a verified credential; deactivated accounts are refused
    pub async fn active_account(&self, admin_id: i64) -> ComandaResult<AdminAccount> {
        let admin = self
            .store
            .get_admin(admin_id)
            .await?
            .ok_or_else(|| RequestError::unauthorized("credential no longer valid"))?;
        if !admin.active {
            return Err(RequestError::forbidden("account is deactivated").into());
        }
        Ok(admin)
    }

    /// Replace the password after re-verifying the current one
    pub async fn change_password(
        &self,
        admin_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ComandaResult<()> {
        let admin = self.active_account(admin_id).await?;

        if !verify_blocking(current_password.to_string(), admin.password_hash.clone()).await? {
            tracing::warn!(admin_id, "password change with wrong current password");
            return Err(RequestError::unauthorized("current password is incorrect").into());
        }
        check_password_policy(new_password, self.min_password_len)?;

        let hash = hash_blocking(new_password.to_string()).await?;
        if !self.store.update_admin_password(admin_id, &hash).await? {
            return Err(EntityError::not_found("admin", admin_id).into());
        }
        tracing::info!(admin_id, "admin password changed");
        Ok(())
    }

    /// Create an account with a policy-checked password
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: AdminRole,
    ) -> ComandaResult<AdminAccount> {
        check_password_policy(password, self.min_password_len)?;
        let email = normalize_email(email);
        if self.store.find_admin_by_email(&email).await?.is_some() {
            return Err(EntityError::AlreadyExists {
                entity_type: "admin".to_string(),
                key: email,
            }
            .into());
        }
        let password_hash = hash_blocking(password.to_string()).await?;
        let admin = self
            .store
            .create_admin(NewAdmin {
                name: name.trim().to_string(),
                email,
                password_hash,
                role,
                active: true,
            })
            .await?;
        Ok(admin)
    }

    /// Create the account unless one with this email exists; returns whether it was created
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: AdminRole,
    ) -> ComandaResult<bool> {
        if self
            .store
            .find_admin_by_email(&normalize_email(email))
            .await?
            .is_some()
        {
            return Ok(false);
        }
        let admin = self.register(name, email, password, role).await?;
        tracing::info!(admin_id = admin.id, "bootstrap admin created");
        Ok(true)
    }
}
