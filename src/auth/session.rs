//! Signed, time-limited admin credentials
//!
//! Format: `v1.<base64url(json claims)>.<base64url(hmac-sha256)>`. The
//! signature covers the encoded claims segment.

use crate::core::admin::{AdminAccount, AdminRole};
use crate::core::error::RequestError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";
const MAX_TOKEN_LEN: usize = 2048;

/// What a credential asserts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin id
    pub sub: i64,
    pub email: String,
    pub role: AdminRole,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// A freshly issued credential
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies admin credentials
#[derive(Clone)]
pub struct SessionGuard {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    fn mac(&self) -> Result<HmacSha256, RequestError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| RequestError::unauthorized("session signing unavailable"))
    }

    /// Sign a credential for `admin`, valid from `now` for the configured TTL
    pub fn issue_at(&self, admin: &AdminAccount, now: DateTime<Utc>) -> Result<IssuedSession, RequestError> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: admin.id,
            email: admin.email.clone(),
            role: admin.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let payload = serde_json::to_vec(&claims)
            .map_err(|_| RequestError::unauthorized("session encoding failed"))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedSession {
            token: format!("{TOKEN_VERSION}.{payload_part}.{sig_part}"),
            expires_at,
        })
    }

    pub fn issue(&self, admin: &AdminAccount) -> Result<IssuedSession, RequestError> {
        self.issue_at(admin, Utc::now())
    }

    /// Check signature and expiry as of `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, RequestError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(RequestError::unauthorized("malformed credential"));
        }
        let mut parts = token.split('.');
        let (Some(version), Some(payload_part), Some(sig_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(RequestError::unauthorized("malformed credential"));
        };
        if version != TOKEN_VERSION {
            return Err(RequestError::unauthorized("unsupported credential version"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| RequestError::unauthorized("malformed credential"))?;
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| RequestError::unauthorized("invalid credential signature"))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| RequestError::unauthorized("malformed credential"))?;
        let claims: SessionClaims = serde_json::from_slice(&payload)
            .map_err(|_| RequestError::unauthorized("malformed credential"))?;

        if claims.exp <= now.timestamp() {
            return Err(RequestError::unauthorized("credential expired"));
        }
        Ok(claims)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, RequestError> {
        self.verify_at(token, Utc::now())
    }
}
