//! Admin session guard: credentials, password hashes, login

pub mod password;
pub mod service;
pub mod session;

pub use password::{check_password_policy, hash_password, verify_password};
pub use service::{AdminAuthService, LoginResponse};
pub use session::{IssuedSession, SessionClaims, SessionGuard};
