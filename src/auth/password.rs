//! Salted password hashes and the admin password policy

use crate::core::error::ValidationError;
use anyhow::{Result, anyhow};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use regex::Regex;
use std::sync::OnceLock;

static UPPERCASE_REGEX: OnceLock<Regex> = OnceLock::new();
static DIGIT_REGEX: OnceLock<Regex> = OnceLock::new();

fn has_uppercase(password: &str) -> bool {
    UPPERCASE_REGEX
        .get_or_init(|| Regex::new(r"\p{Lu}").unwrap())
        .is_match(password)
}

fn has_digit(password: &str) -> bool {
    DIGIT_REGEX
        .get_or_init(|| Regex::new(r"[0-9]").unwrap())
        .is_match(password)
}

/// PHC-format argon2id hash with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Constant-time check of `password` against a stored hash
///
/// An unparseable stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// At least `min_len` characters, one uppercase letter and one digit
pub fn check_password_policy(password: &str, min_len: usize) -> Result<(), ValidationError> {
    if password.chars().count() < min_len {
        return Err(ValidationError::field(
            "new_password",
            format!("password must have at least {min_len} characters"),
        ));
    }
    if !has_uppercase(password) {
        return Err(ValidationError::field(
            "new_password",
            "password must contain an uppercase letter",
        ));
    }
    if !has_digit(password) {
        return Err(ValidationError::field(
            "new_password",
            "password must contain a digit",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Cocina2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Cocina2024", &hash));
        assert!(!verify_password("cocina2024", &hash));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(
            hash_password("Cocina2024").unwrap(),
            hash_password("Cocina2024").unwrap()
        );
    }

    #[test]
    fn test_corrupt_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_policy() {
        assert!(check_password_policy("Cocina2024", 8).is_ok());
        assert!(check_password_policy("Co1", 8).is_err());
        assert!(check_password_policy("cocina2024", 8).is_err());
        assert!(check_password_policy("CocinaPeru", 8).is_err());
        assert!(check_password_policy("Ñandú2024", 8).is_ok());
    }
}
