//! # Credentials
//!
//! Sign-up validation, password hashing, and session token generation.
//!
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`), which
//! carry their own salt and parameters.

use crate::error::{CoreError, Result};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use uuid::Uuid;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Default session lifetime, in days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Validated sign-up input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUp {
    /// Validate raw form input. Email is normalized to lowercase.
    pub fn parse(name: &str, email: &str, password: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::invalid("Name is required"));
        }
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

/// Trim, lowercase, and check the shape `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let invalid = || CoreError::invalid("Invalid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(email)
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| CoreError::Credentials(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreError::Credentials(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. A malformed hash never
/// verifies.
#[must_use]
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Opaque 64-hex-character session token.
#[must_use]
pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_validation() {
        assert!(SignUp::parse("Ana", "ana@example.com", "secret").is_ok());
        assert!(SignUp::parse("  ", "ana@example.com", "secret").is_err());
        assert!(SignUp::parse("Ana", "ana@example.com", "short").is_err());
        assert!(SignUp::parse("Ana", "not-an-email", "secret").is_err());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email("  Ana@Example.COM ").unwrap(),
            "ana@example.com"
        );
        assert!(normalize_email("ana@example").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ana@@example.com").is_err());
        assert!(normalize_email("ana@example..com").is_err());
    }

    #[test]
    fn password_hash_is_argon2id_phc() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("hunter22"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("hunter22", &b));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("hunter22", ""));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn tokens_are_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
