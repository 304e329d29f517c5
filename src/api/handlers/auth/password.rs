//! Password hashing for the credential verifier.
//!
//! Hashes are argon2 PHC strings; verification parses whatever is stored, so
//! parameter upgrades only affect newly hashed passwords.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

pub(super) const MIN_PASSWORD_LENGTH: usize = 8;

pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Constant result shape: any parse or verify failure is just "no match".
pub(super) fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let hash = hash_password("pw123456")?;
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pw123456", &hash));
        assert!(!verify_password("pw1234567", &hash));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("pw123456")?;
        let second = hash_password("pw123456")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("pw123456", "not-a-phc-string"));
    }
}
