//! One-way password fingerprints for the fallback cache.
//!
//! A fingerprint is `SHA-256(salt || password)`. The salt is generated once per
//! [`FingerprintHasher`], so fingerprints are only comparable within the cache
//! instance that produced them.

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 32;

/// Digest of a password. The clear-text value cannot be recovered from it.
#[derive(Clone)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compare in constant time with respect to the digest contents.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fingerprint([REDACTED])")
    }
}

pub struct FingerprintHasher {
    salt: [u8; SALT_LEN],
}

impl FingerprintHasher {
    /// Create a hasher with a fresh random salt.
    #[must_use]
    pub fn new() -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self { salt }
    }

    #[must_use]
    pub fn with_salt(salt: [u8; SALT_LEN]) -> Self {
        Self { salt }
    }

    #[must_use]
    pub fn fingerprint(&self, password: &SecretString) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.salt);
        hasher.update(password.expose_secret().as_bytes());
        Fingerprint(hasher.finalize().into())
    }
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FingerprintHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn same_password_same_fingerprint() {
        let hasher = FingerprintHasher::new();
        let a = hasher.fingerprint(&secret("correct horse"));
        let b = hasher.fingerprint(&secret("correct horse"));
        assert!(a.matches(&b));
    }

    #[test]
    fn different_password_different_fingerprint() {
        let hasher = FingerprintHasher::new();
        let a = hasher.fingerprint(&secret("correct horse"));
        let b = hasher.fingerprint(&secret("correct horsf"));
        assert!(!a.matches(&b));
    }

    #[test]
    fn fingerprint_never_contains_password() {
        let hasher = FingerprintHasher::new();
        let password = "01234567890123456789012345678901";
        let fp = hasher.fingerprint(&secret(password));
        assert_ne!(fp.as_bytes(), password.as_bytes());
        assert_eq!(format!("{fp:?}"), "Fingerprint([REDACTED])");
    }

    #[test]
    fn salt_changes_digest() {
        let a = FingerprintHasher::with_salt([1; SALT_LEN]).fingerprint(&secret("pw"));
        let b = FingerprintHasher::with_salt([2; SALT_LEN]).fingerprint(&secret("pw"));
        assert!(!a.matches(&b));
    }

    #[test]
    fn unsalted_sha256_is_not_stored() {
        let fp = FingerprintHasher::with_salt([7; SALT_LEN]).fingerprint(&secret("hunter2"));
        let plain: [u8; 32] = Sha256::digest(b"hunter2").into();
        assert_ne!(fp.as_bytes(), &plain);
    }
}
