//! Password hashing and verification.
//!
//! Passwords are stored as iterated salted SHA-256 in a self-describing
//! `sha256$<iterations>$<salt>$<digest>` encoding, so the iteration count
//! can be raised later without invalidating existing rows.

use rand::RngCore;
use sha2::{Digest, Sha256};

const ITERATIONS: u32 = 100_000;
const SALT_BYTES: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    let digest = digest_password(password, &salt_hex, ITERATIONS);
    format!("sha256${}${}${}", ITERATIONS, salt_hex, digest)
}

/// Verify a password against a stored hash. Malformed stored values
/// verify as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some("sha256"), Some(iterations), Some(salt), Some(digest), None) => {
            let Ok(iterations) = iterations.parse::<u32>() else {
                return false;
            };
            digest_password(password, salt, iterations) == digest
        }
        _ => false,
    }
}

fn digest_password(password: &str, salt: &str, iterations: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut output = hasher.finalize();
    for _ in 1..iterations {
        output = Sha256::digest(output);
    }
    hex::encode(output)
}
