//! PBKDF2-HMAC-SHA256 credential hashes.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt hex>$<derived key hex>`.
//! The iteration count travels with the hash so it can be raised later
//! without invalidating existing passwords.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_BYTES: usize = 16;

#[cfg(not(test))]
const ITERATIONS: u32 = 100_000;
#[cfg(test)]
const ITERATIONS: u32 = 1_000;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> String {
    let mut rng = rand::thread_rng();
    let salt: [u8; SALT_BYTES] = rng.gen();
    match derive(password, &salt, ITERATIONS) {
        Some(key) => format!(
            "{}${}${}${}",
            SCHEME,
            ITERATIONS,
            hex::encode(salt),
            hex::encode(key)
        ),
        // HMAC takes keys of any length; an empty string never verifies.
        None => String::new(),
    }
}

/// False for malformed stored hashes as well as wrong passwords.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Some(iterations) = iterations.parse::<u32>().ok().filter(|n| *n > 0) else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    match derive(password, &salt, iterations) {
        Some(key) => constant_time_eq(hex::encode(key).as_bytes(), expected.as_bytes()),
        None => false,
    }
}

/// Single-block PBKDF2 (RFC 8018): the SHA-256 output is the whole key.
fn derive(password: &str, salt: &[u8], iterations: u32) -> Option<Vec<u8>> {
    let prf = HmacSha256::new_from_slice(password.as_bytes()).ok()?;

    let mut mac = prf.clone();
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut block = mac.finalize().into_bytes();
    let mut key = block.to_vec();

    for _ in 1..iterations {
        let mut mac = prf.clone();
        mac.update(&block);
        block = mac.finalize().into_bytes();
        for (k, b) in key.iter_mut().zip(block.iter()) {
            *k ^= b;
        }
    }
    Some(key)
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
