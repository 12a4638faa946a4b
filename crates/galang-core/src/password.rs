//! Password hashing and bearer token generation.
//!
//! Stored form: `sha256$<rounds>$<salt hex>$<digest hex>`.

use rand::RngCore as _;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";

pub fn hash_password(password: &str, rounds: u32) -> String {
    let salt = hex::encode(random_bytes::<16>());
    let digest = derive(password, &salt, rounds.max(1));
    format!("{SCHEME}${}${salt}${digest}", rounds.max(1))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(digest), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if scheme != SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };

    constant_time_eq(derive(password, salt, rounds).as_bytes(), digest.as_bytes())
}

/// Fresh opaque bearer token handed to the client once.
pub fn new_session_token() -> String {
    hex::encode(random_bytes::<32>())
}

/// What the sessions table stores in place of the token.
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Short random suffix for gateway references.
pub fn new_reference() -> String {
    hex::encode(random_bytes::<6>())
}

fn derive(password: &str, salt: &str, rounds: u32) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(password.as_bytes())
            .finalize();
    }
    hex::encode(digest)
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse", 50);
        assert!(stored.starts_with("sha256$50$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("correct horse!", &stored));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same", 10), hash_password("same", 10));
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$aa$bb"));
        assert!(!verify_password("x", "sha256$many$aa$bb"));
        assert!(!verify_password("x", "sha256$1$aa$bb$cc"));
    }

    #[test]
    fn test_tokens() {
        let token = new_session_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, new_session_token());
        assert_eq!(token_hash(&token), token_hash(&token));
        assert_ne!(token_hash(&token), token);
        assert_eq!(new_reference().len(), 12);
    }
}
