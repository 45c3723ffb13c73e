use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore};
use sha2::Sha256;

use crate::constants::{PUBLIC_ID_ALPHABET, PUBLIC_ID_LENGTH, STORAGE_KEY_RANDOM_BYTES};
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Verify a password against a PHC-format hash string.
///
/// A malformed stored hash is an internal error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// =============================================================================
// Signatures and Session Tokens
// =============================================================================

/// Hex-encoded HMAC-SHA256 of `data`
pub fn sign(data: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so construction cannot fail
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify HMAC-SHA256 signature (constant time)
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

/// Issue a session token for `user_id`
///
/// Format: `{user_id}.{expires_at}.{hex hmac of the first two parts}`
pub fn issue_token(user_id: &str, secret: &str, now: i64, ttl_secs: i64) -> String {
    let payload = format!("{}.{}", user_id, now + ttl_secs);
    let signature = sign(&payload, secret);
    format!("{}.{}", payload, signature)
}

/// Return the user id carried by a valid, unexpired token
pub fn verify_token(token: &str, secret: &str, now: i64) -> Option<String> {
    let (payload, signature) = token.rsplit_once('.')?;
    if !verify_hmac(payload, signature, secret) {
        tracing::warn!("Session token with invalid signature");
        return None;
    }

    let (user_id, expires_at) = payload.rsplit_once('.')?;
    let expires_at: i64 = expires_at.parse().ok()?;
    if user_id.is_empty() || expires_at <= now {
        tracing::debug!("Session token expired at {}", expires_at);
        return None;
    }

    Some(user_id.to_string())
}

// =============================================================================
// Random Identifiers
// =============================================================================

/// Random base36 alias used to share a card without exposing its id
pub fn generate_public_id() -> String {
    let mut rng = rand::thread_rng();
    (0..PUBLIC_ID_LENGTH)
        .map(|_| PUBLIC_ID_ALPHABET[rng.gen_range(0..PUBLIC_ID_ALPHABET.len())] as char)
        .collect()
}

/// Object storage key for an upload: `uploads/{owner}/{random hex}[.{ext}]`
pub fn generate_storage_key(owner_id: &str, filename: &str) -> String {
    let mut bytes = [0u8; STORAGE_KEY_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let random_id = hex::encode(bytes);

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim())
        .filter(|ext| !ext.is_empty());

    match extension {
        Some(ext) => format!("uploads/{}/{}.{}", owner_id, random_id, ext),
        None => format!("uploads/{}/{}", owner_id, random_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_hmac_sign_and_verify() {
        let signature = sign("payload", SECRET);
        assert_eq!(signature.len(), 64);
        assert!(verify_hmac("payload", &signature, SECRET));
        assert!(!verify_hmac("payload", &signature, "other-secret"));
        assert!(!verify_hmac("tampered", &signature, SECRET));
        assert!(!verify_hmac("payload", "not-hex", SECRET));
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("user-123", SECRET, 1_000, 60);
        assert_eq!(verify_token(&token, SECRET, 1_030).as_deref(), Some("user-123"));
    }

    #[test]
    fn test_token_expiry() {
        let token = issue_token("user-123", SECRET, 1_000, 60);
        assert!(verify_token(&token, SECRET, 1_060).is_none());
    }

    #[test]
    fn test_token_tampering() {
        let token = issue_token("user-123", SECRET, 1_000, 60);
        let forged = token.replacen("user-123", "user-999", 1);
        assert!(verify_token(&forged, SECRET, 1_010).is_none());
        assert!(verify_token(&token, "other-secret", 1_010).is_none());
        assert!(verify_token("garbage", SECRET, 1_010).is_none());
    }

    #[test]
    fn test_generate_public_id() {
        let id = generate_public_id();
        assert_eq!(id.len(), PUBLIC_ID_LENGTH);
        assert!(id.bytes().all(|b| PUBLIC_ID_ALPHABET.contains(&b)));
        assert_ne!(id, generate_public_id());
    }

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("user-1", "avatar.photo.png");
        assert!(key.starts_with("uploads/user-1/"));
        assert!(key.ends_with(".png"));
        // prefix + 32 hex chars + ".png"
        assert_eq!(key.len(), "uploads/user-1/".len() + 32 + 4);

        let bare = generate_storage_key("user-1", "README");
        assert_eq!(bare.len(), "uploads/user-1/".len() + 32);
    }
}
