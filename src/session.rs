//! Login-flow state and signed session tokens.
//!
//! This replaces the upstream dashboard's cookie-based protocol state with
//! two explicit pieces: a short-lived one-time-read store for in-flight
//! authorization values (PKCE verifier, CSRF state) and an HMAC-signed token
//! codec for the session itself. Nothing here touches the metrics engine.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// In-flight authorization values expire after ten minutes.
pub const EPHEMERAL_TTL_SECS: i64 = 10 * 60;
/// Sessions expire seven days after they are sealed.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Random CSRF state, 32 bytes hex-encoded.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Random PKCE code verifier, 32 bytes base64url-encoded.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge for a verifier.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// One-time-read store for short-lived login-flow values.
///
/// `take` removes the entry whether or not it is still live, so a value can
/// be read at most once; expired entries read as absent.
#[derive(Debug)]
pub struct EphemeralStore {
    ttl: Duration,
    entries: HashMap<String, Entry>,
}

impl EphemeralStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::seconds(EPHEMERAL_TTL_SECS))
    }

    pub fn put(&mut self, key: &str, value: &str) {
        self.put_at(key, value, Utc::now());
    }

    pub fn put_at(&mut self, key: &str, value: &str, now: DateTime<Utc>) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn take(&mut self, key: &str) -> Option<String> {
        self.take_at(key, Utc::now())
    }

    pub fn take_at(&mut self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let entry = self.entries.remove(key)?;
        if entry.expires_at <= now {
            return None;
        }
        Some(entry.value)
    }

    /// Drop expired entries without reading them.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, e| e.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

/// Upstream access/refresh token pair carried inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Upstream token expiry, seconds since the epoch.
    pub expires_at: i64,
}

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    tokens: AuthTokens,
    /// Session expiry, seconds since the epoch.
    exp: i64,
}

/// Seal tokens into a signed session string: `base64url(claims JSON)` and
/// `base64url(HMAC-SHA256 tag)` joined by a dot. The session expiry is part
/// of the signed claims.
pub fn seal_session(tokens: &AuthTokens, secret: &[u8]) -> Result<String> {
    seal_session_at(tokens, secret, Utc::now())
}

pub fn seal_session_at(
    tokens: &AuthTokens,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<String> {
    let claims = SessionClaims {
        tokens: tokens.clone(),
        exp: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
    };
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let tag = URL_SAFE_NO_PAD.encode(hmac_sha256(secret, payload.as_bytes()));
    Ok(format!("{payload}.{tag}"))
}

/// Verify and open a sealed session, rejecting tampered, malformed, and
/// expired tokens.
pub fn open_session(token: &str, secret: &[u8]) -> Result<AuthTokens> {
    open_session_at(token, secret, Utc::now())
}

pub fn open_session_at(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<AuthTokens> {
    let (payload, tag) = token
        .split_once('.')
        .ok_or_else(|| Error::Session("malformed token".into()))?;

    let given = URL_SAFE_NO_PAD
        .decode(tag)
        .map_err(|_| Error::Session("malformed signature".into()))?;
    let expected = hmac_sha256(secret, payload.as_bytes());
    if !constant_time_eq(&expected, &given) {
        return Err(Error::Session("signature mismatch".into()));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| Error::Session("malformed payload".into()))?;
    let claims: SessionClaims =
        serde_json::from_slice(&raw).map_err(|_| Error::Session("malformed claims".into()))?;

    if claims.exp <= now.timestamp() {
        return Err(Error::Session("session expired".into()));
    }
    Ok(claims.tokens)
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;

    let mut block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        let digest: [u8; 32] = Sha256::digest(key).into();
        block[..digest.len()].copy_from_slice(&digest);
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let ipad: Vec<u8> = block.iter().map(|b| b ^ 0x36).collect();
    let opad: Vec<u8> = block.iter().map(|b| b ^ 0x5c).collect();

    let mut inner = Sha256::new();
    inner.update(&ipad);
    inner.update(message);
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(&opad);
    outer.update(inner_hash);
    outer.finalize().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
