//! Session token format.
//!
//! A token is `base64(json claims) + "." + hex(keyed-blake3 mac)`. The MAC
//! key lives only in the issuer process; anything that fails to verify is
//! treated as unauthorized without further distinction. There is no
//! revocation list - a leaked token stays valid until its expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use steward_types::{CoreError, CoreResult, RoleId, UserId};

/// What a token is good for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Role-scoped session token; authorizes operations until expiry.
    Full,
    /// Short-lived token issued mid-login to a multi-role user; only
    /// accepted by role selection.
    Provisional,
}

/// The authenticated identity a token carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub username: String,
    pub role_id: RoleId,
    pub kind: TokenKind,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl SessionClaims {
    pub fn is_expired_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An encoded, signed token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signs and verifies session tokens with a keyed BLAKE3 MAC.
#[derive(Clone)]
pub struct TokenSigner {
    key: [u8; 32],
}

impl TokenSigner {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Fresh random key; tokens do not survive a process restart.
    pub fn from_random_key() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn encode(&self, claims: &SessionClaims) -> CoreResult<SessionToken> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| CoreError::internal(format!("token encode: {e}")))?;
        let body = URL_SAFE_NO_PAD.encode(&payload);
        let mac = blake3::keyed_hash(&self.key, body.as_bytes());
        Ok(SessionToken(format!("{}.{}", body, mac.to_hex())))
    }

    /// Verify the MAC and decode the claims. Expiry is the caller's check;
    /// this only establishes that the issuer minted the token.
    pub fn decode(&self, token: &SessionToken) -> CoreResult<SessionClaims> {
        let (body, mac_hex) = token
            .0
            .split_once('.')
            .ok_or_else(|| CoreError::Unauthorized("malformed token".into()))?;

        let expected = blake3::keyed_hash(&self.key, body.as_bytes());
        let presented: [u8; 32] = hex::decode(mac_hex)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| CoreError::Unauthorized("malformed token".into()))?;
        // constant-time comparison via blake3::Hash
        if blake3::Hash::from(presented) != expected {
            return Err(CoreError::Unauthorized("token signature mismatch".into()));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| CoreError::Unauthorized("malformed token".into()))?;
        serde_json::from_slice(&payload)
            .map_err(|_| CoreError::Unauthorized("malformed token".into()))
    }
}
