//! Signed, time-limited bearer tokens (HS256, JWT compact form).
//!
//! Claims carry the actor id and role. The API trusts a token that verifies
//! and has not expired; nothing is looked up per request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::CryptoError;
use crate::models::{Actor, Role};

type HmacSha256 = Hmac<Sha256>;

pub const MIN_SECRET_LENGTH: usize = 32;

/// Fixed header; only HS256 is ever issued or accepted.
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SigningKey(Vec<u8>);

/// Issues and verifies bearer tokens. Secret zeroed on drop.
#[derive(Clone)]
pub struct TokenSigner {
    key: SigningKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, CryptoError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(CryptoError::WeakSecret(secret.len()));
        }
        Ok(Self {
            key: SigningKey(secret.to_vec()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        <HmacSha256 as Mac>::new_from_slice(&self.key.0)
            .map_err(|_| CryptoError::WeakSecret(self.key.0.len()))
    }

    /// Issue a token for `actor`, valid for the configured TTL from `now`.
    pub fn issue(&self, actor: &Actor, now: DateTime<Utc>) -> Result<String, CryptoError> {
        let claims = TokenClaims {
            sub: actor.id.clone(),
            role: actor.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let claims_json = serde_json::to_vec(&claims).map_err(|_| CryptoError::MalformedToken)?;

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let mut mac = self.mac()?;
        mac.update(message.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{message}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Verify signature and expiry, returning the actor the token speaks for.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Actor, CryptoError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedToken);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CryptoError::MalformedToken)?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CryptoError::BadSignature)?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| CryptoError::MalformedToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&claims_json).map_err(|_| CryptoError::MalformedToken)?;

        if claims.exp <= now.timestamp() {
            return Err(CryptoError::TokenExpired);
        }

        Ok(Actor {
            id: claims.sub,
            role: claims.role,
        })
    }
}
