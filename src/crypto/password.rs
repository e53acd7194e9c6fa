use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2-sha256";

/// Salted PBKDF2-SHA256 password hashing.
///
/// Encoded form: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`, so the
/// iteration count can be raised without invalidating stored hashes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PBKDF2_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> String {
        let salt = generate_salt();
        let mut out = derive(password, &salt, self.iterations);
        let encoded = format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(out)
        );
        out.zeroize();
        encoded
    }

    /// Constant-time check against a stored encoded hash.
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool, CryptoError> {
        let mut parts = encoded.split('$');
        let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(CryptoError::MalformedHash);
        };

        let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| CryptoError::MalformedHash)?;
        let expected = STANDARD_NO_PAD
            .decode(expected)
            .map_err(|_| CryptoError::MalformedHash)?;
        if expected.len() != HASH_LENGTH {
            return Err(CryptoError::MalformedHash);
        }

        let mut actual = derive(password, &salt, iterations);
        let matches = bool::from(actual[..].ct_eq(&expected[..]));
        actual.zeroize();
        Ok(matches)
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
