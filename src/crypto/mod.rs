pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Signing secret too short: {0} bytes")]
    WeakSecret(usize),
}
