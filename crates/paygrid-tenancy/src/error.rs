//! Tenancy service error types.

use paygrid_core::error::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenancyError {
    /// More than one organization claims the same domain. Query order
    /// must never decide the winner; the fault is surfaced instead.
    #[error("domain {domain} is owned by {count} organizations")]
    AmbiguousDomain { domain: String, count: usize },

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<TenancyError> for CoreError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::AmbiguousDomain { .. }
            | TenancyError::TokenExpired
            | TenancyError::TokenInvalid(_) => CoreError::Validation {
                message: err.to_string(),
            },
            TenancyError::Crypto(msg) => CoreError::Upstream(msg),
        }
    }
}
