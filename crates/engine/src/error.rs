//! The module contains the errors the wallet engine can produce.
//!
//! All of these stay behind the consumer boundary: lifecycle operations
//! catch them and hand back an [`Outcome`] with a displayable message, so
//! presentation code never handles a `Result` for business failures.
//!
//! [`Outcome`]: crate::Outcome
use thiserror::Error;

use crate::store::GatewayError;

/// Wallet engine errors.
#[derive(Error, Debug)]
pub enum WalletError {
    /// A lifecycle operation ran before `load()` populated a user.
    #[error("User data not loaded. Please refresh the page.")]
    NoUserLoaded,
    /// Retry was attempted on a transaction that is missing, deleted, or
    /// not in the `failed` status.
    #[error("Cannot retry this transaction")]
    NotRetryable,
    /// Caller-supplied input rejected before touching the gateway.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl PartialEq for WalletError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NoUserLoaded, Self::NoUserLoaded) => true,
            (Self::NotRetryable, Self::NotRetryable) => true,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Gateway(a), Self::Gateway(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
