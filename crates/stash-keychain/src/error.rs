//! Keychain error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeychainError {
    #[error("Keychain backend error: {0}")]
    Backend(#[from] keyring::Error),

    #[error("Invalid credential value: {0}")]
    InvalidValue(String),
}
