//! The device identity: its UUID, bearer tokens and their expiry.

mod credential;
mod jwt;
mod storage;

pub use credential::{unix_now, Credential};
pub use storage::{IdentityStore, KeyringIdentityStore, MemoryIdentityStore};

use thiserror::Error;

/// Possible error types while working with the device identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("credential storage failed: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("malformed identity: {0}")]
    Malformed(serde_json::Error),
}
