//! An authenticated HTTP client for a device talking to its cloud backend.
//!
//! Requests are described tersely with [`api::RequestDescription`] and sent
//! through an [`api::ApiClient`], which attaches the device's bearer token and
//! transparently refreshes it once expired. Tokens themselves live in an
//! [`identity::IdentityStore`], shared by every client in the process.

pub mod api;
pub mod config;
pub mod identity;

pub use api::{ApiClient, ApiError, DeviceApi, Payload, RequestDescription, SttApi};
pub use config::Config;
pub use identity::{Credential, IdentityStore, KeyringIdentityStore, MemoryIdentityStore};
