mod client;
mod error;
pub mod request;
mod transport;

pub mod device;
pub mod stt;

pub use client::{ApiClient, REFRESH_PATH};
pub use device::DeviceApi;
pub use error::ApiError;
pub use request::{RequestDescription, ResolvedBody, ResolvedRequest, AUTHORIZATION, CONTENT_TYPE};
pub use stt::SttApi;
pub use transport::{HttpTransport, Payload};
