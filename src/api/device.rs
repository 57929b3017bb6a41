use super::{ApiClient, ApiError, Payload, RequestDescription};
use crate::{config::Config, identity::IdentityStore};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Device pairing and lookup, under the `device` resource.
pub struct DeviceApi {
    client: ApiClient,
}

impl DeviceApi {
    pub fn new(config: &Config, identity: Arc<dyn IdentityStore>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new("device", config, identity)?,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Requests a pairing code for `state`.
    ///
    /// Pairing always begins from a blank identity, so any stored tokens are discarded first.
    pub async fn get_code(&mut self, state: &str) -> Result<Payload, ApiError> {
        self.client.reset_identity()?;
        self.client
            .request(RequestDescription::new().path(format!("/code?state={state}")))
            .await
    }

    /// Activates this device with the token the user was given while pairing.
    pub async fn activate(&mut self, state: &str, token: &str) -> Result<Payload, ApiError> {
        self.client
            .request(
                RequestDescription::new()
                    .method(Method::POST)
                    .path("/activate")
                    .json(json!({ "state": state, "token": token })),
            )
            .await
    }

    /// Looks up this device.
    pub async fn find(&mut self) -> Result<Payload, ApiError> {
        let path = format!("/{}", self.client.credential().uuid);
        self.client.request(RequestDescription::new().path(path)).await
    }

    /// Looks up this device's settings.
    pub async fn find_setting(&mut self) -> Result<Payload, ApiError> {
        let path = format!("/{}/setting", self.client.credential().uuid);
        self.client.request(RequestDescription::new().path(path)).await
    }
}
