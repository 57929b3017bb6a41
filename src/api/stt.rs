use super::{ApiClient, ApiError, Payload, RequestDescription, CONTENT_TYPE};
use crate::{config::Config, identity::IdentityStore};
use reqwest::Method;
use std::sync::Arc;

/// The only audio format the speech-to-text endpoint accepts.
pub const FLAC_CONTENT_TYPE: &str = "audio/x-flac";

/// Speech-to-text submission, under the `stt` resource.
pub struct SttApi {
    client: ApiClient,
}

impl SttApi {
    pub fn new(config: &Config, identity: Arc<dyn IdentityStore>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new("stt", config, identity)?,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Submits FLAC-encoded audio, asking for up to `limit` transcriptions in `language`.
    pub async fn stt(
        &mut self,
        audio: Vec<u8>,
        language: &str,
        limit: u32,
    ) -> Result<Payload, ApiError> {
        self.client
            .request(
                RequestDescription::new()
                    .method(Method::POST)
                    .path("/stt")
                    .header(CONTENT_TYPE, FLAC_CONTENT_TYPE)
                    .query("lang", language)
                    .query("limit", limit.to_string())
                    .body(audio),
            )
            .await
    }
}
