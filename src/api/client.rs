use super::{
    request::{self, RequestDescription, AUTHORIZATION},
    transport::{HttpTransport, Payload},
    ApiError,
};
use crate::{
    config::Config,
    identity::{Credential, IdentityStore},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The endpoint that exchanges a refresh token for new tokens.
/// It lives directly under the API version, not under any resource.
pub const REFRESH_PATH: &str = "auth/token";

/// An authenticated client for one of the backend's resources (e.g. `device`).
///
/// Every request made through [`ApiClient::request`] is relative to that
/// resource, and carries the device's current access token.
pub struct ApiClient {
    /// The resource every request is prefixed with.
    path: String,
    url: String,
    version: String,
    identity: Arc<dyn IdentityStore>,
    /// Our snapshot of the device identity. Replaced whenever we refresh.
    credential: Credential,
    transport: HttpTransport,
}

impl ApiClient {
    /// Creates a client for the resource at `path`.
    ///
    /// The server location and the current identity are read once, here.
    pub fn new(
        path: impl Into<String>,
        config: &Config,
        identity: Arc<dyn IdentityStore>,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.http.timeout())?;
        Ok(Self {
            path: path.into(),
            url: config.server.url.clone(),
            version: config.server.version.clone(),
            credential: identity.current(),
            identity,
            transport,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The identity this client currently authenticates with.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Starts over with a blank identity, as a device about to pair would.
    pub fn reset_identity(&mut self) -> Result<&Credential, ApiError> {
        self.credential = self.identity.reset()?;
        Ok(&self.credential)
    }

    /// Performs a request against this client's resource,
    /// refreshing our tokens beforehand if they've expired.
    #[instrument(skip_all, fields(resource = %self.path, path = ?description.path))]
    pub async fn request(
        &mut self,
        mut description: RequestDescription,
    ) -> Result<Payload, ApiError> {
        self.check_token().await?;
        request::prefix_path(&self.path, &mut description);
        self.send(description).await
    }

    /// Performs a request as described, without checking our tokens
    /// and without prefixing this client's resource path.
    #[instrument(skip_all, fields(method = %description.method, path = ?description.path))]
    pub async fn send(&self, description: RequestDescription) -> Result<Payload, ApiError> {
        let resolved = request::resolve(
            description,
            &self.url,
            &self.version,
            &self.credential.access,
        );
        self.transport.execute(resolved).await
    }

    /// Ensures our access token is usable before a request goes out.
    ///
    /// If our snapshot has expired, we'll first see whether someone else has
    /// already refreshed it for us. Only if the stored identity is also expired
    /// do we refresh against the backend. A failed refresh is returned as-is.
    async fn check_token(&mut self) -> Result<(), ApiError> {
        if !self.identity.is_expired(&self.credential) {
            return Ok(());
        }

        debug!("access token expired, reloading identity");
        self.credential = self.identity.reload()?;
        if !self.identity.is_expired(&self.credential) {
            debug!("identity was refreshed elsewhere");
            return Ok(());
        }

        // Only refreshable credentials ever report as expired.
        let Some(refresh_token) = self.credential.refresh_token() else {
            return Ok(());
        };

        info!("refreshing access token");
        let description = RequestDescription::new()
            .path(REFRESH_PATH)
            .header(AUTHORIZATION, format!("Bearer {refresh_token}"));
        let payload = self.send(description).await?;

        self.credential = self.identity.save(&payload.into_json())?;
        info!(expires_at = ?self.credential.expires_at, "access token refreshed");
        Ok(())
    }
}
