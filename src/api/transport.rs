use super::{
    request::{ResolvedBody, ResolvedRequest},
    ApiError,
};
use serde_json::Value;
use std::{fmt, time::Duration};
use tracing::{debug, instrument, warn};

/// Whatever the backend sent back: JSON if it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Interprets a response body. This never fails, as non-JSON is simply text.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(json) => Payload::Json(json),
            Err(_) => Payload::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(json) => Some(json),
            Payload::Text(_) => None,
        }
    }

    /// Converts into JSON, with text becoming a JSON string.
    pub fn into_json(self) -> Value {
        match self {
            Payload::Json(json) => json,
            Payload::Text(text) => Value::String(text),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(json) => write!(f, "{json}"),
            Payload::Text(text) => f.write_str(text),
        }
    }
}

/// Executes exactly one HTTP exchange per resolved request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Sends the request, returning its payload for any 2xx status.
    ///
    /// Every other status becomes [`ApiError::Status`], carrying the same
    /// payload so callers can read whatever detail the backend provided.
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, request: ResolvedRequest) -> Result<Payload, ApiError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(query) = &request.query {
            builder = builder.query(query);
        }
        builder = match request.body {
            ResolvedBody::Empty => builder,
            ResolvedBody::Raw(bytes) => builder.body(bytes),
            ResolvedBody::Json(json) => builder.body(serde_json::to_vec(&json)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let payload = Payload::from_text(response.text().await?);
        debug!(%status, "received response");

        if status.is_success() {
            return Ok(payload);
        }

        warn!(%status, "request was unsuccessful");
        Err(ApiError::Status {
            status,
            headers,
            payload,
        })
    }
}
