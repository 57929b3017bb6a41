use super::Payload;
use crate::{config::ConfigError, identity::IdentityError};
use reqwest::{header::HeaderMap, StatusCode};
use thiserror::Error;

/// Everything that can go wrong while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("request failed with status {status}: {payload}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        payload: Payload,
    },
    /// The request never produced a response (connection, timeout, bad URL...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unable to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// The HTTP status, if the backend responded at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(err) => err.status(),
            _ => None,
        }
    }

    /// The backend's error payload, if it sent one.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ApiError::Status { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
