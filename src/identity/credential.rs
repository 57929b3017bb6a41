use super::{jwt, IdentityError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// The device's identity as known to the backend.
///
/// This is also the format of our JSON within credential storage.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// The device UUID assigned during pairing.
    #[serde(default)]
    pub uuid: String,
    /// Bearer token used for every ordinary request.
    #[serde(default)]
    pub access: String,
    /// Bearer token used solely against the token refresh endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    /// Unix timestamp (in seconds) at which `access` stops being valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

/// The login/refresh payload handed back by the backend.
#[derive(Deserialize)]
struct LoginPayload {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
    /// Seconds from now until the access token expires.
    #[serde(default)]
    expiration: Option<u64>,
}

impl Credential {
    /// Returns the refresh token, if this credential is able to refresh at all.
    /// An empty refresh token counts as having none.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh.as_deref().filter(|token| !token.is_empty())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token().is_some()
    }

    /// Whether this credential needs refreshing as of `now`.
    ///
    /// Only refreshable credentials can expire. One with no known expiry is
    /// considered expired so that the next refresh can tell us.
    pub fn is_expired_at(&self, now: u64) -> bool {
        if !self.can_refresh() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// Builds the credential that results from applying a backend login payload.
    ///
    /// Payloads without a UUID keep ours. Payloads without an explicit expiration
    /// fall back to the access token's own `exp` claim.
    pub fn apply_login(&self, payload: &Value, now: u64) -> Result<Credential, IdentityError> {
        let login = LoginPayload::deserialize(payload).map_err(IdentityError::Malformed)?;

        let expires_at = match login.expiration {
            Some(seconds) => Some(now.saturating_add(seconds)),
            None => jwt::expiry(&login.access_token),
        };

        Ok(Credential {
            uuid: login.uuid.unwrap_or_else(|| self.uuid.clone()),
            access: login.access_token,
            refresh: login.refresh_token,
            expires_at,
        })
    }
}

/// Seconds since the Unix epoch. A clock set before 1970 reads as zero.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn refreshable(expires_at: Option<u64>) -> Credential {
        Credential {
            uuid: "device-1".to_string(),
            access: "access".to_string(),
            refresh: Some("refresh".to_string()),
            expires_at,
        }
    }

    #[test]
    fn credentials_without_refresh_never_expire() {
        let credential = Credential {
            refresh: None,
            ..refreshable(Some(0))
        };
        assert!(!credential.is_expired_at(100));

        let empty = Credential {
            refresh: Some(String::new()),
            ..refreshable(Some(0))
        };
        assert!(!empty.can_refresh());
        assert!(!empty.is_expired_at(100));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let credential = refreshable(Some(100));
        assert!(!credential.is_expired_at(99));
        assert!(credential.is_expired_at(100));
        assert!(credential.is_expired_at(101));
    }

    #[test]
    fn unknown_expiry_is_expired_when_refreshable() {
        assert!(refreshable(None).is_expired_at(0));
    }

    #[test]
    fn login_payload_recomputes_expiry() {
        let payload = json!({
            "uuid": "device-2",
            "accessToken": "new-access",
            "refreshToken": "new-refresh",
            "expiration": 3600
        });
        let updated = refreshable(Some(0)).apply_login(&payload, 1_000).unwrap();
        assert_eq!(
            updated,
            Credential {
                uuid: "device-2".to_string(),
                access: "new-access".to_string(),
                refresh: Some("new-refresh".to_string()),
                expires_at: Some(4_600),
            }
        );
    }

    #[test]
    fn login_payload_without_uuid_keeps_ours() {
        let payload = json!({ "accessToken": "a", "refreshToken": "r", "expiration": 10 });
        let updated = refreshable(None).apply_login(&payload, 0).unwrap();
        assert_eq!(updated.uuid, "device-1");
    }

    #[test]
    fn malformed_login_payload_is_rejected() {
        let err = refreshable(None)
            .apply_login(&json!("OK"), 0)
            .unwrap_err();
        assert!(matches!(err, IdentityError::Malformed(_)));
    }

    #[test]
    fn stored_format_round_trips_without_optional_fields() {
        let stored = r#"{"uuid":"u","access":"a"}"#;
        let credential: Credential = serde_json::from_str(stored).unwrap();
        assert_eq!(credential.refresh, None);
        assert_eq!(serde_json::to_string(&credential).unwrap(), stored);
    }
}
