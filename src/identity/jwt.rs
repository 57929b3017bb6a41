use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

/// The only claim we care about within an access token.
#[derive(Deserialize)]
struct TokenClaims {
    #[serde(default)]
    exp: Option<u64>,
}

/// An extraordinarily basic JWT reader, used to recover an expiry
/// when the backend doesn't hand us one explicitly.
///
/// Nothing here validates the token. The backend will happily do that for us,
/// and a token we can't read simply has no known expiry.
pub fn expiry(token: &str) -> Option<u64> {
    // There's three components to a JWT: its header, its payload, and signature.
    let components: Vec<&str> = token.split('.').collect();
    if components.len() != 3 {
        return None;
    }

    // Components are base64-encoded JSON, using the URL-safe, non-padded character set.
    // We only need the payload.
    let decoded_payload = URL_SAFE_NO_PAD.decode(components[1]).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&decoded_payload).ok()?;
    claims.exp
}
