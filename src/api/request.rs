//! Turns a terse request description into a concrete HTTP request.

use reqwest::Method;
use serde_json::Value;

/// The content type we default to, and the only one whose JSON bodies we sanitize.
pub const JSON_CONTENT_TYPE: &str = "application/json";

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";

/// What a caller would like to request, relative to a client's base path.
///
/// Anything left unset resolves to a sensible default when built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDescription {
    pub method: Method,
    pub path: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Option<Vec<(String, String)>>,
    /// An opaque body, sent exactly as given. Takes precedence over `json`.
    pub body: Option<Vec<u8>>,
    pub json: Option<Value>,
    /// Overrides the client's default API version.
    pub version: Option<String>,
}

impl RequestDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// The body a resolved request carries. At most one kind is ever sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedBody {
    Empty,
    Raw(Vec<u8>),
    Json(Value),
}

/// A fully built request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Option<Vec<(String, String)>>,
    pub body: ResolvedBody,
}

impl ResolvedRequest {
    /// Looks up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Prepends a client's base resource path to the description's path.
///
/// Slashes are deliberately left alone: `"device"` + `"/code"` is `"device/code"`,
/// but `"device"` + `"code"` is `"devicecode"`. Callers place their own.
pub fn prefix_path(base_path: &str, description: &mut RequestDescription) {
    let path = description.path.take().unwrap_or_default();
    description.path = Some(format!("{base_path}{path}"));
}

/// Resolves a description against a server, API version and access token.
pub fn resolve(
    description: RequestDescription,
    base_url: &str,
    default_version: &str,
    access_token: &str,
) -> ResolvedRequest {
    let version = description.version.as_deref().unwrap_or(default_version);
    let path = description.path.as_deref().unwrap_or_default();
    let url = format!("{base_url}/{version}/{path}");

    // Caller-provided headers always win over ours.
    let mut headers = description.headers;
    if find_header(&headers, CONTENT_TYPE).is_none() {
        headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
    }
    if find_header(&headers, AUTHORIZATION).is_none() {
        headers.push((AUTHORIZATION.to_string(), format!("Bearer {access_token}")));
    }

    // Structured bodies are only sanitized when we're actually sending JSON.
    let body = match (description.body, description.json) {
        (Some(raw), _) => ResolvedBody::Raw(raw),
        (None, Some(json)) => {
            if find_header(&headers, CONTENT_TYPE) == Some(JSON_CONTENT_TYPE) {
                ResolvedBody::Json(sanitize(json))
            } else {
                ResolvedBody::Json(json)
            }
        }
        (None, None) => ResolvedBody::Empty,
    };

    ResolvedRequest {
        method: description.method,
        url,
        headers,
        query: description.query,
        body,
    }
}

/// Replaces every top-level empty string with an explicit `null`.
///
/// The backend reads `null` as "clear this field", whereas an omitted field
/// is left untouched. Non-object values pass through as-is.
pub fn sanitize(mut json: Value) -> Value {
    if let Value::Object(fields) = &mut json {
        for value in fields.values_mut() {
            if value.as_str() == Some("") {
                *value = Value::Null;
            }
        }
    }
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE_URL: &str = "https://api.example.com";

    fn build(base_path: &str, mut description: RequestDescription) -> ResolvedRequest {
        prefix_path(base_path, &mut description);
        resolve(description, BASE_URL, "v1", "access-token")
    }

    #[test]
    fn defaults_add_json_content_type_and_bearer() {
        let request = build("device", RequestDescription::new());
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://api.example.com/v1/device");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), Some("Bearer access-token"));
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.query, None);
        assert_eq!(request.body, ResolvedBody::Empty);
    }

    #[test]
    fn path_with_query_string_is_kept_verbatim() {
        let request = build("device", RequestDescription::new().path("/code?state=xyz"));
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://api.example.com/v1/device/code?state=xyz");
    }

    #[test]
    fn slashes_are_not_normalized() {
        let request = build("device", RequestDescription::new().path("code"));
        assert_eq!(request.url, "https://api.example.com/v1/devicecode");

        let request = build("device/", RequestDescription::new().path("/code"));
        assert_eq!(request.url, "https://api.example.com/v1/device//code");
    }

    #[test]
    fn description_version_overrides_default() {
        let request = build("stt", RequestDescription::new().version("v2"));
        assert_eq!(request.url, "https://api.example.com/v2/stt");
    }

    #[test]
    fn unprefixed_paths_resolve_against_the_version_root() {
        let request = resolve(
            RequestDescription::new().path("auth/token"),
            BASE_URL,
            "v1",
            "access-token",
        );
        assert_eq!(request.url, "https://api.example.com/v1/auth/token");
    }

    #[test]
    fn caller_headers_are_never_overwritten() {
        let request = build(
            "device",
            RequestDescription::new()
                .header("content-type", "audio/x-flac")
                .header("AUTHORIZATION", "Bearer refresh-token"),
        );
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header("Content-Type"), Some("audio/x-flac"));
        assert_eq!(request.header("Authorization"), Some("Bearer refresh-token"));
    }

    #[test]
    fn json_bodies_are_sanitized() {
        let request = build(
            "device",
            RequestDescription::new()
                .method(Method::POST)
                .json(json!({ "state": "abc", "token": "", "count": 0 })),
        );
        assert_eq!(
            request.body,
            ResolvedBody::Json(json!({ "state": "abc", "token": null, "count": 0 }))
        );
    }

    #[test]
    fn json_bodies_under_other_content_types_pass_through() {
        let request = build(
            "device",
            RequestDescription::new()
                .header("Content-Type", "application/vnd.api+json")
                .json(json!({ "token": "" })),
        );
        assert_eq!(request.body, ResolvedBody::Json(json!({ "token": "" })));
    }

    #[test]
    fn raw_body_wins_over_json() {
        let request = build(
            "stt",
            RequestDescription::new()
                .body(vec![1, 2, 3])
                .json(json!({ "ignored": true })),
        );
        assert_eq!(request.body, ResolvedBody::Raw(vec![1, 2, 3]));
    }

    #[test]
    fn query_passes_through_in_order() {
        let request = build(
            "stt",
            RequestDescription::new().query("lang", "en-US").query("limit", "3"),
        );
        assert_eq!(
            request.query,
            Some(vec![
                ("lang".to_string(), "en-US".to_string()),
                ("limit".to_string(), "3".to_string()),
            ])
        );
    }

    #[test]
    fn sanitize_only_touches_empty_strings_and_is_idempotent() {
        let original = json!({
            "a": "",
            "b": " ",
            "c": null,
            "d": [""],
            "e": { "nested": "" },
            "f": false
        });
        let once = sanitize(original);
        assert_eq!(
            once,
            json!({
                "a": null,
                "b": " ",
                "c": null,
                "d": [""],
                "e": { "nested": "" },
                "f": false
            })
        );
        assert_eq!(sanitize(once.clone()), once);
        assert_eq!(sanitize(json!("")), json!(""));
    }
}
