//! HTTP client for the design workspace API.
//!
//! [`ApiClient`] is a thin typed wrapper over the REST endpoints. Every call is
//! a single request: no retries, no backoff, no de-duplication. Failures come
//! back as [`ApiError`], carrying the server's own message when it sent one.
//!
//! Endpoints are grouped by resource:
//! - `design` - sections, comments, uploads, notifications
//! - `stages` - stages, checklists, the project update feed
//! - `deliveries` - delivery tracking
//! - `rfq` - supplier quote requests
//! - `team` - the mention roster

mod deliveries;
mod design;
mod rfq;
mod stages;
mod team;

pub use design::UploadTarget;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("atelier/", env!("CARGO_PKG_VERSION"));

/// Errors returned by API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or expired credentials (401)
    #[error("Not authorized: check your API token")]
    Unauthorized,

    /// Authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("{message}")]
    Status { code: u16, message: String },

    /// Transport failure (connection refused, timeout, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Local file could not be read for upload
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Status { code, .. } => Some(*code),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::Parse(_) | ApiError::Io { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Pull a human message out of an error body.
///
/// The backend answers failures with `{"error": "..."}` or `{"message": "..."}`;
/// anything else gets a generic message.
fn error_message(code: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", code))
}

/// Typed client for the design workspace REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url` (e.g. `https://studio.example.com`).
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and map non-success statuses to [`ApiError`].
    pub(crate) async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), path, %message, "api request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            _ => ApiError::Status {
                code: status.as_u16(),
                message,
            },
        })
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        Self::decode(response).await
    }

    pub(crate) async fn get_json_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(query);
        let response = self.send(builder, path).await?;
        Self::decode(response).await
    }

    pub(crate) async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(method, path).json(body);
        let response = self.send(builder, path).await?;
        Self::decode(response).await
    }

    /// Send a request whose response body is irrelevant.
    pub(crate) async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, path).await?;
        Ok(())
    }
}

/// Percent-encode a single path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(400, r#"{"error": "Section already finalized"}"#),
            "Section already finalized"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_message_field() {
        assert_eq!(error_message(422, r#"{"message": "Bad caption"}"#), "Bad caption");
    }

    #[test]
    fn test_error_message_generic_for_non_json() {
        assert_eq!(
            error_message(502, "<html>Bad Gateway</html>"),
            "Request failed with status 502"
        );
        assert_eq!(
            error_message(500, r#"{"error": ""}"#),
            "Request failed with status 500"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:3000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/api/deliveries"), "http://localhost:3000/api/deliveries");
    }

    #[test]
    fn test_empty_token_treated_as_none() {
        let client = ApiClient::new("http://localhost", Some(String::new())).unwrap();
        assert!(client.token.is_none());
    }

    #[test]
    fn test_segment_encodes_reserved_characters() {
        assert_eq!(segment("abc-123"), "abc-123");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(ApiError::Unauthorized.status_code(), Some(401));
        assert_eq!(ApiError::NotFound("/x".into()).status_code(), Some(404));
        assert_eq!(
            ApiError::Status {
                code: 409,
                message: "conflict".into()
            }
            .status_code(),
            Some(409)
        );
        assert_eq!(ApiError::Parse("bad".into()).status_code(), None);
        assert!(ApiError::NotFound("/x".into()).is_not_found());
    }
}
