use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const REQUEST_ID_HEADERS: [&str; 2] = ["X-Request-Id", "X-YaRequestId"];

/// Failure surfaced by any client operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid client configuration: {message}")]
    Config { message: String },
    #[error("{message}")]
    InvalidInput { message: String },
    #[error("invalid request url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to serialize request json: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to build http request: {source}")]
    RequestBuild {
        #[source]
        source: http::Error,
    },
    #[error("http transport error for {method} {url}: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to read response body: {source}")]
    ReadBody {
        #[source]
        source: BoxError,
    },
    #[error("failed to read upload source: {source}")]
    SourceRead {
        #[source]
        source: std::io::Error,
    },
    #[error("request failed after {attempts} attempts for {method} {url}")]
    RetriesExhausted {
        attempts: usize,
        method: Method,
        url: String,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to decode response json: {source}; body={body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns the decoded remote failure when this error is an [`ApiError`].
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(api) => Some(api),
            _ => None,
        }
    }
}

/// A non-expected HTTP status from the remote API, with whatever diagnostic
/// payload the server attached.
#[derive(Clone, Debug, Default)]
pub struct ApiError {
    pub http_status: u16,
    pub code: String,
    pub message: String,
    pub description: String,
    pub request_id: String,
    pub raw_body: Bytes,
}

#[derive(Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    description: String,
}

impl ApiError {
    pub(crate) fn from_response(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let request_id = REQUEST_ID_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_default()
            .to_owned();

        let decoded: ApiErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        let mut api = Self {
            http_status: status.as_u16(),
            code: decoded.error,
            message: decoded.message,
            description: decoded.description,
            request_id,
            raw_body: body,
        };
        if api.code.is_empty() && api.message.is_empty() {
            api.message = String::from_utf8_lossy(&api.raw_body).trim().to_owned();
        }
        api
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(
                formatter,
                "api error {} {}: {}",
                self.http_status, self.code, self.message
            ),
            (false, true) => write!(formatter, "api error {} {}", self.http_status, self.code),
            (true, false) => write!(
                formatter,
                "api error {}: {}",
                self.http_status, self.message
            ),
            (true, true) => write!(formatter, "api error {}", self.http_status),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;

    #[test]
    fn display_covers_all_field_combinations() {
        let mut api = ApiError {
            http_status: 409,
            code: "DiskPathPointsToExistentDirectoryError".to_owned(),
            message: "directory exists".to_owned(),
            ..ApiError::default()
        };
        assert_eq!(
            api.to_string(),
            "api error 409 DiskPathPointsToExistentDirectoryError: directory exists"
        );

        api.message.clear();
        assert_eq!(
            api.to_string(),
            "api error 409 DiskPathPointsToExistentDirectoryError"
        );

        api.code.clear();
        api.message = "directory exists".to_owned();
        assert_eq!(api.to_string(), "api error 409: directory exists");

        api.message.clear();
        assert_eq!(api.to_string(), "api error 409");
    }

    #[test]
    fn from_response_decodes_payload_and_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert("X-YaRequestId", HeaderValue::from_static("req-42"));
        let body = Bytes::from_static(
            br#"{"error":"UnauthorizedError","message":"token invalid","description":"bad token"}"#,
        );

        let api = ApiError::from_response(StatusCode::UNAUTHORIZED, &headers, body);
        assert_eq!(api.http_status, 401);
        assert_eq!(api.code, "UnauthorizedError");
        assert_eq!(api.message, "token invalid");
        assert_eq!(api.description, "bad token");
        assert_eq!(api.request_id, "req-42");
    }

    #[test]
    fn from_response_prefers_x_request_id_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Id", HeaderValue::from_static("primary"));
        headers.insert("X-YaRequestId", HeaderValue::from_static("fallback"));

        let api = ApiError::from_response(StatusCode::BAD_GATEWAY, &headers, Bytes::new());
        assert_eq!(api.request_id, "primary");
    }

    #[test]
    fn from_response_falls_back_to_trimmed_body_message() {
        let api = ApiError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &HeaderMap::new(),
            Bytes::from_static(b"  upstream exploded  "),
        );
        assert_eq!(api.code, "");
        assert_eq!(api.message, "upstream exploded");
        assert_eq!(api.raw_body.as_ref(), b"  upstream exploded  ");
    }
}
