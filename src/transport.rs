use std::time::Instant;

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::client::Client;
use crate::error::{ApiError, Error};
use crate::executor::ResBody;
use crate::hooks::RetryEvent;

/// Decoded JSON response. `value` is absent when the server sent an empty
/// body, as DELETE endpoints do on 204.
pub(crate) struct JsonOutcome<T> {
    pub(crate) status: StatusCode,
    pub(crate) value: Option<T>,
}

fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET
        || *method == Method::HEAD
        || *method == Method::PUT
        || *method == Method::DELETE
        || *method == Method::OPTIONS
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn status_is_success(status: StatusCode, expected: &[u16]) -> bool {
    if expected.is_empty() {
        status.as_u16() < 400
    } else {
        expected.contains(&status.as_u16())
    }
}

impl Client {
    /// Resolves an API path against the configured base URL and attaches the
    /// encoded query, if any.
    pub(crate) fn resolve_url(&self, path: &str, query: Option<&str>) -> Result<Url, Error> {
        let mut url = self
            .inner
            .base_url
            .join(path)
            .map_err(|source| Error::InvalidUrl {
                url: path.to_owned(),
                source,
            })?;
        url.set_query(query);
        Ok(url)
    }

    fn build_request(
        &self,
        method: &Method,
        url: &Url,
        content_type: Option<&'static str>,
        body: Option<&Bytes>,
    ) -> Result<Request<Full<Bytes>>, Error> {
        let mut token =
            HeaderValue::from_bytes(format!("OAuth {}", self.inner.token).as_bytes())
                .map_err(|_| Error::config("oauth token contains invalid header bytes"))?;
        token.set_sensitive(true);

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, token);
        if !self.inner.user_agent.is_empty() {
            builder = builder.header(USER_AGENT, &self.inner.user_agent);
        }
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let payload = body.cloned().unwrap_or_default();
        builder
            .body(Full::new(payload))
            .map_err(|source| Error::RequestBuild { source })
    }

    async fn send_once(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(Response<ResBody>, std::time::Duration), Error> {
        let method = request.method().clone();
        let url = request.uri().to_string();
        if let Some(hook) = &self.inner.hooks.on_request {
            hook(&request);
        }
        let started = Instant::now();
        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|source| Error::Transport {
                method,
                url,
                source,
            })?;
        let elapsed = started.elapsed();
        if let Some(hook) = &self.inner.hooks.on_response {
            hook(response.status(), response.headers(), elapsed);
        }
        Ok((response, elapsed))
    }

    /// Sends an authorized JSON request to an API path, retrying idempotent
    /// requests on transport errors and on 429/5xx responses.
    ///
    /// The payload is serialized once by the caller; each attempt rebuilds
    /// the HTTP request from the same bytes.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<String>,
        body: Option<Bytes>,
        expected: &[u16],
    ) -> Result<JsonOutcome<T>, Error> {
        let url = self.resolve_url(path, query.as_deref())?;
        self.execute_json_url(method, url, body, expected).await
    }

    /// Variant of [`Client::execute_json`] for callers that build the URL
    /// themselves, e.g. to percent-encode path segments.
    pub(crate) async fn execute_json_url<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Bytes>,
        expected: &[u16],
    ) -> Result<JsonOutcome<T>, Error> {
        let content_type = body.as_ref().map(|_| "application/json");
        let policy = &self.inner.retry;
        let attempts = policy.attempts();
        let retryable_method = is_idempotent(&method);

        for attempt in 1..=attempts {
            let request = self.build_request(&method, &url, content_type, body.as_ref())?;
            debug!(method = %method, url = %url, attempt, "sending api request");

            let response = match self.send_once(request).await {
                Ok((response, _)) => response,
                Err(error) => {
                    if retryable_method && attempt < attempts {
                        self.backoff_before_retry(attempt, &method, &url, None, Some(&error))
                            .await;
                        continue;
                    }
                    return Err(error);
                }
            };

            let status = response.status();
            if is_retryable_status(status) && retryable_method && attempt < attempts {
                // Drain so the pooled connection can be reused.
                let _ = response.into_body().collect().await;
                self.backoff_before_retry(attempt, &method, &url, Some(status), None)
                    .await;
                continue;
            }

            return self.decode_response(response, expected).await;
        }

        Err(Error::RetriesExhausted {
            attempts,
            method,
            url: url.to_string(),
        })
    }

    /// Sends one request with no retries and hands back the raw response.
    ///
    /// Used against server-issued hrefs (uploader and downloader hosts),
    /// which embed their own authorization; only the caller's headers are
    /// sent.
    pub(crate) async fn execute_raw(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<Response<ResBody>, Error> {
        let mut builder = Request::builder().method(method.clone()).uri(url);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|source| Error::RequestBuild { source })?;
        debug!(method = %method, url, "sending raw request");
        let (response, _) = self.send_once(request).await?;
        Ok(response)
    }

    async fn backoff_before_retry(
        &self,
        attempt: usize,
        method: &Method,
        url: &Url,
        status: Option<StatusCode>,
        error: Option<&Error>,
    ) {
        let policy = &self.inner.retry;
        let next_backoff = self.jitter(policy.backoff_delay(attempt), policy.jitter_factor());
        warn!(
            method = %method,
            url = %url,
            attempt,
            status = ?status.map(|status| status.as_u16()),
            error = ?error.map(|error| error.to_string()),
            backoff_ms = next_backoff.as_millis() as u64,
            "retrying api request"
        );
        if let Some(hook) = &self.inner.hooks.on_retry {
            hook(&RetryEvent {
                attempt,
                method: method.clone(),
                url: url.to_string(),
                status,
                error: error.map(|error| error.to_string()),
                next_backoff,
            });
        }
        tokio::time::sleep(next_backoff).await;
    }

    async fn decode_response<T: DeserializeOwned>(
        &self,
        response: Response<ResBody>,
        expected: &[u16],
    ) -> Result<JsonOutcome<T>, Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| Error::ReadBody { source })?
            .to_bytes();

        if !status_is_success(status, expected) {
            return Err(ApiError::from_response(status, &headers, body).into());
        }
        if body.is_empty() {
            return Ok(JsonOutcome {
                status,
                value: None,
            });
        }
        let value = serde_json::from_slice(&body).map_err(|source| Error::Decode {
            source,
            body: String::from_utf8_lossy(&body).into_owned(),
        })?;
        Ok(JsonOutcome {
            status,
            value: Some(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_methods_follow_rfc_semantics() {
        for method in [
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ] {
            assert!(is_idempotent(&method), "{method} should be idempotent");
        }
        for method in [Method::POST, Method::PATCH] {
            assert!(!is_idempotent(&method), "{method} should not be idempotent");
        }
    }

    #[test]
    fn retryable_statuses_are_429_and_5xx() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::CONFLICT));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn empty_expected_set_accepts_anything_below_400() {
        assert!(status_is_success(StatusCode::OK, &[]));
        assert!(status_is_success(StatusCode::CREATED, &[]));
        assert!(!status_is_success(StatusCode::BAD_REQUEST, &[]));

        assert!(status_is_success(StatusCode::ACCEPTED, &[201, 202]));
        assert!(!status_is_success(StatusCode::OK, &[201, 202]));
    }
}
