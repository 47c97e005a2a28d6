use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::Full;

use crate::worker::OperationEvent;

type RequestHook = Arc<dyn Fn(&Request<Full<Bytes>>) + Send + Sync>;
type ResponseHook = Arc<dyn Fn(StatusCode, &HeaderMap, Duration) + Send + Sync>;
type RetryHook = Arc<dyn Fn(&RetryEvent) + Send + Sync>;
type OperationHook = Arc<dyn Fn(&OperationEvent) + Send + Sync>;

/// Snapshot of a retry decision, handed to the retry hook just before the
/// transport sleeps.
#[derive(Clone, Debug)]
pub struct RetryEvent {
    /// 1-based attempt that just failed.
    pub attempt: usize,
    pub method: Method,
    pub url: String,
    /// Status that triggered the retry, absent on transport errors.
    pub status: Option<StatusCode>,
    /// Transport error message, absent on status-triggered retries.
    pub error: Option<String>,
    pub next_backoff: Duration,
}

/// Observation callbacks invoked by the transport and the operation worker.
///
/// Hooks run synchronously on the calling task; keep them cheap and never
/// block in them.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) on_request: Option<RequestHook>,
    pub(crate) on_response: Option<ResponseHook>,
    pub(crate) on_retry: Option<RetryHook>,
    pub(crate) on_operation_event: Option<OperationHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called just before each attempt is sent, including retries.
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request<Full<Bytes>>) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    /// Called for each received response with the attempt's elapsed time.
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(StatusCode, &HeaderMap, Duration) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(hook));
        self
    }

    /// Called once per scheduled retry, before the backoff sleep.
    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetryEvent) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Called for every event the operation worker produces, before the
    /// per-watch handlers run.
    pub fn on_operation_event<F>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationEvent) + Send + Sync + 'static,
    {
        self.on_operation_event = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Hooks")
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .field("on_operation_event", &self.on_operation_event.is_some())
            .finish()
    }
}
