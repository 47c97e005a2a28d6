mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{MockResponse, MockServer};
use yadisk::{Client, Error, Hooks, PublicSave, RetryPolicy};

fn fast_retry(max_retries: usize) -> RetryPolicy {
    RetryPolicy::default()
        .max_retries(max_retries)
        .base_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
        .jitter(0.0)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retries_get_on_5xx_and_429_then_succeeds() {
    let server = MockServer::start(vec![
        MockResponse::json(500, r#"{"error":"InternalError","message":"boom"}"#),
        MockResponse::json(429, r#"{"error":"TooManyRequestsError","message":"slow down"}"#),
        MockResponse::json(200, r#"{"total_space":1000,"used_space":250}"#),
    ]);

    let retry_events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&retry_events);
    let client = Client::builder("test-token")
        .base_url(server.api_base())
        .retry_policy(fast_retry(3))
        .hooks(Hooks::new().on_retry(move |event| {
            events_clone
                .lock()
                .expect("lock retry events")
                .push((event.attempt, event.status.map(|status| status.as_u16())));
        }))
        .try_build()
        .expect("client should build");

    let disk = client
        .disk()
        .get(Default::default())
        .await
        .expect("request should succeed after retries");
    assert_eq!(disk.total_space, 1000);
    assert_eq!(disk.used_space, 250);

    assert_eq!(server.served_count(), 3);
    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/v1/disk");
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("OAuth test-token")
        );
        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            request.headers.get("user-agent").map(String::as_str),
            Some(concat!("yadisk-rs/", env!("CARGO_PKG_VERSION")))
        );
    }

    let events = retry_events.lock().expect("lock retry events").clone();
    assert_eq!(events, vec![(1, Some(500)), (2, Some(429))]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_is_never_retried() {
    let server = MockServer::start(vec![MockResponse::json(
        503,
        r#"{"error":"ServiceUnavailableError","message":"maintenance"}"#,
    )]);

    let client = Client::builder("test-token")
        .base_url(server.api_base())
        .retry_policy(fast_retry(3))
        .try_build()
        .expect("client should build");

    let error = client
        .public()
        .save_to_disk(PublicSave {
            public_key: "pk".to_owned(),
            ..Default::default()
        })
        .await
        .expect_err("503 on POST should surface immediately");

    let api = error.api().expect("error should carry the api failure");
    assert_eq!(api.http_status, 503);
    assert_eq!(api.code, "ServiceUnavailableError");
    assert_eq!(server.served_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exhausted_retries_surface_the_last_api_error() {
    let server = MockServer::start(vec![
        MockResponse::json(500, r#"{"error":"InternalError","message":"boom 1"}"#),
        MockResponse::json(500, r#"{"error":"InternalError","message":"boom 2"}"#),
        MockResponse::json(500, r#"{"error":"InternalError","message":"boom 3"}"#),
    ]);

    let client = Client::builder("test-token")
        .base_url(server.api_base())
        .retry_policy(fast_retry(2))
        .try_build()
        .expect("client should build");

    let error = client
        .disk()
        .get(Default::default())
        .await
        .expect_err("all attempts return 500");

    let api = error.api().expect("last response should decode as api error");
    assert_eq!(api.http_status, 500);
    assert_eq!(api.message, "boom 3");
    assert_eq!(server.served_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connection_error_is_reported_as_transport() {
    // Bind and drop a listener so the port refuses connections.
    let address = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind throwaway listener");
        listener.local_addr().expect("read local address")
    };

    let client = Client::builder("test-token")
        .base_url(format!("http://{address}/v1"))
        .retry_policy(RetryPolicy::disabled())
        .try_build()
        .expect("client should build");

    let error = client
        .disk()
        .get(Default::default())
        .await
        .expect_err("nothing is listening");
    assert!(matches!(error, Error::Transport { .. }), "{error:?}");
}
