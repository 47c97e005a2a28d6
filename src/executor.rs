use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;

use crate::error::{BoxError, Error};

pub type ResBody = BoxBody<Bytes, BoxError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends one HTTP request and returns the raw response.
///
/// The transport layer owns retries, auth headers, and decoding; an executor
/// is only the wire. Implement this to swap in a proxy-aware client or a
/// test double.
pub trait HttpExecutor: Send + Sync {
    fn execute(
        &self,
        request: Request<Full<Bytes>>,
    ) -> BoxFuture<'_, Result<Response<ResBody>, BoxError>>;
}

/// Default executor: pooled hyper client with rustls and webpki roots.
pub struct HyperExecutor {
    client: LegacyClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperExecutor {
    pub fn new(
        pool_idle_timeout: Duration,
        pool_max_idle_per_host: usize,
    ) -> Result<Self, Error> {
        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .map_err(|source| Error::config(format!("tls backend init failed: {source}")))?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = LegacyClient::builder(TokioExecutor::new())
            .pool_idle_timeout(pool_idle_timeout)
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build(connector);
        Ok(Self { client })
    }
}

impl HttpExecutor for HyperExecutor {
    fn execute(
        &self,
        request: Request<Full<Bytes>>,
    ) -> BoxFuture<'_, Result<Response<ResBody>, BoxError>> {
        let future = self.client.request(request);
        Box::pin(async move {
            let response = future.await.map_err(|error| -> BoxError { Box::new(error) })?;
            Ok(box_response(response))
        })
    }
}

fn box_response(response: Response<Incoming>) -> Response<ResBody> {
    response.map(|body| body.map_err(|error| -> BoxError { Box::new(error) }).boxed())
}
