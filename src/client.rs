use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use url::Url;

use crate::error::Error;
use crate::executor::{HttpExecutor, HyperExecutor};
use crate::hooks::Hooks;
use crate::retry::RetryPolicy;
use crate::services::{
    DiskService, OperationsService, PublicService, ResourcesService, TrashService, UploadsService,
};
use crate::util::lock_unpoisoned;
use crate::worker::{OperationWorker, WorkerConfig};

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://cloud-api.yandex.net/v1";

const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Asynchronous Disk API client.
///
/// Cheap to clone; all clones share one connection pool, retry state, and
/// operation worker.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: Arc<dyn HttpExecutor>,
    pub(crate) base_url: Url,
    pub(crate) token: String,
    pub(crate) user_agent: String,
    pub(crate) retry: RetryPolicy,
    pub(crate) hooks: Hooks,
    rng: Mutex<StdRng>,
    pub(crate) worker: OperationWorker,
}

impl ClientInner {
    /// Applies symmetric jitter: the result is uniform in
    /// `[delay * (1 - factor), delay * (1 + factor)]`, floored at zero.
    /// A non-positive factor leaves the delay untouched.
    pub(crate) fn jitter(&self, delay: Duration, factor: f64) -> Duration {
        if factor <= 0.0 {
            return delay;
        }
        let offset = {
            let mut rng = lock_unpoisoned(&self.rng);
            rng.random_range(-factor..=factor)
        };
        let scaled = delay.as_secs_f64() * (1.0 + offset);
        Duration::from_secs_f64(scaled.max(0.0))
    }
}

impl Client {
    /// Starts building a client for the given OAuth token.
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    pub(crate) fn jitter(&self, delay: Duration, factor: f64) -> Duration {
        self.inner.jitter(delay, factor)
    }

    pub fn disk(&self) -> DiskService<'_> {
        DiskService { client: self }
    }

    pub fn resources(&self) -> ResourcesService<'_> {
        ResourcesService { client: self }
    }

    pub fn uploads(&self) -> UploadsService<'_> {
        UploadsService { client: self }
    }

    pub fn public(&self) -> PublicService<'_> {
        PublicService { client: self }
    }

    pub fn trash(&self) -> TrashService<'_> {
        TrashService { client: self }
    }

    pub fn operations(&self) -> OperationsService<'_> {
        OperationsService { client: self }
    }

    /// Background poller for asynchronous operations.
    pub fn worker(&self) -> &OperationWorker {
        &self.inner.worker
    }

    /// Stops the operation worker and waits for its polling task to exit.
    /// In-flight requests on other tasks are unaffected.
    pub async fn close(&self) {
        self.inner.worker.stop().await;
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("user_agent", &self.inner.user_agent)
            .finish_non_exhaustive()
    }
}

/// Configures and constructs a [`Client`].
pub struct ClientBuilder {
    token: String,
    base_url: String,
    user_agent: String,
    retry: RetryPolicy,
    worker: WorkerConfig,
    hooks: Hooks,
    http: Option<Arc<dyn HttpExecutor>>,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    rng_seed: Option<u64>,
}

impl ClientBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: format!("yadisk-rs/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
            worker: WorkerConfig::default(),
            hooks: Hooks::default(),
            http: None,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            rng_seed: None,
        }
    }

    /// Overrides the API origin, e.g. to point at a test server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the `User-Agent` header. The builder starts out with
    /// `yadisk-rs/<crate version>`, so the header is sent unless this is
    /// set to an empty value, which omits it.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn worker_config(mut self, worker: WorkerConfig) -> Self {
        self.worker = worker;
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the default hyper-based executor.
    pub fn http_executor(mut self, http: Arc<dyn HttpExecutor>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle.max(1);
        self
    }

    /// Seeds the jitter PRNG for reproducible backoff in tests.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn try_build(self) -> Result<Client, Error> {
        if self.token.trim().is_empty() {
            return Err(Error::config("oauth token must not be empty"));
        }
        let mut base_url = Url::parse(&self.base_url)
            .map_err(|source| Error::config(format!("invalid base url {}: {source}", self.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "unsupported base url scheme {}",
                base_url.scheme()
            )));
        }
        // Relative API paths must resolve under the base path, so the base
        // has to end with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http: Arc<dyn HttpExecutor> = match self.http {
            Some(http) => http,
            None => Arc::new(HyperExecutor::new(
                self.pool_idle_timeout,
                self.pool_max_idle_per_host,
            )?),
        };
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let inner = Arc::new_cyclic(|weak| ClientInner {
            http,
            base_url,
            token: self.token,
            user_agent: self.user_agent,
            retry: self.retry,
            hooks: self.hooks,
            rng: Mutex::new(rng),
            worker: OperationWorker::new(weak.clone(), self.worker),
        });
        Ok(Client { inner })
    }
}
