use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::action::{operation_ref_from_link, OperationRef};
use crate::client::{Client, ClientInner};
use crate::error::Error;
use crate::types::{Link, OperationStatusGet};
use crate::util::lock_unpoisoned;

/// Scheduler granularity. Watched operations become due on this grid; their
/// own intervals only control how far ahead `next_poll` is pushed.
const TICK: Duration = Duration::from_millis(100);

type Handler = Arc<dyn Fn(OperationEvent) + Send + Sync>;

/// Polling configuration for [`OperationWorker`].
#[derive(Clone, Copy, Debug)]
pub struct WorkerConfig {
    poll_interval: Duration,
    max_interval: Duration,
    jitter: f64,
    queue_size: usize,
}

impl WorkerConfig {
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        if self.max_interval < self.poll_interval {
            self.max_interval = self.poll_interval;
        }
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval.max(self.poll_interval);
        self
    }

    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    /// Capacity of receivers returned by [`OperationWorker::watch_channel`].
    pub fn queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size.max(1);
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            jitter: 0.15,
            queue_size: 256,
        }
    }
}

/// One observation of a watched operation.
#[derive(Clone, Debug)]
pub struct OperationEvent {
    pub reference: OperationRef,
    /// Raw status string; empty when the poll itself failed.
    pub status: String,
    /// True for terminal statuses; the operation is no longer watched.
    pub done: bool,
    pub error: Option<Arc<Error>>,
}

struct WatchState {
    reference: OperationRef,
    handlers: Vec<Handler>,
    interval: Duration,
    next_poll: Instant,
}

struct Lifecycle {
    shutdown: oneshot::Sender<()>,
    done: oneshot::Receiver<()>,
}

/// Background poller that tracks asynchronous operations until they reach a
/// terminal status and fans events out to registered handlers.
///
/// The polling task is detached from callers: dropping a future that
/// registered a watch never stops the loop, only [`stop`](Self::stop) (or
/// dropping the client) does.
pub struct OperationWorker {
    client: Weak<ClientInner>,
    config: WorkerConfig,
    watchers: Mutex<HashMap<String, WatchState>>,
    lifecycle: Mutex<Option<Lifecycle>>,
}

impl OperationWorker {
    pub(crate) fn new(client: Weak<ClientInner>, config: WorkerConfig) -> Self {
        Self {
            client,
            config,
            watchers: Mutex::new(HashMap::new()),
            lifecycle: Mutex::new(None),
        }
    }

    /// Spawns the polling loop on the ambient Tokio runtime. Calling it
    /// again while running is a no-op.
    pub fn start(&self) {
        let mut lifecycle = lock_unpoisoned(&self.lifecycle);
        if lifecycle.is_some() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let weak = self.client.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        let client = Client { inner };
                        client.inner.worker.tick(&client).await;
                    }
                }
            }
            debug!("operation worker loop exited");
            let _ = done_tx.send(());
        });
        debug!("operation worker started");
        *lifecycle = Some(Lifecycle {
            shutdown: shutdown_tx,
            done: done_rx,
        });
    }

    /// Stops the polling loop and waits for it to exit. A worker that is not
    /// running returns immediately. Bound the wait with
    /// `tokio::time::timeout` if needed.
    pub async fn stop(&self) {
        let lifecycle = lock_unpoisoned(&self.lifecycle).take();
        let Some(lifecycle) = lifecycle else {
            return;
        };
        drop(lifecycle.shutdown);
        let _ = lifecycle.done.await;
        debug!("operation worker stopped");
    }

    /// Registers a handler for an operation. The id is derived from the href
    /// when absent; a reference carrying neither is rejected. Watching an
    /// already-watched id appends another handler.
    ///
    /// The first poll happens on the next scheduler tick, not after a full
    /// poll interval.
    pub fn watch<F>(&self, reference: OperationRef, handler: F) -> Result<(), Error>
    where
        F: Fn(OperationEvent) + Send + Sync + 'static,
    {
        self.watch_boxed(reference, Arc::new(handler))
    }

    /// Like [`watch`](Self::watch), but delivers events on a bounded channel
    /// of [`WorkerConfig::queue_size`] capacity. Events sent while the
    /// channel is full are dropped, so a slow consumer only loses its own
    /// intermediate events.
    pub fn watch_channel(
        &self,
        reference: OperationRef,
    ) -> Result<mpsc::Receiver<OperationEvent>, Error> {
        let (sender, receiver) = mpsc::channel(self.config.queue_size);
        self.watch_boxed(
            reference,
            Arc::new(move |event| {
                let _ = sender.try_send(event);
            }),
        )?;
        Ok(receiver)
    }

    fn watch_boxed(&self, mut reference: OperationRef, handler: Handler) -> Result<(), Error> {
        if reference.id.is_empty() && !reference.href.is_empty() {
            if let Some(parsed) = operation_ref_from_link(&Link {
                href: reference.href.clone(),
                ..Link::default()
            }) {
                reference = parsed;
            }
        }
        if reference.id.is_empty() {
            return Err(Error::invalid_input("operation id is required"));
        }

        let mut watchers = lock_unpoisoned(&self.watchers);
        let state = watchers
            .entry(reference.id.clone())
            .or_insert_with(|| WatchState {
                reference,
                handlers: Vec::new(),
                interval: self.config.poll_interval,
                next_poll: Instant::now(),
            });
        state.handlers.push(handler);
        Ok(())
    }

    async fn tick(&self, client: &Client) {
        let now = Instant::now();
        let due: Vec<(OperationRef, Vec<Handler>)> = {
            let watchers = lock_unpoisoned(&self.watchers);
            watchers
                .values()
                .filter(|state| state.next_poll <= now)
                .map(|state| (state.reference.clone(), state.handlers.clone()))
                .collect()
        };

        for (reference, handlers) in due {
            let result = client
                .operations()
                .get_status(OperationStatusGet {
                    operation_id: reference.id.clone(),
                    ..OperationStatusGet::default()
                })
                .await;

            match result {
                Err(error) => {
                    debug!(operation = %reference.id, error = %error, "operation poll failed");
                    self.bump(client, &reference.id, true);
                    self.dispatch(
                        client,
                        &handlers,
                        OperationEvent {
                            reference,
                            status: String::new(),
                            done: false,
                            error: Some(Arc::new(error)),
                        },
                    );
                }
                Ok(status) => {
                    let done = status.is_terminal();
                    let id = reference.id.clone();
                    self.dispatch(
                        client,
                        &handlers,
                        OperationEvent {
                            reference,
                            status: status.status,
                            done,
                            error: None,
                        },
                    );
                    if done {
                        self.remove(&id);
                    } else {
                        self.bump(client, &id, false);
                    }
                }
            }
        }
    }

    /// Reschedules a watch. Failed polls double the interval up to the
    /// configured maximum; successful non-terminal polls keep it.
    fn bump(&self, client: &Client, id: &str, on_error: bool) {
        let mut watchers = lock_unpoisoned(&self.watchers);
        let Some(state) = watchers.get_mut(id) else {
            return;
        };
        if on_error {
            state.interval = (state.interval * 2).min(self.config.max_interval);
        }
        state.next_poll = Instant::now() + client.jitter(state.interval, self.config.jitter);
    }

    fn remove(&self, id: &str) {
        lock_unpoisoned(&self.watchers).remove(id);
    }

    fn dispatch(&self, client: &Client, handlers: &[Handler], event: OperationEvent) {
        if let Some(hook) = &client.inner.hooks.on_operation_event {
            hook(&event);
        }
        for handler in handlers {
            let handler = Arc::clone(handler);
            let event = event.clone();
            tokio::spawn(async move { handler(event) });
        }
    }
}

impl std::fmt::Debug for OperationWorker {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OperationWorker")
            .field("config", &self.config)
            .field("watched", &lock_unpoisoned(&self.watchers).len())
            .finish()
    }
}
