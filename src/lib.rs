//! `yadisk` is an asynchronous client for the Yandex Disk REST API.
//!
//! # Quick Start
//!
//! ```no_run
//! use yadisk::{Client, ResourceGet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder(std::env::var("YADISK_TOKEN")?).try_build()?;
//!
//!     let disk = client.disk().get(Default::default()).await?;
//!     println!("used {} of {}", disk.used_space, disk.total_space);
//!
//!     let meta = client
//!         .resources()
//!         .get_meta(ResourceGet {
//!             path: "disk:/docs".to_owned(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} ({})", meta.name, meta.resource_type);
//!     Ok(())
//! }
//! ```
//!
//! Long-running server-side operations (copy, move, chunked uploads) return
//! an [`ActionResult`]; hand its operation reference to the client's
//! [`OperationWorker`] to be notified when the operation finishes.

mod action;
mod client;
mod download;
mod error;
mod executor;
mod hooks;
mod query;
mod retry;
mod services;
mod transport;
mod types;
mod util;
mod worker;

pub use crate::action::{ActionResult, OperationRef};
pub use crate::client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use crate::download::DownloadBody;
pub use crate::error::{ApiError, BoxError, Error};
pub use crate::executor::{BoxFuture, HttpExecutor, HyperExecutor, ResBody};
pub use crate::hooks::{Hooks, RetryEvent};
pub use crate::retry::RetryPolicy;
pub use crate::services::{
    DiskService, OperationsService, PublicService, ResourcesService, TrashService, UploadsService,
    MAX_UPLOAD_PART_SIZE,
};
pub use crate::types::*;
pub use crate::worker::{OperationEvent, OperationWorker, WorkerConfig};

pub type Result<T> = std::result::Result<T, Error>;

/// Single-import surface for applications.
pub mod prelude {
    pub use crate::action::{ActionResult, OperationRef};
    pub use crate::client::{Client, ClientBuilder};
    pub use crate::download::DownloadBody;
    pub use crate::error::{ApiError, Error};
    pub use crate::hooks::{Hooks, RetryEvent};
    pub use crate::retry::RetryPolicy;
    pub use crate::types::*;
    pub use crate::worker::{OperationEvent, OperationWorker, WorkerConfig};
}
