use http::{Method, StatusCode};

use crate::action::{action_from_status, ActionResult};
use crate::client::Client;
use crate::error::Error;
use crate::query::QueryPairs;
use crate::services::resource_query;
use crate::types::{Link, ResourceGet, TrashDelete, TrashResource, TrashRestore};

/// Trash contents and restoration.
#[derive(Clone, Copy, Debug)]
pub struct TrashService<'a> {
    pub(crate) client: &'a Client,
}

impl TrashService<'_> {
    /// Empties the trash, or deletes one trashed resource when `path` is set.
    pub async fn empty(&self, request: TrashDelete) -> Result<ActionResult, Error> {
        let mut query = QueryPairs::new();
        query.add_csv("fields", &request.fields);
        query.add_bool("force_async", request.force_async);
        query.add_str("path", &request.path);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::DELETE,
                "disk/trash/resources",
                query.encode(),
                None,
                &[204, 202],
            )
            .await?;
        if outcome.status == StatusCode::NO_CONTENT {
            return Ok(ActionResult {
                status: outcome.status,
                operation: None,
                link: None,
            });
        }
        Ok(action_from_status(
            outcome.status,
            outcome.value.unwrap_or_default(),
        ))
    }

    pub async fn restore(&self, request: TrashRestore) -> Result<ActionResult, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);
        query.add_bool("force_async", request.force_async);
        query.add_str("name", &request.name);
        query.add_bool("overwrite", request.overwrite);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::PUT,
                "disk/trash/resources/restore",
                query.encode(),
                None,
                &[201, 202],
            )
            .await?;
        Ok(action_from_status(
            outcome.status,
            outcome.value.unwrap_or_default(),
        ))
    }

    pub async fn get_meta(&self, request: ResourceGet) -> Result<TrashResource, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let query = resource_query(&request);

        let outcome = self
            .client
            .execute_json::<TrashResource>(
                Method::GET,
                "disk/trash/resources",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }
}
