use http::Method;

use crate::client::Client;
use crate::error::Error;
use crate::query::QueryPairs;
use crate::types::{OperationStatus, OperationStatusGet};

/// Status polling for asynchronous operations.
#[derive(Clone, Copy, Debug)]
pub struct OperationsService<'a> {
    pub(crate) client: &'a Client,
}

impl OperationsService<'_> {
    pub async fn get_status(&self, request: OperationStatusGet) -> Result<OperationStatus, Error> {
        if request.operation_id.is_empty() {
            return Err(Error::invalid_input("operation_id is required"));
        }
        let mut query = QueryPairs::new();
        query.add_csv("fields", &request.fields);

        // The id is pushed as a segment so reserved characters stay in the path.
        let mut url = self
            .client
            .resolve_url("disk/operations", query.encode().as_deref())?;
        url.path_segments_mut()
            .map_err(|_| Error::config("base url cannot carry path segments"))?
            .push(&request.operation_id);
        let outcome = self
            .client
            .execute_json_url::<OperationStatus>(Method::GET, url, None, &[200])
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }
}
