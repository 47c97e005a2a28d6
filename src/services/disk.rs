use http::Method;

use crate::client::Client;
use crate::error::Error;
use crate::query::QueryPairs;
use crate::types::{DiskGet, DiskInfo};

/// General information about the user's disk.
#[derive(Clone, Copy, Debug)]
pub struct DiskService<'a> {
    pub(crate) client: &'a Client,
}

impl DiskService<'_> {
    pub async fn get(&self, request: DiskGet) -> Result<DiskInfo, Error> {
        let mut query = QueryPairs::new();
        query.add_csv("fields", &request.fields);

        let outcome = self
            .client
            .execute_json::<DiskInfo>(Method::GET, "disk", query.encode(), None, &[200])
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }
}
