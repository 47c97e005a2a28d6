use http::Method;

use crate::action::{action_from_status, ActionResult};
use crate::client::Client;
use crate::error::Error;
use crate::query::QueryPairs;
use crate::types::{Link, PublicDownload, PublicResource, PublicResourceGet, PublicSave};

/// Published resources, addressed by public key or public URL.
#[derive(Clone, Copy, Debug)]
pub struct PublicService<'a> {
    pub(crate) client: &'a Client,
}

impl PublicService<'_> {
    pub async fn get_meta(&self, request: PublicResourceGet) -> Result<PublicResource, Error> {
        if request.public_key.is_empty() {
            return Err(Error::invalid_input("public_key is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("public_key", &request.public_key);
        query.add_csv("fields", &request.fields);
        query.add_int("limit", request.limit);
        query.add_int("offset", request.offset);
        query.add_str("path", &request.path);
        query.add_bool("preview_crop", request.preview_crop);
        query.add_str("preview_size", &request.preview_size);
        query.add_str("sort", &request.sort);

        let outcome = self
            .client
            .execute_json::<PublicResource>(
                Method::GET,
                "disk/public/resources",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn get_download_url(&self, request: PublicDownload) -> Result<Link, Error> {
        if request.public_key.is_empty() {
            return Err(Error::invalid_input("public_key is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("public_key", &request.public_key);
        query.add_csv("fields", &request.fields);
        query.add_str("path", &request.path);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::GET,
                "disk/public/resources/download",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn save_to_disk(&self, request: PublicSave) -> Result<ActionResult, Error> {
        if request.public_key.is_empty() {
            return Err(Error::invalid_input("public_key is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("public_key", &request.public_key);
        query.add_csv("fields", &request.fields);
        query.add_bool("force_async", request.force_async);
        query.add_str("name", &request.name);
        query.add_str("path", &request.path);
        query.add_str("save_path", &request.save_path);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::POST,
                "disk/public/resources/save-to-disk",
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
}
