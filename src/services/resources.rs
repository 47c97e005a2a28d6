use bytes::Bytes;
use http::{Method, StatusCode};

use crate::action::{action_from_status, ActionResult};
use crate::client::Client;
use crate::error::Error;
use crate::query::QueryPairs;
use crate::services::resource_query;
use crate::types::{
    CopyMove, CreateFolder, DeleteResource, FilesResourceList, FlatFiles,
    LastUploadedResourceList, Link, Publish, PublicResourcesList, RecentPublic, RecentUploaded,
    Resource, ResourceGet, ResourcePatch, ResourceUpdate,
};

/// Metadata and manipulation of files and folders.
#[derive(Clone, Copy, Debug)]
pub struct ResourcesService<'a> {
    pub(crate) client: &'a Client,
}

impl ResourcesService<'_> {
    pub async fn get_meta(&self, request: ResourceGet) -> Result<Resource, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let query = resource_query(&request);

        let outcome = self
            .client
            .execute_json::<Resource>(Method::GET, "disk/resources", query.encode(), None, &[200])
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn list_all_files(&self, request: FlatFiles) -> Result<FilesResourceList, Error> {
        let mut query = QueryPairs::new();
        query.add_csv("fields", &request.fields);
        query.add_int("limit", request.limit);
        query.add_str("media_type", &request.media_type);
        query.add_int("offset", request.offset);
        query.add_bool("preview_crop", request.preview_crop);
        query.add_str("preview_size", &request.preview_size);
        query.add_str("sort", &request.sort);

        let outcome = self
            .client
            .execute_json::<FilesResourceList>(
                Method::GET,
                "disk/resources/files",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn list_recent_uploaded(
        &self,
        request: RecentUploaded,
    ) -> Result<LastUploadedResourceList, Error> {
        let mut query = QueryPairs::new();
        query.add_csv("fields", &request.fields);
        query.add_int("limit", request.limit);
        query.add_str("media_type", &request.media_type);
        query.add_bool("preview_crop", request.preview_crop);
        query.add_str("preview_size", &request.preview_size);

        let outcome = self
            .client
            .execute_json::<LastUploadedResourceList>(
                Method::GET,
                "disk/resources/last-uploaded",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn list_published(
        &self,
        request: RecentPublic,
    ) -> Result<PublicResourcesList, Error> {
        let mut query = QueryPairs::new();
        query.add_csv("fields", &request.fields);
        query.add_int("limit", request.limit);
        query.add_int("offset", request.offset);
        query.add_bool("preview_crop", request.preview_crop);
        query.add_str("preview_size", &request.preview_size);
        query.add_str("type", &request.resource_type);

        let outcome = self
            .client
            .execute_json::<PublicResourcesList>(
                Method::GET,
                "disk/resources/public",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn update_meta(&self, request: ResourceUpdate) -> Result<Resource, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);

        let payload = ResourcePatch {
            custom_properties: request.custom_properties,
        };
        let body = serde_json::to_vec(&payload)
            .map(Bytes::from)
            .map_err(|source| Error::Serialize { source })?;

        let outcome = self
            .client
            .execute_json::<Resource>(
                Method::PATCH,
                "disk/resources",
                query.encode(),
                Some(body),
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    /// Creates a folder. A 409 means the folder already exists and is
    /// reported as success with the conflicting link.
    pub async fn create_folder(&self, request: CreateFolder) -> Result<Link, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::PUT,
                "disk/resources",
                query.encode(),
                None,
                &[201, 409],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn copy(&self, request: CopyMove) -> Result<ActionResult, Error> {
        self.copy_or_move("disk/resources/copy", request).await
    }

    pub async fn move_resource(&self, request: CopyMove) -> Result<ActionResult, Error> {
        self.copy_or_move("disk/resources/move", request).await
    }

    pub async fn delete(&self, request: DeleteResource) -> Result<ActionResult, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);
        query.add_bool("force_async", request.force_async);
        query.add_str("md5", &request.md5);
        query.add_bool("permanently", request.permanently);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::DELETE,
                "disk/resources",
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

    pub async fn publish(&self, request: Publish) -> Result<Link, Error> {
        self.publish_action("disk/resources/publish", request).await
    }

    pub async fn unpublish(&self, request: Publish) -> Result<Link, Error> {
        self.publish_action("disk/resources/unpublish", request)
            .await
    }

    async fn copy_or_move(&self, path: &str, request: CopyMove) -> Result<ActionResult, Error> {
        if request.from.is_empty() || request.path.is_empty() {
            return Err(Error::invalid_input("from and path are required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("from", &request.from);
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);
        query.add_bool("force_async", request.force_async);
        query.add_bool("overwrite", request.overwrite);

        let outcome = self
            .client
            .execute_json::<Link>(Method::POST, path, query.encode(), None, &[201, 202])
            .await?;
        Ok(action_from_status(
            outcome.status,
            outcome.value.unwrap_or_default(),
        ))
    }

    async fn publish_action(&self, path: &str, request: Publish) -> Result<Link, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);

        let outcome = self
            .client
            .execute_json::<Link>(Method::PUT, path, query.encode(), None, &[200, 201])
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }
}
