//! Wire types for the Disk REST API.
//!
//! Response types deserialize leniently: every field carries a default so
//! that `fields=`-filtered responses and API additions never fail decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw RFC 3339 timestamp as the API returns it. The value is passed
/// through untouched; parse it with the date-time library of your choice.
/// A JSON `null` decodes as the empty timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(Timestamp(value.unwrap_or_default()))
    }
}

impl Timestamp {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Server-provided hyperlink.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub method: String,
    pub templated: bool,
}

/// Upload link; carries the id of the operation that tracks the upload
/// when the server processes it asynchronously.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceUploadLink {
    #[serde(flatten)]
    pub link: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

/// Status of a server-side asynchronous operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperationStatus {
    pub status: String,
}

impl OperationStatus {
    /// True once the operation can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "success" | "failed" | "error" | "cancelled"
        )
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiskInfo {
    pub max_file_size: i64,
    pub unlimited_autoupload_enabled: bool,
    pub total_space: i64,
    pub trash_size: i64,
    pub is_paid: bool,
    pub used_space: i64,
    pub system_folders: SystemFolders,
    pub user: User,
    pub revision: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SystemFolders {
    pub applications: String,
    pub downloads: String,
    pub google: String,
    pub instagram: String,
    pub mailru: String,
    pub odnoklassniki: String,
    pub photostream: String,
    pub screenshots: String,
    pub social: String,
    pub vkontakte: String,
    pub facebook: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct User {
    pub country: String,
    pub login: String,
    pub display_name: String,
    pub uid: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Owner {
    pub login: String,
    pub display_name: String,
    pub uid: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Share {
    pub is_root: bool,
    pub is_owned: bool,
    pub rights: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Exif {
    pub date_time: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentIds {
    pub private_resource: String,
    pub public_resource: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub resource_id: String,
    pub share: Share,
    pub file: String,
    pub size: i64,
    pub photoslice_time: String,
    pub exif: Exif,
    pub media_type: String,
    pub sha256: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub mime_type: String,
    pub revision: i64,
    pub public_url: String,
    pub path: String,
    pub md5: String,
    pub public_key: String,
    pub preview: String,
    pub name: String,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub comment_ids: CommentIds,
    pub custom_properties: HashMap<String, serde_json::Value>,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublicResource {
    pub resource_id: String,
    pub share: Share,
    pub file: String,
    pub size: i64,
    pub media_type: String,
    pub sha256: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub mime_type: String,
    pub revision: i64,
    pub public_url: String,
    pub path: String,
    pub md5: String,
    pub public_key: String,
    pub preview: String,
    pub name: String,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub views_count: i64,
    pub owner: Owner,
    #[serde(rename = "_embedded")]
    pub embedded: PublicEmbedded,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrashResource {
    pub resource_id: String,
    pub share: Share,
    pub file: String,
    pub size: i64,
    pub media_type: String,
    pub sha256: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub mime_type: String,
    pub revision: i64,
    pub public_url: String,
    pub path: String,
    pub md5: String,
    pub public_key: String,
    pub preview: String,
    pub name: String,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub custom_properties: HashMap<String, serde_json::Value>,
    pub origin_path: String,
    pub deleted: Timestamp,
    #[serde(rename = "_embedded")]
    pub embedded: TrashEmbedded,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Embedded {
    pub sort: String,
    pub limit: i64,
    pub offset: i64,
    pub path: String,
    pub total: i64,
    pub items: Vec<Resource>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublicEmbedded {
    pub sort: String,
    pub limit: i64,
    pub offset: i64,
    pub path: String,
    pub total: i64,
    pub items: Vec<PublicResource>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrashEmbedded {
    pub sort: String,
    pub limit: i64,
    pub offset: i64,
    pub path: String,
    pub total: i64,
    pub items: Vec<TrashResource>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilesResourceList {
    pub items: Vec<Resource>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LastUploadedResourceList {
    pub items: Vec<Resource>,
    pub limit: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublicResourcesList {
    pub items: Vec<Resource>,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub(crate) struct ResourcePatch {
    pub custom_properties: HashMap<String, serde_json::Value>,
}

// Request parameters, one struct per endpoint. All fields are optional
// unless the endpoint rejects their absence.

#[derive(Clone, Debug, Default)]
pub struct DiskGet {
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ResourceGet {
    pub path: String,
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub preview_crop: Option<bool>,
    pub preview_size: String,
    pub sort: String,
}

#[derive(Clone, Debug, Default)]
pub struct FlatFiles {
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub media_type: String,
    pub offset: Option<u32>,
    pub preview_crop: Option<bool>,
    pub preview_size: String,
    pub sort: String,
}

#[derive(Clone, Debug, Default)]
pub struct RecentUploaded {
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub media_type: String,
    pub preview_crop: Option<bool>,
    pub preview_size: String,
}

#[derive(Clone, Debug, Default)]
pub struct RecentPublic {
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub preview_crop: Option<bool>,
    pub preview_size: String,
    pub resource_type: String,
}

#[derive(Clone, Debug, Default)]
pub struct ResourceUpdate {
    pub path: String,
    pub fields: Vec<String>,
    pub custom_properties: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default)]
pub struct CreateFolder {
    pub path: String,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CopyMove {
    pub from: String,
    pub path: String,
    pub fields: Vec<String>,
    pub force_async: Option<bool>,
    pub overwrite: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct DeleteResource {
    pub path: String,
    pub fields: Vec<String>,
    pub force_async: Option<bool>,
    pub md5: String,
    pub permanently: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct Publish {
    pub path: String,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UploadUrl {
    pub path: String,
    pub fields: Vec<String>,
    pub overwrite: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct UploadExternal {
    pub path: String,
    pub external_url: String,
    pub disable_redirects: Option<bool>,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DownloadUrl {
    pub path: String,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PublicResourceGet {
    pub public_key: String,
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub path: String,
    pub preview_crop: Option<bool>,
    pub preview_size: String,
    pub sort: String,
}

#[derive(Clone, Debug, Default)]
pub struct PublicDownload {
    pub public_key: String,
    pub fields: Vec<String>,
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct PublicSave {
    pub public_key: String,
    pub fields: Vec<String>,
    pub force_async: Option<bool>,
    pub name: String,
    pub path: String,
    pub save_path: String,
}

#[derive(Clone, Debug, Default)]
pub struct TrashDelete {
    pub fields: Vec<String>,
    pub force_async: Option<bool>,
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct TrashRestore {
    pub path: String,
    pub fields: Vec<String>,
    pub force_async: Option<bool>,
    pub name: String,
    pub overwrite: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct OperationStatusGet {
    pub operation_id: String,
    pub fields: Vec<String>,
}

/// Tuning for chunked uploads. `parallelism` is accepted for forward
/// compatibility; the engine currently uploads parts sequentially.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkedUploadConfig {
    pub part_size: i64,
    pub parallelism: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_match_the_documented_set() {
        for status in ["success", "failed", "error", "cancelled"] {
            assert!(
                OperationStatus {
                    status: status.to_owned()
                }
                .is_terminal(),
                "{status} should be terminal"
            );
        }
        for status in ["in-progress", "pending", "", "SUCCESS"] {
            assert!(
                !OperationStatus {
                    status: status.to_owned()
                }
                .is_terminal(),
                "{status} should not be terminal"
            );
        }
    }

    #[test]
    fn upload_link_flattens_the_inner_link() {
        let link: ResourceUploadLink = serde_json::from_str(
            r#"{"href":"https://uploader.test/u","method":"PUT","templated":false,"operation_id":"op-9"}"#,
        )
        .expect("upload link should deserialize");
        assert_eq!(link.link.href, "https://uploader.test/u");
        assert_eq!(link.link.method, "PUT");
        assert_eq!(link.operation_id.as_deref(), Some("op-9"));
    }

    #[test]
    fn resource_tolerates_missing_fields() {
        let resource: Resource =
            serde_json::from_str(r#"{"name":"report.txt","size":12}"#)
                .expect("partial resource should deserialize");
        assert_eq!(resource.name, "report.txt");
        assert_eq!(resource.size, 12);
        assert!(resource.created.is_empty());
        assert!(resource.embedded.items.is_empty());
    }

    #[test]
    fn resource_tolerates_null_timestamps() {
        let resource: Resource =
            serde_json::from_str(r#"{"name":"report.txt","created":null,"modified":null}"#)
                .expect("null timestamps should deserialize");
        assert_eq!(resource.name, "report.txt");
        assert!(resource.created.is_empty());
        assert!(resource.modified.is_empty());
    }
}
