//! Endpoint groups, one module per API area.

mod disk;
mod operations;
mod public;
mod resources;
mod trash;
mod uploads;

pub use disk::DiskService;
pub use operations::OperationsService;
pub use public::PublicService;
pub use resources::ResourcesService;
pub use trash::TrashService;
pub use uploads::{UploadsService, MAX_UPLOAD_PART_SIZE};

use crate::query::QueryPairs;
use crate::types::ResourceGet;

/// Query shared by the metadata endpoints that take a `ResourceGet`.
pub(crate) fn resource_query(request: &ResourceGet) -> QueryPairs {
    let mut query = QueryPairs::new();
    query.add_str("path", &request.path);
    query.add_csv("fields", &request.fields);
    query.add_int("limit", request.limit);
    query.add_int("offset", request.offset);
    query.add_bool("preview_crop", request.preview_crop);
    query.add_str("preview_size", &request.preview_size);
    query.add_str("sort", &request.sort);
    query
}
