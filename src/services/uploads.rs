use bytes::Bytes;
use http::header::{CONTENT_RANGE, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Response, StatusCode};
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, SeekFrom};
use tracing::debug;

use crate::action::{ActionResult, OperationRef};
use crate::client::Client;
use crate::download::DownloadBody;
use crate::error::{ApiError, Error};
use crate::executor::ResBody;
use crate::query::QueryPairs;
use crate::types::{
    ChunkedUploadConfig, DownloadUrl, Link, ResourceUploadLink, UploadExternal, UploadUrl,
};

/// Hard server-side ceiling on one uploaded part.
pub const MAX_UPLOAD_PART_SIZE: i64 = 10_000_000_000;

const DEFAULT_UPLOAD_PART_SIZE: i64 = 10 * 1024 * 1024;

/// File content transfer: upload links, downloads, and the chunked engine.
#[derive(Clone, Copy, Debug)]
pub struct UploadsService<'a> {
    pub(crate) client: &'a Client,
}

impl UploadsService<'_> {
    pub async fn get_upload_url(&self, request: UploadUrl) -> Result<ResourceUploadLink, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);
        query.add_bool("overwrite", request.overwrite);

        let outcome = self
            .client
            .execute_json::<ResourceUploadLink>(
                Method::GET,
                "disk/resources/upload",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    /// Asks the server to fetch a file from an external URL.
    pub async fn upload_external(&self, request: UploadExternal) -> Result<Link, Error> {
        if request.path.is_empty() || request.external_url.is_empty() {
            return Err(Error::invalid_input("path and external_url are required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_str("url", &request.external_url);
        query.add_bool("disable_redirects", request.disable_redirects);
        query.add_csv("fields", &request.fields);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::POST,
                "disk/resources/upload",
                query.encode(),
                None,
                &[202, 201],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    pub async fn get_download_url(&self, request: DownloadUrl) -> Result<Link, Error> {
        if request.path.is_empty() {
            return Err(Error::invalid_input("path is required"));
        }
        let mut query = QueryPairs::new();
        query.add_str("path", &request.path);
        query.add_csv("fields", &request.fields);

        let outcome = self
            .client
            .execute_json::<Link>(
                Method::GET,
                "disk/resources/download",
                query.encode(),
                None,
                &[200],
            )
            .await?;
        Ok(outcome.value.unwrap_or_default())
    }

    /// Resolves the download href for a path and opens a streaming body.
    pub async fn open_download(&self, request: DownloadUrl) -> Result<DownloadBody, Error> {
        let link = self.get_download_url(request).await?;
        if link.href.is_empty() {
            return Err(Error::invalid_input("empty download href"));
        }

        let response = self
            .client
            .execute_raw(Method::GET, &link.href, HeaderMap::new(), None)
            .await?;
        if response.status().as_u16() >= 400 {
            return Err(collect_api_error(response).await?.into());
        }
        let (parts, body) = response.into_parts();
        Ok(DownloadBody {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Uploads a whole, already-buffered payload to an upload link.
    /// For large files prefer [`upload_in_chunks`](Self::upload_in_chunks).
    pub async fn upload(
        &self,
        link: &ResourceUploadLink,
        data: Bytes,
    ) -> Result<ActionResult, Error> {
        let method = upload_method(&link.link)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        let response = self
            .client
            .execute_raw(method, &link.link.href, headers, Some(data))
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED && status != StatusCode::ACCEPTED {
            return Err(collect_api_error(response).await?.into());
        }

        let operation = (status == StatusCode::ACCEPTED).then(|| OperationRef {
            id: link.operation_id.clone().unwrap_or_default(),
            href: link.link.href.clone(),
        });
        Ok(ActionResult {
            status,
            operation,
            link: None,
        })
    }

    /// Uploads from a seekable source in sequential ranged parts.
    ///
    /// Each part is sent as its own PUT with a `Content-Range` header; only
    /// one part is buffered at a time, so source size is unbounded. The
    /// upload is not resumable: any part failure aborts the whole transfer.
    pub async fn upload_in_chunks<R>(
        &self,
        link: &ResourceUploadLink,
        source: &mut R,
        config: ChunkedUploadConfig,
    ) -> Result<ActionResult, Error>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let method = upload_method(&link.link)?;
        let part_size = if config.part_size <= 0 {
            DEFAULT_UPLOAD_PART_SIZE
        } else {
            config.part_size.min(MAX_UPLOAD_PART_SIZE)
        };

        let total = source
            .seek(SeekFrom::End(0))
            .await
            .map_err(|source| Error::SourceRead { source })?;
        source
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|source| Error::SourceRead { source })?;

        let mut buffer = vec![0u8; part_size as usize];
        let mut start: u64 = 0;
        while start < total {
            let chunk_size = (total - start).min(buffer.len() as u64) as usize;
            let filled = read_chunk(source, &mut buffer[..chunk_size]).await?;
            if filled == 0 {
                break;
            }

            let end = start + filled as u64 - 1;
            let mut headers = HeaderMap::new();
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            headers.insert(
                CONTENT_RANGE,
                HeaderValue::from_str(&format!("bytes {start}-{end}/{total}"))
                    .map_err(|source| Error::RequestBuild {
                        source: source.into(),
                    })?,
            );
            debug!(href = %link.link.href, start, end, total, "uploading part");

            let response = self
                .client
                .execute_raw(
                    method.clone(),
                    &link.link.href,
                    headers,
                    Some(Bytes::copy_from_slice(&buffer[..filled])),
                )
                .await?;
            let status = response.status();
            if status != StatusCode::CREATED && status != StatusCode::ACCEPTED {
                return Err(collect_api_error(response).await?.into());
            }
            start += filled as u64;
        }

        Ok(ActionResult {
            status: StatusCode::ACCEPTED,
            operation: Some(OperationRef {
                id: link.operation_id.clone().unwrap_or_default(),
                href: link.link.href.clone(),
            }),
            link: None,
        })
    }

    pub fn validate_part_size(&self, part_size: i64) -> Result<(), Error> {
        if part_size <= 0 {
            return Err(Error::invalid_input("part size must be > 0"));
        }
        if part_size > MAX_UPLOAD_PART_SIZE {
            return Err(Error::invalid_input(format!(
                "part size must be <= {MAX_UPLOAD_PART_SIZE}"
            )));
        }
        Ok(())
    }
}

fn upload_method(link: &Link) -> Result<Method, Error> {
    if link.href.is_empty() || link.method.is_empty() {
        return Err(Error::invalid_input("upload link must have href and method"));
    }
    Method::from_bytes(link.method.as_bytes())
        .map_err(|_| Error::invalid_input(format!("invalid upload link method {}", link.method)))
}

/// Fills `buffer` from the source, tolerating short reads; a source that
/// ends early yields a short chunk.
async fn read_chunk<R>(source: &mut R, buffer: &mut [u8]) -> Result<usize, Error>
where
    R: AsyncRead + Unpin + Send,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let read = source
            .read(&mut buffer[filled..])
            .await
            .map_err(|source| Error::SourceRead { source })?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

async fn collect_api_error(response: Response<ResBody>) -> Result<ApiError, Error> {
    let (parts, body) = response.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|source| Error::ReadBody { source })?
        .to_bytes();
    Ok(ApiError::from_response(parts.status, &parts.headers, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_method_requires_href_and_method() {
        assert!(upload_method(&Link::default()).is_err());
        assert!(upload_method(&Link {
            href: "https://uploader.test/u".to_owned(),
            ..Link::default()
        })
        .is_err());

        let method = upload_method(&Link {
            href: "https://uploader.test/u".to_owned(),
            method: "PUT".to_owned(),
            templated: false,
        })
        .expect("PUT link is valid");
        assert_eq!(method, Method::PUT);
    }

    #[tokio::test]
    async fn read_chunk_tolerates_short_reads() {
        let data = b"abcdefgh".to_vec();
        let mut source = std::io::Cursor::new(data);
        let mut buffer = [0u8; 5];
        let filled = read_chunk(&mut source, &mut buffer)
            .await
            .expect("cursor reads never fail");
        assert_eq!(filled, 5);
        assert_eq!(&buffer, b"abcde");

        let mut tail = [0u8; 5];
        let filled = read_chunk(&mut source, &mut tail)
            .await
            .expect("cursor reads never fail");
        assert_eq!(filled, 3);
        assert_eq!(&tail[..3], b"fgh");
    }
}
