use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;

use crate::error::Error;
use crate::executor::ResBody;

/// Streaming body of a file download.
///
/// Content arrives incrementally via [`chunk`](Self::chunk); nothing is
/// buffered beyond what the connection has in flight, so arbitrarily large
/// files download in constant memory. Dropping the value releases the
/// connection.
pub struct DownloadBody {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: ResBody,
}

impl DownloadBody {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Next chunk of content, or `None` at end of stream.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, Error> {
        while let Some(frame) = self.body.frame().await {
            let frame = frame.map_err(|source| Error::ReadBody { source })?;
            if let Ok(data) = frame.into_data() {
                return Ok(Some(data));
            }
            // Trailer frames carry no content; keep reading.
        }
        Ok(None)
    }

    /// Buffers the remaining content in memory. Prefer [`chunk`](Self::chunk)
    /// for large files.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        Ok(self
            .body
            .collect()
            .await
            .map_err(|source| Error::ReadBody { source })?
            .to_bytes())
    }
}

impl std::fmt::Debug for DownloadBody {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DownloadBody")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
