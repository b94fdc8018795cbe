//! Streamed multipart upload bodies.
//!
//! Upload sources must be re-openable: the executor may need to resend the
//! whole request after a 401 refresh, so every attempt builds a fresh stream
//! starting at byte zero. Progress is reported once per chunk as
//! `(bytes_sent, total_bytes)`.

use bytes::Bytes;
use futures::StreamExt;
use jamfpro_domain::{JamfError, Result};
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;

use crate::errors::WireError;
use crate::ports::{MultipartUpload, ProgressCallback};

/// Chunk size for in-memory sources. File streams use the reader's native
/// buffering.
const CHUNK_SIZE: usize = 64 * 1024;

/// Source of bytes for a multipart upload.
///
/// Both variants can be reopened cheaply, which is what allows the single
/// 401 retry to restart the upload from the beginning.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Stream the file at this path.
    File(std::path::PathBuf),
    /// Upload an in-memory buffer.
    Bytes(Bytes),
}

impl UploadSource {
    /// Upload the file at `path`.
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Upload an in-memory buffer.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes(data.into())
    }

    /// Total size of the upload in bytes.
    pub(crate) async fn total_size(&self) -> Result<u64> {
        match self {
            Self::File(path) => {
                let meta = tokio::fs::metadata(path).await.map_err(|err| {
                    JamfError::Config(format!(
                        "cannot stat upload file '{}': {err}",
                        path.display()
                    ))
                })?;
                Ok(meta.len())
            }
            Self::Bytes(data) => Ok(data.len() as u64),
        }
    }

    /// Open a fresh body stream from byte zero.
    async fn open_body(&self, progress: Option<ProgressCallback>, total: u64) -> Result<reqwest::Body> {
        match self {
            Self::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|err| {
                    JamfError::Config(format!(
                        "cannot open upload file '{}': {err}",
                        path.display()
                    ))
                })?;
                let stream = ReaderStream::new(file);
                Ok(reqwest::Body::wrap_stream(with_progress(stream, progress, total)))
            }
            Self::Bytes(data) => {
                let chunks: Vec<std::io::Result<Bytes>> = data
                    .chunks(CHUNK_SIZE)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect();
                let stream = futures::stream::iter(chunks);
                Ok(reqwest::Body::wrap_stream(with_progress(stream, progress, total)))
            }
        }
    }
}

/// Count bytes through the stream, invoking the callback once per chunk.
fn with_progress<S>(
    stream: S,
    progress: Option<ProgressCallback>,
    total: u64,
) -> impl futures::Stream<Item = std::io::Result<Bytes>>
where
    S: futures::Stream<Item = std::io::Result<Bytes>>,
{
    let mut sent: u64 = 0;
    stream.map(move |chunk| {
        if let (Ok(bytes), Some(callback)) = (&chunk, progress.as_ref()) {
            sent += bytes.len() as u64;
            callback(sent, total);
        }
        chunk
    })
}

/// Build a fresh multipart form for one send attempt.
pub(crate) async fn build_form(upload: &MultipartUpload) -> Result<Form> {
    let total = upload.source.total_size().await?;
    let body = upload.source.open_body(upload.progress.clone(), total).await?;

    let part = Part::stream_with_length(body, total)
        .file_name(upload.file_name.clone())
        .mime_str("application/octet-stream")
        .map_err(|err| JamfError::from(WireError::from(err)))?;

    let mut form = Form::new().part(upload.field_name.clone(), part);
    for (name, value) in &upload.fields {
        form = form.text(name.clone(), value.clone());
    }
    Ok(form)
}
