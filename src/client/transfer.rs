//! Raw file transfer against time-limited URLs
//!
//! Upload and download URLs handed out by the API are pre-signed, so these
//! requests go out without API credentials.

use futures_util::{Stream, StreamExt};
use indicatif::ProgressBar;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Body;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::shutdown::global_shutdown_requested;

use super::{check_status, ClientError, ClientResult, RestClient};

impl RestClient {
    /// Upload the raw bytes of a local file with HTTP PUT
    ///
    /// Returns the number of bytes sent.
    pub async fn put_file(&self, url: &Url, path: &Path) -> ClientResult<u64> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        debug!("Uploading {} ({} bytes) to {}", path.display(), length, url.host_str().unwrap_or(""));

        let response = self
            .plain_http()
            .put(url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, length)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;
        check_status(response).await?;

        Ok(length)
    }

    /// Stream a (time-limited) URL into a local file
    ///
    /// Data is written to `<dest>.part` and renamed into place once complete.
    /// A failed or interrupted (Ctrl+C) transfer discards the partial file.
    /// Returns the number of bytes written.
    pub async fn download_to_file(
        &self,
        url: &Url,
        dest: &Path,
        progress: Option<&ProgressBar>,
    ) -> ClientResult<u64> {
        let response = self
            .plain_http()
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;
        let response = check_status(response).await?;

        if let (Some(pb), Some(len)) = (progress, response.content_length()) {
            pb.set_length(len);
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::NetworkError(e.to_string())));
        let written = save_stream(chunks, dest, progress).await?;
        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

/// Save a chunk stream to `dest` through `<dest>.part`
///
/// The part file is removed on any error.
async fn save_stream<S, B>(
    chunks: S,
    dest: &Path,
    progress: Option<&ProgressBar>,
) -> ClientResult<u64>
where
    S: Stream<Item = ClientResult<B>>,
    B: AsRef<[u8]>,
{
    let part = part_path(dest);
    let file = tokio::fs::File::create(&part).await?;
    let result = write_part(chunks, file, &part, dest, progress).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&part).await;
    }
    result
}

async fn write_part<S, B>(
    chunks: S,
    mut file: tokio::fs::File,
    part: &Path,
    dest: &Path,
    progress: Option<&ProgressBar>,
) -> ClientResult<u64>
where
    S: Stream<Item = ClientResult<B>>,
    B: AsRef<[u8]>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut written = 0u64;
    while let Some(chunk) = chunks.next().await {
        if global_shutdown_requested() {
            return Err(ClientError::IoError(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                format!("download of {} interrupted", dest.display()),
            )));
        }
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await?;
        written += bytes.len() as u64;
        if let Some(pb) = progress {
            pb.inc(bytes.len() as u64);
        }
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(part, dest).await?;
    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Last path segment of a URL, used as a local file name
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}
