use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use notes_logging::{notes_info, notes_warn};
use reqwest::header::CONTENT_DISPOSITION;
use tempfile::NamedTempFile;

use crate::client::map_reqwest_error;
use crate::{PersistError, SaveTarget, ServiceClient, ServiceError};

/// Saved name when the response carries no usable `Content-Disposition`.
pub const DEFAULT_FILENAME: &str = "note.md";

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Service(#[from] ServiceError),
    #[error("could not materialize artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not save artifact: {0}")]
    Persist(#[from] PersistError),
}

/// Filename from a `Content-Disposition` value: the text after `filename=`
/// with quote characters removed. A quoted value runs to its closing quote and
/// may contain `;`; an unquoted one ends at the next parameter.
pub fn filename_from_disposition(header: Option<&str>) -> Option<String> {
    let (_, rest) = header?.split_once("filename=")?;
    let rest = rest.trim_start();
    let value = match rest.strip_prefix('"') {
        Some(quoted) => quoted.find('"').map_or(quoted, |end| &quoted[..end]),
        None => rest.split(';').next().unwrap_or(rest),
    };
    let name: String = value.trim().chars().filter(|c| *c != '"').collect();
    (!name.is_empty()).then_some(name)
}

/// Temporary local copy of a downloaded payload, removed when released or dropped.
struct TempArtifact {
    file: NamedTempFile,
}

impl TempArtifact {
    fn materialize(payload: &Bytes) -> Result<Self, std::io::Error> {
        let mut file = NamedTempFile::new()?;
        file.write_all(payload)?;
        file.flush()?;
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(err) = self.file.close() {
            notes_warn!("Failed to release temporary artifact {:?}: {}", path, err);
        }
    }
}

#[derive(Clone)]
pub struct DownloadClient {
    client: ServiceClient,
    save_target: Arc<dyn SaveTarget>,
    default_filename: String,
}

impl DownloadClient {
    pub fn new(client: ServiceClient, save_target: Arc<dyn SaveTarget>) -> Self {
        Self {
            client,
            save_target,
            default_filename: DEFAULT_FILENAME.to_string(),
        }
    }

    pub fn with_default_filename(mut self, filename: impl Into<String>) -> Self {
        self.default_filename = filename.into();
        self
    }

    /// Fetches the finished artifact for `video_id` and saves it. No retries.
    pub async fn download(&self, video_id: &str) -> Result<PathBuf, DownloadError> {
        let url = self.client.job_endpoint(video_id, "download")?;
        let response = self.client.send(self.client.get(url)).await?;

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok());
        let filename = filename_from_disposition(disposition)
            .unwrap_or_else(|| self.default_filename.clone());

        let payload = response.bytes().await.map_err(map_reqwest_error)?;
        let artifact = TempArtifact::materialize(&payload)?;
        let saved = self.save_target.save(artifact.path(), &filename);
        artifact.release();

        let saved = saved?;
        notes_info!(
            "Downloaded video_id={} bytes={} to {:?}",
            video_id,
            payload.len(),
            saved
        );
        Ok(saved)
    }
}
