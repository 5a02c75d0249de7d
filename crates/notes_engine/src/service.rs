use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::{
    DownloadClient, DownloadError, EventStreamConsumer, GenerateRequest, GenerationClient,
    ServiceError, StatusEvent, StreamEnd,
};

/// Job-level operations the page session drives.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    async fn submit(&self, request: &GenerateRequest) -> Result<(), ServiceError>;

    async fn consume_events(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
        on_status: &mut (dyn FnMut(StatusEvent) + Send),
    ) -> Result<StreamEnd, ServiceError>;

    async fn download(&self, video_id: &str) -> Result<PathBuf, DownloadError>;
}

/// [`JobService`] over the remote notes service.
#[derive(Clone)]
pub struct NotesService {
    generation: GenerationClient,
    events: EventStreamConsumer,
    downloads: DownloadClient,
}

impl NotesService {
    pub fn new(
        generation: GenerationClient,
        events: EventStreamConsumer,
        downloads: DownloadClient,
    ) -> Self {
        Self {
            generation,
            events,
            downloads,
        }
    }
}

#[async_trait::async_trait]
impl JobService for NotesService {
    async fn submit(&self, request: &GenerateRequest) -> Result<(), ServiceError> {
        self.generation.submit(request).await
    }

    async fn consume_events(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
        on_status: &mut (dyn FnMut(StatusEvent) + Send),
    ) -> Result<StreamEnd, ServiceError> {
        self.events
            .consume(video_id, cancel, |event| on_status(event))
            .await
    }

    async fn download(&self, video_id: &str) -> Result<PathBuf, DownloadError> {
        self.downloads.download(video_id).await
    }
}
