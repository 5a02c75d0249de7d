use notes_logging::notes_info;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::{ServiceClient, ServiceError};

const GENERATE_PATH: &str = "/generate-notes";

/// Body of `POST /generate-notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub video_url: String,
    pub video_id: String,
}

#[derive(Clone)]
pub struct GenerationClient {
    client: ServiceClient,
}

impl GenerationClient {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Starts a generation job. `401` maps to [`ServiceError::Unauthorized`].
    pub async fn submit(&self, request: &GenerateRequest) -> Result<(), ServiceError> {
        let body =
            serde_json::to_vec(request).map_err(|err| ServiceError::Payload(err.to_string()))?;
        let url = self.client.endpoint(GENERATE_PATH)?;
        let builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        self.client.send(builder).await?;
        notes_info!("Generation started video_id={}", request.video_id);
        Ok(())
    }
}
