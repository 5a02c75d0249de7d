use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use url::Url;

use crate::{AuthTransport, ServiceError, ServiceSettings, TransportKind};

/// Shared HTTP plumbing for every service endpoint.
///
/// Credentialed requests go through the configured [`AuthTransport`]; status
/// codes are mapped to [`ServiceError`] in one place.
#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: Url,
    settings: ServiceSettings,
    transport: Arc<dyn AuthTransport>,
}

impl ServiceClient {
    pub fn new(
        settings: ServiceSettings,
        transport: Arc<dyn AuthTransport>,
    ) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .cookie_store(settings.transport == TransportKind::CookieSession)
            .build()
            .map_err(|err| ServiceError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            settings,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn transport(&self) -> &Arc<dyn AuthTransport> {
        &self.transport
    }

    /// `path` resolved against the base url, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|err| ServiceError::InvalidUrl(format!("{raw}: {err}")))
    }

    /// `/notes/{video_id}/{leaf}` with the video id percent-encoded as one segment.
    pub fn job_endpoint(&self, video_id: &str, leaf: &str) -> Result<Url, ServiceError> {
        let mut url = self.endpoint("/notes")?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidUrl(self.base_url.to_string()))?
            .push(video_id)
            .push(leaf);
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.transport.authorize(self.http.get(url))
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.transport.authorize(self.http.post(url))
    }

    /// Sends a bounded request and rejects non-success statuses.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response)
    }

    /// Like [`ServiceClient::send`] but without a total timeout, for long-lived streams.
    pub(crate) async fn open_stream(
        &self,
        request: RequestBuilder,
    ) -> Result<Response, ServiceError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ServiceError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ServiceError::HttpStatus(status.as_u16()));
    }
    Ok(response)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::Timeout;
    }
    ServiceError::Network(err.to_string())
}
