use notes_logging::{notes_debug, notes_info, notes_warn};
use serde_json::Value;

use crate::{Browser, Identity, ServiceClient, ServiceError};

const STATUS_PATH: &str = "/auth/status";
const LOGIN_PATH: &str = "/auth/google";
const LOGOUT_PATH: &str = "/auth/logout";

pub const LOGIN_POPUP_NAME: &str = "loginPopup";
pub const LOGIN_POPUP_FEATURES: &str = "width=600,height=700";
/// Type tag of the message the login popup posts back to its opener.
pub const AUTH_SUCCESS_TYPE: &str = "AUTH_SUCCESS";

/// A cross-context message delivered to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub origin: String,
    pub data: Value,
}

/// Successful login reported by the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCompletion {
    pub credential: Option<String>,
}

/// Accepts only `{type: "AUTH_SUCCESS", token?}` posted from `expected_origin`.
pub fn parse_completion(message: &InboundMessage, expected_origin: &str) -> Option<AuthCompletion> {
    if message.origin != expected_origin {
        notes_debug!("Ignoring message from origin {}", message.origin);
        return None;
    }
    let object = message.data.as_object()?;
    if object.get("type").and_then(Value::as_str) != Some(AUTH_SUCCESS_TYPE) {
        return None;
    }
    let credential = object
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    Some(AuthCompletion { credential })
}

/// Authentication state, independent of the transport behind it.
#[async_trait::async_trait]
pub trait AuthClient: Send + Sync {
    /// Current identity; any failure counts as "not authenticated".
    async fn current_identity(&self) -> Option<Identity>;
    /// Opens the login flow. Completion arrives later as an [`InboundMessage`].
    fn login(&self, browser: &dyn Browser);
    /// Best-effort remote logout; the local credential is always dropped.
    async fn logout(&self);
    fn accept_completion(&self, completion: &AuthCompletion);
    /// Drops the local credential after a `401`.
    fn invalidate(&self);
    /// Origin the login popup posts from.
    fn service_origin(&self) -> String;
}

#[derive(Clone)]
pub struct HttpAuthClient {
    client: ServiceClient,
}

impl HttpAuthClient {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    async fn fetch_identity(&self) -> Result<Identity, ServiceError> {
        let url = self.client.endpoint(STATUS_PATH)?;
        let response = self.client.send(self.client.get(url)).await?;
        let body = response
            .bytes()
            .await
            .map_err(crate::client::map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| ServiceError::Payload(err.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthClient for HttpAuthClient {
    async fn current_identity(&self) -> Option<Identity> {
        match self.fetch_identity().await {
            Ok(identity) => Some(identity),
            Err(ServiceError::Unauthorized) => {
                self.invalidate();
                None
            }
            Err(err) => {
                notes_debug!("Auth status unavailable: {}", err);
                None
            }
        }
    }

    fn login(&self, browser: &dyn Browser) {
        match self.client.endpoint(LOGIN_PATH) {
            Ok(url) => {
                notes_info!("Opening login popup at {}", url);
                browser.open_popup(&url, LOGIN_POPUP_NAME, LOGIN_POPUP_FEATURES);
            }
            Err(err) => notes_warn!("Cannot build login url: {}", err),
        }
    }

    async fn logout(&self) {
        let result = match self.client.endpoint(LOGOUT_PATH) {
            Ok(url) => self.client.send(self.client.post(url)).await.map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            notes_warn!("Remote logout failed: {}", err);
        }
        self.client.transport().clear();
    }

    fn accept_completion(&self, completion: &AuthCompletion) {
        if let Some(credential) = completion.credential.as_deref() {
            self.client.transport().store(credential);
        }
    }

    fn invalidate(&self) {
        self.client.transport().clear();
    }

    fn service_origin(&self) -> String {
        self.client.base_url().origin().ascii_serialization()
    }
}
