use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// How credentialed requests prove the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Session cookie kept in the HTTP client's cookie store.
    #[default]
    CookieSession,
    /// `Authorization: Bearer` header from a persisted credential.
    BearerToken,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applied to every request except the event stream, which stays open.
    pub request_timeout: Duration,
    pub transport: TransportKind,
    /// Where the bearer credential is persisted; in memory when `None`.
    pub credential_path: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            transport: TransportKind::default(),
            credential_path: None,
        }
    }
}
