use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use notes_logging::{notes_debug, notes_warn};
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

use crate::{AtomicFileWriter, PersistError, TransportKind};

/// Namespaced key of the persisted credential.
pub const CREDENTIAL_KEY: &str = "notes_ai.token";

/// Authentication transport strategy shared by every credentialed request.
pub trait AuthTransport: Send + Sync {
    fn kind(&self) -> TransportKind;
    /// Attaches whatever proves the session to `request`.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder;
    /// Keeps a credential delivered by the login flow.
    fn store(&self, credential: &str);
    /// Forgets the local credential, if any.
    fn clear(&self);
}

/// Session cookie transport: the HTTP client's cookie store carries the
/// session, so there is nothing to attach or persist locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct CookieSession;

impl AuthTransport for CookieSession {
    fn kind(&self) -> TransportKind {
        TransportKind::CookieSession
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    fn store(&self, _credential: &str) {
        notes_debug!("Cookie session transport ignores delivered credential");
    }

    fn clear(&self) {}
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, credential: &str) -> Result<(), PersistError>;
    fn clear(&self) -> Result<(), PersistError>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(credential.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn save(&self, credential: &str) -> Result<(), PersistError> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCredential {
    #[serde(rename = "notes_ai.token")]
    token: String,
    stored_at: String,
}

/// Credential persisted as a small JSON document next to the app's state.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    writer: AtomicFileWriter,
    filename: String,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credential.json".to_string());
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            writer: AtomicFileWriter::new(dir),
            filename,
        }
    }

    fn path(&self) -> PathBuf {
        self.writer.dir().join(&self.filename)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        let path = self.path();
        let content = std::fs::read(&path).ok()?;
        match serde_json::from_slice::<PersistedCredential>(&content) {
            Ok(persisted) => Some(persisted.token),
            Err(err) => {
                notes_warn!("Ignoring unreadable credential file {:?}: {}", path, err);
                None
            }
        }
    }

    fn save(&self, credential: &str) -> Result<(), PersistError> {
        let persisted = PersistedCredential {
            token: credential.to_string(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        };
        let content = serde_json::to_vec_pretty(&persisted)
            .map_err(|err| PersistError::Io(std::io::Error::other(err)))?;
        self.writer.write(&self.filename, &content)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        self.writer.remove(&self.filename)
    }
}

/// Bearer token transport backed by a [`CredentialStore`].
#[derive(Clone)]
pub struct BearerToken {
    store: Arc<dyn CredentialStore>,
}

impl BearerToken {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn credential(&self) -> Option<String> {
        self.store.load()
    }
}

impl AuthTransport for BearerToken {
    fn kind(&self) -> TransportKind {
        TransportKind::BearerToken
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.load() {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    fn store(&self, credential: &str) {
        if let Err(err) = self.store.save(credential) {
            notes_warn!("Failed to persist credential: {}", err);
        }
    }

    fn clear(&self) {
        if let Err(err) = self.store.clear() {
            notes_warn!("Failed to clear credential: {}", err);
        }
    }
}
