//! Notes engine: service clients, status stream decoding and artifact download.
mod auth;
mod browser;
mod client;
mod download;
mod generate;
mod persist;
mod service;
mod settings;
mod stream;
mod transport;
mod types;

pub use auth::{
    parse_completion, AuthClient, AuthCompletion, HttpAuthClient, InboundMessage,
    AUTH_SUCCESS_TYPE, LOGIN_POPUP_FEATURES, LOGIN_POPUP_NAME,
};
pub use browser::{Browser, DirectorySaveTarget, SaveTarget};
pub use client::ServiceClient;
pub use download::{filename_from_disposition, DownloadClient, DownloadError, DEFAULT_FILENAME};
pub use generate::{GenerateRequest, GenerationClient};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use service::{JobService, NotesService};
pub use settings::{ServiceSettings, TransportKind};
pub use stream::{parse_record, EventStreamConsumer, RecordDecoder, DATA_PREFIX, MAX_PENDING_LEN};
pub use transport::{
    AuthTransport, BearerToken, CookieSession, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, CREDENTIAL_KEY,
};
pub use types::{Identity, JobStatus, ServiceError, StatusEvent, StreamEnd};
