use std::fmt;

use serde::Deserialize;

/// Logged-in user as reported by `/auth/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub user: String,
}

/// Job status as pushed by the service. Unknown strings are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    Pending,
    Generating,
    Processing,
    Ready,
    Failed,
    Error,
    Unknown,
    Other(String),
}

impl JobStatus {
    /// `ready` and `failed` end the job; nothing follows them on the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Generating => "generating",
            JobStatus::Processing => "processing",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Unknown => "unknown",
            JobStatus::Other(other) => other,
        }
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => JobStatus::Pending,
            "generating" => JobStatus::Generating,
            "processing" => JobStatus::Processing,
            "ready" => JobStatus::Ready,
            "failed" => JobStatus::Failed,
            "error" => JobStatus::Error,
            "unknown" => JobStatus::Unknown,
            _ => JobStatus::Other(value),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub video_id: String,
    pub status: JobStatus,
}

/// How a status stream finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// A terminal status arrived and the connection was released.
    Terminal(JobStatus),
    /// The producer closed the stream without a terminal status.
    Closed,
    /// The consumer was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid payload: {0}")]
    Payload(String),
}
