#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User activated the control (the button, or the download link once ready).
    Activated {
        page_url: String,
        video_id: Option<String>,
    },
    /// The login popup reported success, optionally with a credential.
    AuthCompleted { credential: Option<String> },
    /// The service accepted the generation request.
    SubmissionAccepted,
    /// Submission or the status stream failed.
    ErrorRaised(ErrorSignal),
    /// A status arrived on the job's event stream.
    StatusReceived(StatusUpdate),
    /// The recovery delay elapsed; carries the freshly queried identity.
    RecoveryDue { identity: Option<String> },
    /// The session was invalidated by an explicit logout.
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSignal {
    /// The service answered 401.
    Unauthorized,
    /// Any other failure while submitting or opening the stream.
    Network,
    /// The stream closed before a terminal status arrived.
    StreamEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// A non-terminal status such as `pending` or `processing`.
    Intermediate(String),
    Ready,
    Failed,
}

impl StatusUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusUpdate::Ready | StatusUpdate::Failed)
    }
}
