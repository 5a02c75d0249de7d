/// Side effects requested by [`crate::update`]. The core never performs IO;
/// the page session executes these and feeds the outcome back as a [`crate::Msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the external authentication flow in a popup.
    OpenLogin,
    /// Submit a generation request for the video.
    SubmitGeneration { video_id: String, video_url: String },
    /// Attach to the job's status stream.
    ConsumeEvents { video_id: String },
    /// Fetch the finished artifact and save it.
    Download { video_id: String },
    /// Re-derive the state from the auth status after the recovery delay.
    ScheduleRecovery,
    /// Show a user-visible notice.
    Notify(String),
    /// Persist the credential delivered by the login popup.
    PersistCredential(String),
    /// Drop any locally held credential.
    ClearCredential,
}
