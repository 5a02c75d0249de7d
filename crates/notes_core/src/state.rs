use crate::view_model::ControlView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Login,
    Ready,
    Generating,
    /// Terminal: the control is shown as a download link.
    Success,
    /// Transient: recovers after the recovery delay.
    Error,
}

/// State of the single injected control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlModel {
    state: ControlState,
    identity: Option<String>,
    video_id: Option<String>,
    awaiting_login: bool,
    dirty: bool,
}

impl ControlModel {
    /// Initial model for a freshly injected control: `Ready` when an identity
    /// is known, `Login` otherwise.
    pub fn new(identity: Option<String>) -> Self {
        let state = if identity.is_some() {
            ControlState::Ready
        } else {
            ControlState::Login
        };
        Self {
            state,
            identity,
            video_id: None,
            awaiting_login: false,
            dirty: true,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Video of the in-flight (or finished) job.
    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn is_awaiting_login(&self) -> bool {
        self.awaiting_login
    }

    pub fn view(&self) -> ControlView {
        ControlView::from_model(self)
    }

    /// Returns whether the model changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn transition(&mut self, next: ControlState) {
        self.state = next;
        self.awaiting_login = false;
        self.dirty = true;
    }

    pub(crate) fn begin_login(&mut self) {
        self.awaiting_login = true;
        self.dirty = true;
    }

    pub(crate) fn set_video_id(&mut self, video_id: Option<String>) {
        self.video_id = video_id;
    }

    pub(crate) fn set_identity(&mut self, identity: Option<String>) {
        self.identity = identity;
        self.dirty = true;
    }
}
