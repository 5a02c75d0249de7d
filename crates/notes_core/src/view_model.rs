use crate::{ControlModel, ControlState};

pub const LABEL_LOGIN: &str = "Login to Notes AI";
pub const LABEL_WAITING_FOR_LOGIN: &str = "Waiting for Login...";
pub const LABEL_READY: &str = "Make Notes";
pub const LABEL_GENERATING: &str = "Generating...";
pub const LABEL_ERROR: &str = "Error (Try Again)";
pub const LABEL_DOWNLOAD: &str = "Download Note";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Loading,
    Error,
    Success,
}

impl StyleTag {
    pub fn class_name(self) -> &'static str {
        match self {
            StyleTag::Loading => "loading",
            StyleTag::Error => "error",
            StyleTag::Success => "success",
        }
    }
}

/// What the page should display for the control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlView {
    Button {
        state: ControlState,
        label: String,
        disabled: bool,
        style: Option<StyleTag>,
    },
    /// Replaces the button once the job is ready.
    DownloadLink { label: String, video_id: String },
}

impl ControlView {
    pub(crate) fn from_model(model: &ControlModel) -> Self {
        let state = model.state();
        let (label, disabled, style) = match state {
            ControlState::Login if model.is_awaiting_login() => {
                (LABEL_WAITING_FOR_LOGIN.to_string(), true, None)
            }
            ControlState::Login => (LABEL_LOGIN.to_string(), false, None),
            ControlState::Ready => {
                let label = match model.identity() {
                    Some(identity) => format!("{LABEL_READY} ({identity})"),
                    None => LABEL_READY.to_string(),
                };
                (label, false, None)
            }
            ControlState::Generating => {
                (LABEL_GENERATING.to_string(), true, Some(StyleTag::Loading))
            }
            ControlState::Error => (LABEL_ERROR.to_string(), false, Some(StyleTag::Error)),
            ControlState::Success => {
                return ControlView::DownloadLink {
                    label: LABEL_DOWNLOAD.to_string(),
                    video_id: model.video_id().unwrap_or_default().to_string(),
                };
            }
        };
        ControlView::Button {
            state,
            label,
            disabled,
            style,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ControlView::Button { label, .. } | ControlView::DownloadLink { label, .. } => label,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, ControlView::Button { disabled: true, .. })
    }

    pub fn style(&self) -> Option<StyleTag> {
        match self {
            ControlView::Button { style, .. } => *style,
            ControlView::DownloadLink { .. } => Some(StyleTag::Success),
        }
    }
}
