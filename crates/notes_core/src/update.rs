use crate::{ControlModel, ControlState, Effect, ErrorSignal, Msg, StatusUpdate};

pub(crate) const NOTICE_NO_VIDEO_ID: &str = "Could not detect video ID";
pub(crate) const NOTICE_SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// Pure update function: applies a message to the control and returns any effects.
///
/// `Success` and `Error` are only reachable from `Generating`; messages that do
/// not apply to the current state are ignored.
pub fn update(mut model: ControlModel, msg: Msg) -> (ControlModel, Vec<Effect>) {
    let effects = match msg {
        Msg::Activated { page_url, video_id } => match model.state() {
            ControlState::Login if !model.is_awaiting_login() => {
                model.begin_login();
                vec![Effect::OpenLogin]
            }
            ControlState::Ready => match video_id {
                Some(video_id) => {
                    model.set_video_id(Some(video_id.clone()));
                    model.transition(ControlState::Generating);
                    vec![Effect::SubmitGeneration {
                        video_id,
                        video_url: page_url,
                    }]
                }
                None => vec![Effect::Notify(NOTICE_NO_VIDEO_ID.to_string())],
            },
            ControlState::Success => match model.video_id() {
                Some(video_id) => vec![Effect::Download {
                    video_id: video_id.to_string(),
                }],
                None => Vec::new(),
            },
            // Disabled while waiting or generating; `Error` recovers on its own.
            ControlState::Login | ControlState::Generating | ControlState::Error => Vec::new(),
        },
        Msg::AuthCompleted { credential } => {
            let mut effects = Vec::new();
            if let Some(credential) = credential {
                effects.push(Effect::PersistCredential(credential));
            }
            if matches!(model.state(), ControlState::Login | ControlState::Ready) {
                model.transition(ControlState::Ready);
            }
            effects
        }
        Msg::SubmissionAccepted => match (model.state(), model.video_id()) {
            (ControlState::Generating, Some(video_id)) => vec![Effect::ConsumeEvents {
                video_id: video_id.to_string(),
            }],
            _ => Vec::new(),
        },
        Msg::ErrorRaised(ErrorSignal::Unauthorized) => {
            model.set_identity(None);
            model.set_video_id(None);
            model.transition(ControlState::Login);
            vec![
                Effect::ClearCredential,
                Effect::Notify(NOTICE_SESSION_EXPIRED.to_string()),
            ]
        }
        Msg::ErrorRaised(ErrorSignal::Network | ErrorSignal::StreamEnded) => {
            fail_generation(&mut model)
        }
        Msg::StatusReceived(status) => {
            if model.state() != ControlState::Generating {
                Vec::new()
            } else {
                match status {
                    StatusUpdate::Ready => {
                        model.transition(ControlState::Success);
                        Vec::new()
                    }
                    StatusUpdate::Failed => fail_generation(&mut model),
                    StatusUpdate::Intermediate(_) => Vec::new(),
                }
            }
        }
        Msg::RecoveryDue { identity } => {
            if model.state() == ControlState::Error {
                let next = if identity.is_some() {
                    ControlState::Ready
                } else {
                    ControlState::Login
                };
                model.set_identity(identity);
                model.set_video_id(None);
                model.transition(next);
            }
            Vec::new()
        }
        Msg::LoggedOut => {
            if matches!(
                model.state(),
                ControlState::Login | ControlState::Ready | ControlState::Error
            ) {
                model.set_identity(None);
                model.transition(ControlState::Login);
            }
            Vec::new()
        }
    };

    (model, effects)
}

fn fail_generation(model: &mut ControlModel) -> Vec<Effect> {
    if model.state() != ControlState::Generating {
        return Vec::new();
    }
    model.transition(ControlState::Error);
    vec![Effect::ScheduleRecovery]
}
