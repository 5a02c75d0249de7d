use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use notes_core::{
    update, watch_video_id, ControlModel, ControlState, ControlView, Effect, ErrorSignal, Msg,
    StatusUpdate,
};
use notes_engine::{
    AuthClient, AuthCompletion, Browser, GenerateRequest, JobService, JobStatus, ServiceError,
    StatusEvent, StreamEnd,
};
use notes_logging::{notes_debug, notes_info, notes_warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::config::ControlSettings;
use super::page::{ControlId, Page};

pub(crate) const NOTICE_DOWNLOAD_FAILED: &str = "Failed to download note";

/// Collaborators shared by the injector and every control it creates.
#[derive(Clone)]
pub struct ControlContext {
    pub page: Arc<dyn Page>,
    pub browser: Arc<dyn Browser>,
    pub auth: Arc<dyn AuthClient>,
    pub jobs: Arc<dyn JobService>,
    pub settings: ControlSettings,
}

/// Result of the latest download triggered from the control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Failed(String),
}

/// Runs one injected control: applies messages to its [`ControlModel`],
/// renders the result and executes the requested effects.
///
/// Every task it starts is bound to `lifetime`; cancelling it closes the
/// status stream and drops pending timers.
pub struct ControlDriver {
    context: ControlContext,
    control_id: ControlId,
    model: Mutex<ControlModel>,
    state_tx: watch::Sender<ControlState>,
    download_tx: watch::Sender<Option<DownloadOutcome>>,
    lifetime: CancellationToken,
    /// Timer of the current `Error` episode; cancelled once the control leaves it.
    recovery: Mutex<Option<CancellationToken>>,
}

impl ControlDriver {
    pub fn new(
        context: ControlContext,
        control_id: ControlId,
        model: ControlModel,
        lifetime: CancellationToken,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(model.state());
        let (download_tx, _) = watch::channel(None);
        Arc::new(Self {
            context,
            control_id,
            model: Mutex::new(model),
            state_tx,
            download_tx,
            lifetime,
            recovery: Mutex::new(None),
        })
    }

    pub fn control_id(&self) -> ControlId {
        self.control_id
    }

    pub fn state(&self) -> ControlState {
        *self.state_tx.borrow()
    }

    pub fn view(&self) -> ControlView {
        self.lock_model().view()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_downloads(&self) -> watch::Receiver<Option<DownloadOutcome>> {
        self.download_tx.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Detaches the control: closes its stream and drops pending work.
    pub fn shutdown(&self) {
        self.lifetime.cancel();
    }

    /// User clicked the control.
    pub fn activate(self: &Arc<Self>) {
        let page_url = self.context.page.location();
        let video_id = watch_video_id(&page_url);
        self.dispatch(Msg::Activated { page_url, video_id });
    }

    pub async fn logout(self: &Arc<Self>) {
        self.context.auth.logout().await;
        self.dispatch(Msg::LoggedOut);
    }

    pub fn dispatch(self: &Arc<Self>, msg: Msg) {
        self.apply(msg, None);
    }

    /// Applies `msg` unless `episode` was cancelled. The check and the
    /// transition happen under the model lock.
    fn apply(self: &Arc<Self>, msg: Msg, episode: Option<&CancellationToken>) {
        if self.is_shut_down() {
            notes_debug!("Control {} detached; dropping {:?}", self.control_id, msg);
            return;
        }

        // Page and subscribers observe states in the order they were applied.
        let effects = {
            let mut guard = self.lock_model();
            if episode.is_some_and(CancellationToken::is_cancelled) {
                notes_debug!("Control {} dropping stale {:?}", self.control_id, msg);
                return;
            }
            let model = std::mem::take(&mut *guard);
            let before = model.state();
            let (mut model, effects) = update(model, msg);
            let after = model.state();
            if model.consume_dirty() {
                self.context.page.render_control(self.control_id, &model.view());
            }
            *guard = model;

            if before != after {
                notes_info!("Control {} {:?} -> {:?}", self.control_id, before, after);
                if before == ControlState::Error {
                    self.cancel_recovery();
                }
                if after == ControlState::Error {
                    self.open_recovery();
                }
                self.state_tx.send_replace(after);
            }
            effects
        };

        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(self: &Arc<Self>, effect: Effect) {
        notes_debug!("Control {} effect {:?}", self.control_id, effect);
        match effect {
            Effect::OpenLogin => self.context.auth.login(self.context.browser.as_ref()),
            Effect::SubmitGeneration { video_id, video_url } => {
                self.spawn_submit(GenerateRequest {
                    video_url,
                    video_id,
                })
            }
            Effect::ConsumeEvents { video_id } => self.spawn_consume(video_id),
            Effect::Download { video_id } => self.spawn_download(video_id),
            Effect::ScheduleRecovery => self.spawn_recovery(),
            Effect::Notify(message) => self.context.browser.alert(&message),
            Effect::PersistCredential(credential) => {
                self.context.auth.accept_completion(&AuthCompletion {
                    credential: Some(credential),
                })
            }
            Effect::ClearCredential => self.context.auth.invalidate(),
        }
    }

    fn spawn_submit(self: &Arc<Self>, request: GenerateRequest) {
        let driver = Arc::clone(self);
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = driver.lifetime.cancelled() => return,
                result = driver.context.jobs.submit(&request) => result,
            };
            let msg = match result {
                Ok(()) => Msg::SubmissionAccepted,
                Err(err) => {
                    notes_warn!("Submission failed video_id={}: {}", request.video_id, err);
                    Msg::ErrorRaised(error_signal(&err))
                }
            };
            driver.dispatch(msg);
        });
    }

    fn spawn_consume(self: &Arc<Self>, video_id: String) {
        let driver = Arc::clone(self);
        tokio::spawn(async move {
            let receiver = Arc::clone(&driver);
            let mut on_status = move |event: StatusEvent| {
                receiver.dispatch(Msg::StatusReceived(map_status(event.status)));
            };
            let result = driver
                .context
                .jobs
                .consume_events(&video_id, &driver.lifetime, &mut on_status)
                .await;
            match result {
                Ok(StreamEnd::Terminal(_)) | Ok(StreamEnd::Cancelled) => {}
                Ok(StreamEnd::Closed) => {
                    driver.dispatch(Msg::ErrorRaised(ErrorSignal::StreamEnded))
                }
                Err(err) => {
                    notes_warn!("Status stream failed video_id={}: {}", video_id, err);
                    driver.dispatch(Msg::ErrorRaised(error_signal(&err)));
                }
            }
        });
    }

    fn spawn_download(self: &Arc<Self>, video_id: String) {
        let driver = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = driver.lifetime.cancelled() => return,
                result = driver.context.jobs.download(&video_id) => result,
            };
            let outcome = match outcome {
                Ok(path) => DownloadOutcome::Saved(path),
                Err(err) => {
                    notes_warn!("Download failed video_id={}: {}", video_id, err);
                    driver.context.browser.alert(NOTICE_DOWNLOAD_FAILED);
                    DownloadOutcome::Failed(err.to_string())
                }
            };
            driver.download_tx.send_replace(Some(outcome));
        });
    }

    fn spawn_recovery(self: &Arc<Self>) {
        let Some(episode) = self.lock_recovery().clone() else {
            return;
        };
        let driver = Arc::clone(self);
        let delay = self.context.settings.error_recovery_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = episode.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let identity = tokio::select! {
                _ = episode.cancelled() => return,
                identity = driver.context.auth.current_identity() => identity,
            };
            let msg = Msg::RecoveryDue {
                identity: identity.map(|identity| identity.user),
            };
            driver.apply(msg, Some(&episode));
        });
    }

    fn open_recovery(&self) {
        let episode = self.lifetime.child_token();
        if let Some(previous) = self.lock_recovery().replace(episode) {
            previous.cancel();
        }
    }

    fn cancel_recovery(&self) {
        if let Some(episode) = self.lock_recovery().take() {
            episode.cancel();
        }
    }

    fn lock_recovery(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.recovery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_model(&self) -> std::sync::MutexGuard<'_, ControlModel> {
        self.model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn error_signal(err: &ServiceError) -> ErrorSignal {
    match err {
        ServiceError::Unauthorized => ErrorSignal::Unauthorized,
        _ => ErrorSignal::Network,
    }
}

fn map_status(status: JobStatus) -> StatusUpdate {
    match status {
        JobStatus::Ready => StatusUpdate::Ready,
        JobStatus::Failed => StatusUpdate::Failed,
        other => StatusUpdate::Intermediate(other.as_str().to_string()),
    }
}
