#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use notes_app::{ControlContext, ControlDriver, ControlSettings, VirtualPage};
use notes_core::ControlModel;
use notes_engine::{
    AuthClient, AuthCompletion, Browser, DownloadError, GenerateRequest, Identity, JobService,
    JobStatus, ServiceError, StatusEvent, StreamEnd,
};
use tokio_util::sync::CancellationToken;
use url::Url;

pub const ORIGIN: &str = "http://localhost:8000";
pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=abc123";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(notes_logging::initialize_for_tests);
}

#[derive(Default)]
pub struct RecordingBrowser {
    pub popups: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn popups(&self) -> Vec<String> {
        self.popups.lock().unwrap().clone()
    }
}

impl Browser for RecordingBrowser {
    fn open_popup(&self, url: &Url, _name: &str, _features: &str) {
        self.popups.lock().unwrap().push(url.to_string());
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct FakeAuth {
    pub identity: Mutex<Option<String>>,
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
    pub invalidations: AtomicUsize,
    pub accepted: Mutex<Vec<Option<String>>>,
}

impl FakeAuth {
    pub fn signed_in(user: &str) -> Self {
        Self {
            identity: Mutex::new(Some(user.to_string())),
            ..Self::default()
        }
    }

    pub fn accepted(&self) -> Vec<Option<String>> {
        self.accepted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuthClient for FakeAuth {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity
            .lock()
            .unwrap()
            .clone()
            .map(|user| Identity { user })
    }

    fn login(&self, browser: &dyn Browser) {
        self.logins.fetch_add(1, Ordering::SeqCst);
        let url = Url::parse(ORIGIN).unwrap().join("/auth/google").unwrap();
        browser.open_popup(&url, "loginPopup", "width=600,height=700");
    }

    async fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        *self.identity.lock().unwrap() = None;
    }

    fn accept_completion(&self, completion: &AuthCompletion) {
        self.accepted
            .lock()
            .unwrap()
            .push(completion.credential.clone());
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        *self.identity.lock().unwrap() = None;
    }

    fn service_origin(&self) -> String {
        ORIGIN.to_string()
    }
}

/// Scripted job service: submission outcome, statuses to replay and how the
/// stream ends.
pub struct FakeJobs {
    pub submit_result: Mutex<Result<(), ServiceError>>,
    pub statuses: Mutex<Vec<JobStatus>>,
    pub stream_end: Mutex<Result<StreamEnd, ServiceError>>,
    /// Keep the stream open until cancelled.
    pub hold_stream: bool,
    pub saved_path: Option<PathBuf>,
    pub submitted: Mutex<Vec<GenerateRequest>>,
    pub downloads: Mutex<Vec<String>>,
    pub streams_cancelled: AtomicUsize,
}

impl Default for FakeJobs {
    fn default() -> Self {
        Self {
            submit_result: Mutex::new(Ok(())),
            statuses: Mutex::new(Vec::new()),
            stream_end: Mutex::new(Ok(StreamEnd::Closed)),
            hold_stream: false,
            saved_path: None,
            submitted: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            streams_cancelled: AtomicUsize::new(0),
        }
    }
}

impl FakeJobs {
    /// Replays `statuses`, ending on the last one as terminal.
    pub fn finishing_with(statuses: Vec<JobStatus>) -> Self {
        let last = statuses.last().cloned().unwrap_or(JobStatus::Ready);
        Self {
            statuses: Mutex::new(statuses),
            stream_end: Mutex::new(Ok(StreamEnd::Terminal(last))),
            saved_path: Some(PathBuf::from("notes/abc123.md")),
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<GenerateRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobService for FakeJobs {
    async fn submit(&self, request: &GenerateRequest) -> Result<(), ServiceError> {
        self.submitted.lock().unwrap().push(request.clone());
        self.submit_result.lock().unwrap().clone()
    }

    async fn consume_events(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
        on_status: &mut (dyn FnMut(StatusEvent) + Send),
    ) -> Result<StreamEnd, ServiceError> {
        if self.hold_stream {
            cancel.cancelled().await;
            self.streams_cancelled.fetch_add(1, Ordering::SeqCst);
            return Ok(StreamEnd::Cancelled);
        }
        let statuses = self.statuses.lock().unwrap().clone();
        for status in statuses {
            on_status(StatusEvent {
                video_id: video_id.to_string(),
                status,
            });
        }
        self.stream_end.lock().unwrap().clone()
    }

    async fn download(&self, video_id: &str) -> Result<PathBuf, DownloadError> {
        self.downloads.lock().unwrap().push(video_id.to_string());
        self.saved_path
            .clone()
            .ok_or(DownloadError::Service(ServiceError::HttpStatus(404)))
    }
}

pub struct Harness {
    pub page: Arc<VirtualPage>,
    pub browser: Arc<RecordingBrowser>,
    pub auth: Arc<FakeAuth>,
    pub jobs: Arc<FakeJobs>,
    pub context: ControlContext,
}

impl Harness {
    pub fn new(location: &str, auth: FakeAuth, jobs: FakeJobs) -> Self {
        init_logging();
        let page = Arc::new(VirtualPage::new(location));
        let browser = Arc::new(RecordingBrowser::default());
        let auth = Arc::new(auth);
        let jobs = Arc::new(jobs);
        let context = ControlContext {
            page: page.clone(),
            browser: browser.clone(),
            auth: auth.clone(),
            jobs: jobs.clone(),
            settings: ControlSettings::default(),
        };
        Self {
            page,
            browser,
            auth,
            jobs,
            context,
        }
    }

    /// Mounts a container and places a control driven by a fresh driver.
    pub fn driver(&self, identity: Option<&str>) -> Arc<ControlDriver> {
        use notes_app::Page;

        let container = self.page.mount_container();
        let mut model = ControlModel::new(identity.map(str::to_string));
        let control_id = self.page.insert_control(container, &model.view());
        self.page.mark(container);
        model.consume_dirty();
        ControlDriver::new(
            self.context.clone(),
            control_id,
            model,
            CancellationToken::new(),
        )
    }
}
