use std::sync::Arc;

use anyhow::Context;
use notes_engine::{
    ensure_output_dir, AuthClient, AuthTransport, BearerToken, Browser, CookieSession,
    CredentialStore, DirectorySaveTarget, DownloadClient, EventStreamConsumer,
    FileCredentialStore, GenerationClient, HttpAuthClient, InboundMessage, JobService,
    MemoryCredentialStore, NotesService, ServiceClient, ServiceSettings, TransportKind,
};
use notes_logging::{notes_info, notes_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::AppConfig;
use super::effects::{ControlContext, ControlDriver};
use super::injector::Injector;
use super::page::Page;

/// Remote collaborators of a page session.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthClient>,
    pub jobs: Arc<dyn JobService>,
}

fn build_transport(settings: &ServiceSettings) -> Arc<dyn AuthTransport> {
    match settings.transport {
        TransportKind::CookieSession => Arc::new(CookieSession),
        TransportKind::BearerToken => {
            let store: Arc<dyn CredentialStore> = match &settings.credential_path {
                Some(path) => Arc::new(FileCredentialStore::new(path.clone())),
                None => Arc::new(MemoryCredentialStore::new()),
            };
            Arc::new(BearerToken::new(store))
        }
    }
}

/// Wires the HTTP clients for `config`. Creates the output directory.
pub fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let output_dir = &config.control.output_dir;
    ensure_output_dir(output_dir)
        .with_context(|| format!("preparing output directory {:?}", output_dir))?;

    let transport = build_transport(&config.service);
    let client = ServiceClient::new(config.service.clone(), transport)
        .context("building service client")?;
    notes_info!(
        "Notes service at {} ({:?})",
        client.base_url(),
        config.service.transport
    );

    let save_target = Arc::new(DirectorySaveTarget::new(output_dir.clone()));
    let downloads = DownloadClient::new(client.clone(), save_target)
        .with_default_filename(config.control.default_filename.clone());
    let jobs = NotesService::new(
        GenerationClient::new(client.clone()),
        EventStreamConsumer::new(client.clone()),
        downloads,
    );

    Ok(Services {
        auth: Arc::new(HttpAuthClient::new(client)),
        jobs: Arc::new(jobs),
    })
}

/// A running injector bound to one page.
pub struct PageSession {
    injector: Arc<Injector>,
    messages: mpsc::UnboundedSender<InboundMessage>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl PageSession {
    /// Starts the injector on `page`. Must be called inside a tokio runtime.
    pub fn start(
        page: Arc<dyn Page>,
        browser: Arc<dyn Browser>,
        services: Services,
        config: &AppConfig,
    ) -> Self {
        let context = ControlContext {
            page,
            browser,
            auth: services.auth,
            jobs: services.jobs,
            settings: config.control.clone(),
        };
        let injector = Injector::new(context);
        let (messages, inbox) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&injector).run(inbox, shutdown.clone()));
        Self {
            injector,
            messages,
            shutdown,
            task,
        }
    }

    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    /// Delivers a cross-context message, as the login popup would.
    pub fn post_message(&self, message: InboundMessage) {
        if self.messages.send(message).is_err() {
            notes_warn!("Page session stopped; message dropped");
        }
    }

    /// Resolves once a live control is in the page.
    pub async fn wait_for_control(&self) -> Option<Arc<ControlDriver>> {
        let mut controls = self.injector.subscribe_control();
        let control = controls
            .wait_for(|control| control.as_ref().is_some_and(|driver| !driver.is_shut_down()))
            .await
            .ok()?;
        let driver = (*control).clone();
        driver
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(err) = self.task.await {
            notes_warn!("Injector task failed: {}", err);
        }
    }
}
