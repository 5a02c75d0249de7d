use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use notes_app::platform::logging::{self, LogDestination};
use notes_app::{
    build_services, load_config, ConsoleBrowser, ControlDriver, DownloadOutcome, PageSession,
    VirtualPage,
};
use notes_core::{is_watch_page, ControlState};
use notes_engine::{InboundMessage, AUTH_SUCCESS_TYPE};
use serde_json::json;

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Generate and download Notes AI notes for a video page", long_about = None)]
struct Cli {
    /// Watch page URL, e.g. https://www.youtube.com/watch?v=abc123
    url: String,

    /// Config file (RON)
    #[arg(short, long, default_value = "notes.ron")]
    config: PathBuf,

    /// Override the notes service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Directory downloaded notes are saved to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Credential to deliver as if the login popup had completed
    #[arg(long)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    if !is_watch_page(&cli.url) {
        bail!("{} is not a watch page", cli.url);
    }

    let mut config = load_config(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }
    if let Some(output_dir) = cli.output_dir {
        config.control.output_dir = output_dir;
    }

    let services = build_services(&config)?;
    let origin = services.auth.service_origin();
    let page = Arc::new(VirtualPage::new(cli.url));
    let session = PageSession::start(page.clone(), Arc::new(ConsoleBrowser), services, &config);
    page.mount_container();

    let control = session
        .wait_for_control()
        .await
        .context("control was not injected")?;
    let result = run_job(&session, &control, cli.token, origin).await;
    session.stop().await;
    result
}

/// Clicks through the control: login if needed, generate, then download.
async fn run_job(
    session: &PageSession,
    control: &Arc<ControlDriver>,
    token: Option<String>,
    origin: String,
) -> Result<()> {
    let mut states = control.subscribe();

    if control.state() == ControlState::Login {
        let Some(token) = token else {
            control.activate();
            bail!("not signed in; complete the login and re-run with --token");
        };
        session.post_message(InboundMessage {
            origin,
            data: json!({ "type": AUTH_SUCCESS_TYPE, "token": token }),
        });
        states
            .wait_for(|state| *state == ControlState::Ready)
            .await?;
    }

    control.activate();
    let settled = *states
        .wait_for(|state| {
            matches!(
                state,
                ControlState::Success | ControlState::Error | ControlState::Login
            )
        })
        .await?;
    if settled != ControlState::Success {
        bail!("note generation ended in {:?}", settled);
    }

    let mut downloads = control.subscribe_downloads();
    control.activate();
    let outcome = downloads.wait_for(Option::is_some).await?.clone();
    match outcome {
        Some(DownloadOutcome::Saved(path)) => {
            println!("Saved note to {}", path.display());
            Ok(())
        }
        Some(DownloadOutcome::Failed(message)) => bail!("download failed: {message}"),
        None => bail!("download did not complete"),
    }
}
