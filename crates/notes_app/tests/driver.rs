mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{FakeAuth, FakeJobs, Harness, WATCH_URL};
use notes_app::DownloadOutcome;
use notes_core::{
    ControlState, ControlView, Msg, StyleTag, LABEL_ERROR, LABEL_WAITING_FOR_LOGIN,
};
use notes_engine::{GenerateRequest, JobStatus, ServiceError, StreamEnd};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn generation_reaches_success_and_downloads() {
    let harness = Harness::new(
        WATCH_URL,
        FakeAuth::signed_in("ann"),
        FakeJobs::finishing_with(vec![JobStatus::Pending, JobStatus::Processing, JobStatus::Ready]),
    );
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    assert_eq!(driver.state(), ControlState::Generating);
    assert_eq!(harness.page.control_view().unwrap().style(), Some(StyleTag::Loading));

    states
        .wait_for(|state| *state == ControlState::Success)
        .await
        .unwrap();
    assert_eq!(
        harness.jobs.submitted(),
        vec![GenerateRequest {
            video_url: WATCH_URL.to_string(),
            video_id: "abc123".to_string(),
        }]
    );
    assert!(matches!(
        harness.page.control_view(),
        Some(ControlView::DownloadLink { ref video_id, .. }) if video_id == "abc123"
    ));

    let mut downloads = driver.subscribe_downloads();
    driver.activate();
    let outcome = downloads.wait_for(Option::is_some).await.unwrap().clone();
    assert_eq!(
        outcome,
        Some(DownloadOutcome::Saved("notes/abc123.md".into()))
    );
    assert_eq!(*harness.jobs.downloads.lock().unwrap(), vec!["abc123".to_string()]);
    assert_eq!(driver.state(), ControlState::Success);
}

#[tokio::test(start_paused = true)]
async fn failed_job_recovers_after_the_delay() {
    let harness = Harness::new(
        WATCH_URL,
        FakeAuth::signed_in("ann"),
        FakeJobs::finishing_with(vec![JobStatus::Pending, JobStatus::Failed]),
    );
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Error)
        .await
        .unwrap();
    let failed_at = Instant::now();
    assert_eq!(harness.page.control_view().unwrap().label(), LABEL_ERROR);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(driver.state(), ControlState::Error);

    states
        .wait_for(|state| *state == ControlState::Ready)
        .await
        .unwrap();
    assert!(failed_at.elapsed() >= harness.context.settings.error_recovery_delay);
    assert_eq!(harness.page.control_view().unwrap().label(), "Make Notes (ann)");
}

#[tokio::test(start_paused = true)]
async fn earlier_error_timer_does_not_cut_a_later_error_short() {
    let harness = Harness::new(
        WATCH_URL,
        FakeAuth::signed_in("ann"),
        FakeJobs::finishing_with(vec![JobStatus::Failed]),
    );
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Error)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    driver.logout().await;
    assert_eq!(driver.state(), ControlState::Login);
    *harness.auth.identity.lock().unwrap() = Some("ann".to_string());
    driver.dispatch(Msg::AuthCompleted { credential: None });
    assert_eq!(driver.state(), ControlState::Ready);

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Error)
        .await
        .unwrap();
    let failed_again_at = Instant::now();

    // Past the first episode's deadline, still inside the second one.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(driver.state(), ControlState::Error);

    states
        .wait_for(|state| *state == ControlState::Ready)
        .await
        .unwrap();
    assert!(failed_again_at.elapsed() >= harness.context.settings.error_recovery_delay);
}

#[tokio::test(start_paused = true)]
async fn recovery_without_identity_returns_to_login() {
    let harness = Harness::new(
        WATCH_URL,
        FakeAuth::signed_in("ann"),
        FakeJobs::finishing_with(vec![JobStatus::Failed]),
    );
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Error)
        .await
        .unwrap();
    *harness.auth.identity.lock().unwrap() = None;

    states
        .wait_for(|state| *state == ControlState::Login)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn unauthorized_submission_returns_to_login() {
    let jobs = FakeJobs::default();
    *jobs.submit_result.lock().unwrap() = Err(ServiceError::Unauthorized);
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), jobs);
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Login)
        .await
        .unwrap();

    assert_eq!(harness.auth.invalidations.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.browser.alerts(),
        vec!["Session expired. Please login again.".to_string()]
    );
    assert_eq!(harness.page.control_view().unwrap().label(), "Login to Notes AI");
}

#[tokio::test(start_paused = true)]
async fn network_failure_on_submit_is_an_error() {
    let jobs = FakeJobs::default();
    *jobs.submit_result.lock().unwrap() = Err(ServiceError::HttpStatus(500));
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), jobs);
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Error)
        .await
        .unwrap();
    assert!(harness.browser.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stream_closing_early_is_an_error() {
    let jobs = FakeJobs::finishing_with(vec![JobStatus::Pending]);
    *jobs.stream_end.lock().unwrap() = Ok(StreamEnd::Closed);
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), jobs);
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Error)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn missing_video_id_notifies_and_stays_ready() {
    let harness = Harness::new(
        "https://www.youtube.com/watch?list=PL1",
        FakeAuth::signed_in("ann"),
        FakeJobs::default(),
    );
    let driver = harness.driver(Some("ann"));

    driver.activate();
    tokio::task::yield_now().await;

    assert_eq!(driver.state(), ControlState::Ready);
    assert_eq!(
        harness.browser.alerts(),
        vec!["Could not detect video ID".to_string()]
    );
    assert!(harness.jobs.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn login_activation_opens_one_popup() {
    let harness = Harness::new(WATCH_URL, FakeAuth::default(), FakeJobs::default());
    let driver = harness.driver(None);

    driver.activate();
    driver.activate();

    assert_eq!(driver.state(), ControlState::Login);
    assert_eq!(harness.auth.logins.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.browser.popups(),
        vec!["http://localhost:8000/auth/google".to_string()]
    );
    let view = harness.page.control_view().unwrap();
    assert_eq!(view.label(), LABEL_WAITING_FOR_LOGIN);
    assert!(view.is_disabled());
}

#[tokio::test(start_paused = true)]
async fn failed_download_alerts_and_keeps_the_link() {
    let mut jobs = FakeJobs::finishing_with(vec![JobStatus::Ready]);
    jobs.saved_path = None;
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), jobs);
    let driver = harness.driver(Some("ann"));
    let mut states = driver.subscribe();

    driver.activate();
    states
        .wait_for(|state| *state == ControlState::Success)
        .await
        .unwrap();

    let mut downloads = driver.subscribe_downloads();
    driver.activate();
    let outcome = downloads.wait_for(Option::is_some).await.unwrap().clone();
    assert!(matches!(outcome, Some(DownloadOutcome::Failed(_))));
    assert_eq!(harness.browser.alerts(), vec!["Failed to download note".to_string()]);
    assert_eq!(driver.state(), ControlState::Success);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_the_stream_and_ignores_later_messages() {
    let jobs = FakeJobs {
        hold_stream: true,
        ..FakeJobs::default()
    };
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), jobs);
    let driver = harness.driver(Some("ann"));

    driver.activate();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(driver.state(), ControlState::Generating);
    assert_eq!(harness.jobs.submitted().len(), 1);

    driver.shutdown();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.jobs.streams_cancelled.load(Ordering::SeqCst), 1);

    driver.activate();
    assert_eq!(driver.state(), ControlState::Generating);
    assert!(driver.is_shut_down());
}

#[tokio::test(start_paused = true)]
async fn logout_returns_to_login() {
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), FakeJobs::default());
    let driver = harness.driver(Some("ann"));

    driver.logout().await;

    assert_eq!(driver.state(), ControlState::Login);
    assert_eq!(harness.auth.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(harness.page.control_view().unwrap().label(), "Login to Notes AI");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatches_render_and_publish_the_final_state() {
    let harness = Harness::new(WATCH_URL, FakeAuth::signed_in("ann"), FakeJobs::default());
    let driver = harness.driver(Some("ann"));

    let tasks = (0..64).map(|round| {
        let driver = driver.clone();
        tokio::spawn(async move {
            let msg = if round % 2 == 0 {
                Msg::LoggedOut
            } else {
                Msg::AuthCompleted { credential: None }
            };
            driver.dispatch(msg);
        })
    });
    for result in futures_util::future::join_all(tasks).await {
        result.unwrap();
    }

    let view = driver.view();
    assert_eq!(harness.page.control_view(), Some(view.clone()));
    match view {
        ControlView::Button { state, .. } => assert_eq!(driver.state(), state),
        ControlView::DownloadLink { .. } => panic!("no job was started"),
    }
}
