mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client_for, init_logging};
use notes_engine::{
    CookieSession, EventStreamConsumer, JobStatus, ServiceError, StatusEvent, StreamEnd,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_events(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/notes/abc123/events"))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

async fn collect(
    consumer: &EventStreamConsumer,
    cancel: &CancellationToken,
) -> (Result<StreamEnd, ServiceError>, Vec<JobStatus>) {
    let mut seen = Vec::new();
    let end = consumer
        .consume("abc123", cancel, |event: StatusEvent| {
            assert_eq!(event.video_id, "abc123");
            seen.push(event.status);
        })
        .await;
    (end, seen)
}

#[tokio::test]
async fn statuses_are_forwarded_in_order_until_terminal() {
    init_logging();
    let server = MockServer::start().await;
    serve_events(
        &server,
        200,
        "data: {\"status\":\"pending\"}\n\n\
         : keepalive\n\n\
         data: {\"status\":\n\n\
         data: {\"status\":\"processing\"}\n\n\
         data: {\"status\":\"ready\"}\n\n\
         data: {\"status\":\"failed\"}\n\n",
    )
    .await;

    let consumer = EventStreamConsumer::new(client_for(&server, Arc::new(CookieSession)));
    let (end, seen) = collect(&consumer, &CancellationToken::new()).await;

    assert_eq!(end, Ok(StreamEnd::Terminal(JobStatus::Ready)));
    assert_eq!(
        seen,
        vec![JobStatus::Pending, JobStatus::Processing, JobStatus::Ready]
    );
}

#[tokio::test]
async fn failed_status_is_terminal() {
    init_logging();
    let server = MockServer::start().await;
    serve_events(
        &server,
        200,
        "data: {\"status\":\"generating\"}\n\ndata: {\"status\":\"failed\"}\n\n",
    )
    .await;

    let consumer = EventStreamConsumer::new(client_for(&server, Arc::new(CookieSession)));
    let (end, seen) = collect(&consumer, &CancellationToken::new()).await;

    assert_eq!(end, Ok(StreamEnd::Terminal(JobStatus::Failed)));
    assert_eq!(seen, vec![JobStatus::Generating, JobStatus::Failed]);
}

#[tokio::test]
async fn unterminated_final_record_is_still_read() {
    init_logging();
    let server = MockServer::start().await;
    serve_events(&server, 200, "data: {\"status\":\"ready\"}").await;

    let consumer = EventStreamConsumer::new(client_for(&server, Arc::new(CookieSession)));
    let (end, seen) = collect(&consumer, &CancellationToken::new()).await;

    assert_eq!(end, Ok(StreamEnd::Terminal(JobStatus::Ready)));
    assert_eq!(seen, vec![JobStatus::Ready]);
}

#[tokio::test]
async fn stream_closed_without_terminal_status() {
    init_logging();
    let server = MockServer::start().await;
    serve_events(&server, 200, "data: {\"status\":\"pending\"}\n\n").await;

    let consumer = EventStreamConsumer::new(client_for(&server, Arc::new(CookieSession)));
    let (end, seen) = collect(&consumer, &CancellationToken::new()).await;

    assert_eq!(end, Ok(StreamEnd::Closed));
    assert_eq!(seen, vec![JobStatus::Pending]);
}

#[tokio::test]
async fn failing_to_open_is_an_error() {
    init_logging();
    let server = MockServer::start().await;
    serve_events(&server, 500, "").await;

    let consumer = EventStreamConsumer::new(client_for(&server, Arc::new(CookieSession)));
    let (end, seen) = collect(&consumer, &CancellationToken::new()).await;

    assert_eq!(end, Err(ServiceError::HttpStatus(500)));
    assert!(seen.is_empty());
}

#[tokio::test]
async fn cancellation_releases_pending_stream() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/abc123/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(30))
                .set_body_string("data: {\"status\":\"ready\"}\n\n"),
        )
        .mount(&server)
        .await;

    let consumer = EventStreamConsumer::new(client_for(&server, Arc::new(CookieSession)));
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let (end, seen) = collect(&consumer, &cancel).await;
    assert_eq!(end, Ok(StreamEnd::Cancelled));
    assert!(seen.is_empty());
}
