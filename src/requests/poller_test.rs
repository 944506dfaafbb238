use super::*;

use std::collections::HashMap;
use std::sync::Mutex;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;

use crate::requests::render::RowStyle;

const ONE_NEW_ROW: &str = r#"["42", "[{\"pk\":1,\"fields\":{\"path\":\"/x\",\"method\":\"GET\",\"date\":\"2024-01-01\",\"priority\":5,\"new_request\":1}}]"]"#;
const TWO_ROWS: &str = r#"["", "[{\"pk\":1,\"fields\":{\"path\":\"/low\",\"method\":\"GET\",\"date\":\"d\",\"priority\":2,\"new_request\":0}},{\"pk\":2,\"fields\":{\"path\":\"/high\",\"method\":\"GET\",\"date\":\"d\",\"priority\":10,\"new_request\":0}}]"]"#;

#[derive(Clone)]
struct Feed {
    reply: Arc<Mutex<(StatusCode, &'static str)>>,
    viewed: Arc<Mutex<Vec<Option<String>>>>,
}

impl Feed {
    fn new(body: &'static str) -> Self {
        Self { reply: Arc::new(Mutex::new((StatusCode::OK, body))), viewed: Arc::new(Mutex::new(Vec::new())) }
    }

    fn set_reply(&self, status: StatusCode, body: &'static str) {
        *self.reply.lock().unwrap() = (status, body);
    }

    fn hits(&self) -> usize {
        self.viewed.lock().unwrap().len()
    }
}

async fn requests_ajax(State(feed): State<Feed>, Query(params): Query<HashMap<String, String>>) -> (StatusCode, &'static str) {
    feed.viewed.lock().unwrap().push(params.get("viewed").cloned());
    *feed.reply.lock().unwrap()
}

async fn spawn_server(feed: Feed) -> ClientConfig {
    let app = Router::new().route(REQUESTS_PATH, get(requests_ajax)).with_state(feed);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    ClientConfig::default().with_base_url(&format!("http://{addr}")).unwrap()
}

fn poller(config: &ClientConfig, mode: DisplayMode) -> RequestPoller {
    RequestPoller::new(reqwest::Client::new(), config, mode, DEFAULT_TITLE).unwrap()
}

#[tokio::test]
async fn refresh_renders_rows_and_badge() {
    let feed = Feed::new(ONE_NEW_ROW);
    let config = spawn_server(feed).await;
    let poller = poller(&config, DisplayMode::Interactive);

    poller.refresh().await;
    let snapshot = poller.snapshot();

    assert_eq!(snapshot.title, "(42)Requests");
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.rows[0].path, "/x");
    assert_eq!(snapshot.rows[0].style, RowStyle::Emphasis);
}

#[tokio::test]
async fn refresh_sorts_by_priority() {
    let feed = Feed::new(TWO_ROWS);
    let config = spawn_server(feed).await;
    let poller = poller(&config, DisplayMode::ReadOnly);

    poller.refresh().await;
    let paths: Vec<String> = poller.snapshot().rows.into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/high", "/low"]);
}

#[tokio::test]
async fn viewed_hint_follows_focus() {
    let feed = Feed::new(TWO_ROWS);
    let config = spawn_server(feed.clone()).await;
    let poller = poller(&config, DisplayMode::Interactive);

    poller.refresh().await;
    poller.set_focused(true);
    poller.refresh().await;

    let viewed = feed.viewed.lock().unwrap().clone();
    assert_eq!(viewed, vec![Some(String::new()), Some("yes".to_string())]);
}

#[tokio::test]
async fn failed_refresh_keeps_last_render() {
    let feed = Feed::new(ONE_NEW_ROW);
    let config = spawn_server(feed.clone()).await;
    let poller = poller(&config, DisplayMode::Interactive);

    poller.refresh().await;
    let before = poller.snapshot();

    feed.set_reply(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    poller.refresh().await;
    assert_eq!(poller.snapshot(), before);

    feed.set_reply(StatusCode::OK, "not json");
    poller.refresh().await;
    assert_eq!(poller.snapshot(), before);
}

#[tokio::test]
async fn fetch_reports_status_errors() {
    let feed = Feed::new("");
    feed.set_reply(StatusCode::SERVICE_UNAVAILABLE, "down");
    let config = spawn_server(feed).await;
    let poller = poller(&config, DisplayMode::Interactive);

    let err = poller.fetch().await.unwrap_err();
    assert!(matches!(err, PollError::Status { status: 503, ref body } if body == "down"));
}

#[tokio::test]
async fn subscribers_see_published_snapshots() {
    let feed = Feed::new(ONE_NEW_ROW);
    let config = spawn_server(feed).await;
    let poller = poller(&config, DisplayMode::Interactive);
    let mut rx = poller.subscribe();

    poller.refresh().await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().title, "(42)Requests");
}

#[tokio::test]
async fn handle_polls_immediately_and_stops() {
    let feed = Feed::new(TWO_ROWS);
    let config = spawn_server(feed.clone()).await;
    let poller = Arc::new(poller(&config, DisplayMode::Interactive));
    let mut rx = poller.subscribe();

    let handle = poller.clone().start(Duration::from_millis(20));
    tokio::time::timeout(Duration::from_secs(5), rx.changed()).await.unwrap().unwrap();
    assert!(handle.is_running());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(feed.hits() >= 2, "expected repeated polls, got {}", feed.hits());

    handle.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_running());
    let settled = feed.hits();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(feed.hits(), settled);
}

#[tokio::test]
async fn dropping_handle_cancels_polling() {
    let feed = Feed::new(TWO_ROWS);
    let config = spawn_server(feed.clone()).await;
    let poller = Arc::new(poller(&config, DisplayMode::Interactive));

    let handle = poller.clone().start(Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(handle);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = feed.hits();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(feed.hits(), settled);
}
