mod comic_stub;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{TimeDelta, Utc};
use comic_stub::{ComicStub, StubResponse};
use comictrack::chapter::format_timestamp;
use comictrack::server::{AppState, ServerSettings, router};
use tower::ServiceExt as _;

fn app(snapshot_url: &str) -> axum::Router {
    let settings = ServerSettings {
        snapshot_url: url::Url::parse(snapshot_url).expect("snapshot url"),
        new_lifetime: TimeDelta::days(1),
        page_title: "Marvel Ultimate Reading Order".to_owned(),
        fetch_timeout: Duration::from_secs(5),
    };
    router(AppState::new(settings).expect("app state"))
}

async fn get(app: axum::Router, path: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::get(path).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn index_splits_snapshot_by_age() {
    let stub = ComicStub::spawn();
    let now = Utc::now().naive_utc();
    let fresh = format_timestamp(&(now - TimeDelta::hours(2)));
    let stale = format_timestamp(&(now - TimeDelta::days(2)));
    stub.set(
        "/chapters.json",
        StubResponse::json(format!(
            r#"[
  {{"title":"Ultimate Black Panther #1","link":"https://comics.test/ubp/1","date":"14 February 2024","is_new":true,"new_timestamp":"{stale}"}},
  {{"title":"Ultimate Black Panther #2","link":"https://comics.test/ubp/2","date":"13 March 2024","is_new":true,"new_timestamp":"{fresh}"}},
  {{"title":"Ultimate Black Panther #3","date":"Unknown","is_new":true}}
]"#
        )),
    );

    let (status, content_type, body) = get(app(&stub.url("/chapters.json")), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap_or_default().starts_with("text/html"));

    let new_pos = body.find("New Chapters").expect("new section");
    let all_pos = body.find("All Chapters").expect("all section");
    let fresh_pos = body.find("Ultimate Black Panther #2").expect("fresh chapter");
    let stale_pos = body.find("Ultimate Black Panther #1").expect("stale chapter");
    let untimed_pos = body.find("Ultimate Black Panther #3").expect("untimed chapter");
    assert!(new_pos < fresh_pos && fresh_pos < all_pos);
    assert!(all_pos < stale_pos && all_pos < untimed_pos);
    assert!(body.contains("– Unknown"));
}

#[tokio::test]
async fn malformed_snapshot_is_bad_gateway() {
    let stub = ComicStub::spawn();
    stub.set("/chapters.json", StubResponse::json("{\"not\": \"a list\"}"));

    let (status, _, body) = get(app(&stub.url("/chapters.json")), "/").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("parse snapshot json"));
}

#[tokio::test]
async fn upstream_error_is_bad_gateway_and_server_keeps_serving() {
    let stub = ComicStub::spawn();
    stub.set("/chapters.json", StubResponse::error(503));
    let app = app(&stub.url("/chapters.json"));

    let (status, _, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("503"));

    stub.set("/chapters.json", StubResponse::json("[]"));
    let (status, _, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h2>All Chapters</h2>"));
    assert!(!body.contains("New Chapters"));

    let (status, _, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok\n");
}
