// HttpSender against a local mock server: auth header and status mapping.

use std::sync::Arc;
use std::time::Duration;

use matchstats_core::api::{ApiError, HttpSender, RequestSender, StatsApi};

fn sender() -> HttpSender {
    HttpSender::new("secret-key", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn sends_bearer_token_and_returns_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/players/p-1")
        .match_header("authorization", "Bearer secret-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{ "player_id": "p-1", "nickname": "alice" }"#)
        .create_async()
        .await;

    let body = sender()
        .send(&format!("{}/players/p-1", server.url()))
        .await
        .unwrap();

    assert!(String::from_utf8(body).unwrap().contains("alice"));
    mock.assert_async().await;
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/players/p-1")
        .match_header("user-agent", mockito::Matcher::Regex("^matchstats/".into()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    sender()
        .send(&format!("{}/players/p-1", server.url()))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/matches/m-1/stats")
        .with_status(429)
        .create_async()
        .await;

    let url = format!("{}/matches/m-1/stats", server.url());
    match sender().send(&url).await.unwrap_err() {
        ApiError::Status { url: failed, status } => {
            assert_eq!(status, 429);
            assert_eq!(failed, url);
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_failure_maps_to_transport_error() {
    // Port 9 on localhost is reserved (discard) and not expected to listen.
    let err = sender()
        .send("http://127.0.0.1:9/players/p-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }), "got {err}");
}

#[tokio::test]
async fn stats_api_decodes_through_http_sender() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/players/p-1/history")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("game".into(), "cs2".into()),
            mockito::Matcher::UrlEncoded("offset".into(), "0".into()),
            mockito::Matcher::UrlEncoded("limit".into(), "20".into()),
        ]))
        .with_status(200)
        .with_body(r#"{ "items": [ { "match_id": "m-1", "competition_type": "matchmaking" } ] }"#)
        .create_async()
        .await;

    let api = StatsApi::new(Arc::new(sender()), server.url(), "cs2");
    let page = api.history_page("p-1", 0, 20).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].match_id, "m-1");
}
