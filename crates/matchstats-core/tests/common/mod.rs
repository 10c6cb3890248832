// Shared fixtures for the integration tests: an in-memory request sender and
// JSON builders for the upstream documents.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use matchstats_core::api::{ApiError, ApiResult, RequestSender, StatsApi};

pub const BASE_URL: &str = "https://stats.test/data/v4";
pub const PLAYER: &str = "player-1";

#[derive(Clone)]
enum Route {
    Body(Vec<u8>),
    Status(u16),
    Delayed(Duration, Vec<u8>),
}

/// Serves canned responses keyed by exact URL and records every request
/// along with the peak number of requests in flight. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeSender {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: impl Into<String>, body: Value) {
        self.route(url, Route::Body(body.to_string().into_bytes()));
    }

    pub fn fail(&self, url: impl Into<String>, status: u16) {
        self.route(url, Route::Status(status));
    }

    pub fn delay(&self, url: impl Into<String>, by: Duration, body: Value) {
        self.route(url, Route::Delayed(by, body.to_string().into_bytes()));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains(needle))
            .count()
    }

    /// Position of the first logged request equal to `url`.
    pub fn position_of(&self, url: &str) -> Option<usize> {
        self.requests.lock().unwrap().iter().position(|u| u == url)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn route(&self, url: impl Into<String>, route: Route) {
        self.routes.lock().unwrap().insert(url.into(), route);
    }

    async fn answer(&self, url: &str) -> ApiResult<Vec<u8>> {
        let route = self.routes.lock().unwrap().get(url).cloned();
        match route {
            Some(Route::Body(body)) => Ok(body),
            Some(Route::Delayed(by, body)) => {
                tokio::time::sleep(by).await;
                Ok(body)
            }
            Some(Route::Status(status)) => Err(ApiError::Status {
                url: url.to_owned(),
                status,
            }),
            None => Err(ApiError::Status {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }
}

#[async_trait]
impl RequestSender for FakeSender {
    async fn send(&self, url: &str) -> ApiResult<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_owned());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.answer(url).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn api(sender: &Arc<FakeSender>) -> StatsApi {
    StatsApi::new(sender.clone(), BASE_URL, "cs2")
}

// ---------------------------------------------------------------------------
// Document builders
// ---------------------------------------------------------------------------

/// One history item.
pub fn item(match_id: &str, competition_type: &str, competition_name: &str) -> Value {
    json!({
        "match_id": match_id,
        "competition_type": competition_type,
        "competition_name": competition_name,
        "finished_at": 1_700_000_000,
    })
}

pub fn matchmaking(match_id: &str) -> Value {
    item(match_id, "matchmaking", "5v5 RANKED")
}

pub fn page(items: Vec<Value>) -> Value {
    json!({ "items": items })
}

/// Match detail where `player_id` sits on the second team with `stats`, and
/// an unrelated player fills the first team.
pub fn match_detail(player_id: &str, stats: &[(&str, &str)]) -> Value {
    let stats: serde_json::Map<String, Value> = stats
        .iter()
        .map(|(k, v)| ((*k).to_owned(), Value::String((*v).to_owned())))
        .collect();
    json!({
        "rounds": [ { "teams": [
            { "players": [ { "player_id": "someone-else", "player_stats": { "Kills": "99" } } ] },
            { "players": [ { "player_id": player_id, "player_stats": stats } ] }
        ] } ]
    })
}

/// Register a single history page at `offset` for [`PLAYER`].
pub fn serve_history(sender: &Arc<FakeSender>, offset: usize, limit: usize, items: Vec<Value>) {
    let url = api(sender).history_url(PLAYER, offset, limit).unwrap();
    sender.respond(url, page(items));
}

pub fn serve_match(sender: &Arc<FakeSender>, match_id: &str, stats: &[(&str, &str)]) {
    let url = api(sender).match_stats_url(match_id).unwrap();
    sender.respond(url, match_detail(PLAYER, stats));
}
