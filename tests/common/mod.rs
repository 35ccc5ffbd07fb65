// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: an in-process mock of the Peloton API and OAuth
//! token endpoint, plus credential file helpers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use peloton_sync::config::Config;
use peloton_sync::services::{AuthClient, CredentialStore, PelotonClient, TokenManager};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex};

/// A canned listing page.
#[allow(dead_code)]
#[derive(Clone)]
pub enum MockPage {
    Json(Value),
    Status(u16),
    Garbage,
}

/// Mutable mock state and request log.
#[derive(Default)]
pub struct MockState {
    pub pages: Mutex<Vec<MockPage>>,
    pub workout_details: Mutex<HashMap<String, Value>>,
    pub failing_workouts: Mutex<HashSet<String>>,
    pub rides: Mutex<HashMap<String, Value>>,
    pub token_response: Mutex<Option<(u16, Value)>>,

    pub page_requests: Mutex<Vec<u32>>,
    pub detail_requests: Mutex<Vec<String>>,
    pub ride_requests: Mutex<Vec<String>>,
    pub token_requests: Mutex<Vec<Value>>,
    pub me_requests: Mutex<usize>,
    pub authorization_seen: Mutex<Vec<String>>,
}

/// Running mock server.
pub struct MockPeloton {
    pub base_url: String,
    pub state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockPeloton {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/me", get(me))
            .route("/api/user/{user_id}/workouts", get(list_workouts))
            .route("/api/workout/{workout_id}", get(workout_detail))
            .route("/api/ride/{ride_id}/details", get(ride_detail))
            .route("/oauth/token", post(token))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    pub fn set_pages(&self, pages: Vec<MockPage>) {
        *self.state.pages.lock().unwrap() = pages;
    }

    pub fn set_detail(&self, workout_id: &str, detail: Value) {
        self.state
            .workout_details
            .lock()
            .unwrap()
            .insert(workout_id.to_string(), detail);
    }

    pub fn fail_detail(&self, workout_id: &str) {
        self.state
            .failing_workouts
            .lock()
            .unwrap()
            .insert(workout_id.to_string());
    }

    pub fn set_ride(&self, ride_id: &str, ride: Value) {
        self.state
            .rides
            .lock()
            .unwrap()
            .insert(ride_id.to_string(), ride);
    }

    pub fn set_token_response(&self, status: u16, body: Value) {
        *self.state.token_response.lock().unwrap() = Some((status, body));
    }

    pub fn page_requests(&self) -> Vec<u32> {
        self.state.page_requests.lock().unwrap().clone()
    }

    pub fn detail_requests(&self) -> Vec<String> {
        self.state.detail_requests.lock().unwrap().clone()
    }

    pub fn ride_requests(&self) -> Vec<String> {
        self.state.ride_requests.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> Vec<Value> {
        self.state.token_requests.lock().unwrap().clone()
    }

    pub fn me_requests(&self) -> usize {
        *self.state.me_requests.lock().unwrap()
    }

    pub fn authorization_seen(&self) -> Vec<String> {
        self.state.authorization_seen.lock().unwrap().clone()
    }

    /// Client with the given bearer token, as the sync would build it.
    pub fn client(&self, access_token: &str) -> PelotonClient {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", access_token).parse().unwrap(),
        );
        PelotonClient::new(&self.base_url, headers).unwrap()
    }

    /// Token manager pointed at this server.
    pub fn token_manager(&self, tokens_file: &FsPath) -> TokenManager {
        TokenManager::new(
            AuthClient::new(self.token_endpoint(), "test-client".to_string()),
            CredentialStore::new(tokens_file),
            86_400,
        )
    }

    /// Config pointed at this server.
    pub fn config(&self, tokens_file: &FsPath, destination_url: &str) -> Config {
        Config {
            tokens_file: tokens_file.to_path_buf(),
            api_base: self.base_url.clone(),
            token_endpoint: self.token_endpoint(),
            client_id: "test-client".to_string(),
            destination_url: destination_url.to_string(),
            ..Config::default()
        }
    }
}

fn record_auth(state: &MockState, headers: &HeaderMap) {
    if let Some(value) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        state
            .authorization_seen
            .lock()
            .unwrap()
            .push(value.to_string());
    }
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);
    *state.me_requests.lock().unwrap() += 1;
    Json(json!({"id": "user-1", "username": "rider"})).into_response()
}

async fn list_workouts(
    State(state): State<Arc<MockState>>,
    Path(_user_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    record_auth(&state, &headers);
    let page: u32 = query
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    state.page_requests.lock().unwrap().push(page);

    let pages = state.pages.lock().unwrap().clone();
    match pages.get(page as usize) {
        Some(MockPage::Json(body)) => Json(body.clone()).into_response(),
        Some(MockPage::Status(code)) => {
            StatusCode::from_u16(*code).unwrap().into_response()
        }
        Some(MockPage::Garbage) => (StatusCode::OK, "<html>not json").into_response(),
        None => Json(json!({"data": [], "show_next": false})).into_response(),
    }
}

async fn workout_detail(
    State(state): State<Arc<MockState>>,
    Path(workout_id): Path<String>,
) -> Response {
    state
        .detail_requests
        .lock()
        .unwrap()
        .push(workout_id.clone());

    if state.failing_workouts.lock().unwrap().contains(&workout_id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let detail = state
        .workout_details
        .lock()
        .unwrap()
        .get(&workout_id)
        .cloned()
        .unwrap_or_else(|| json!({"id": workout_id, "total_work": 1000}));
    Json(detail).into_response()
}

async fn ride_detail(State(state): State<Arc<MockState>>, Path(ride_id): Path<String>) -> Response {
    state.ride_requests.lock().unwrap().push(ride_id.clone());
    match state.rides.lock().unwrap().get(&ride_id) {
        Some(ride) => Json(ride.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn token(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.token_requests.lock().unwrap().push(body);
    let configured = state.token_response.lock().unwrap().clone();
    match configured {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), Json(body)).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// A listing item as the API returns it.
#[allow(dead_code)]
pub fn workout(id: &str, start_time: i64) -> Value {
    json!({
        "id": id,
        "start_time": start_time,
        "status": "COMPLETE",
        "fitness_discipline": "cycling"
    })
}

/// One listing page body.
#[allow(dead_code)]
pub fn page(items: Vec<Value>, show_next: bool) -> MockPage {
    MockPage::Json(json!({"data": items, "show_next": show_next}))
}

/// Write a tokens file into `dir` and return its path.
#[allow(dead_code)]
pub fn write_tokens(dir: &FsPath, tokens: &Value) -> PathBuf {
    let path = dir.join("peloton_tokens.json");
    std::fs::write(&path, serde_json::to_string_pretty(tokens).unwrap()).unwrap();
    path
}

/// Read a tokens file back as JSON.
#[allow(dead_code)]
pub fn read_tokens(path: &FsPath) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
