//! Shared test doubles: scripted API, recording page, and an in-process
//! HTTP backend.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use tokio::sync::Notify;

use crate::error::ApiError;
use crate::net::api::UserApi;
use crate::net::types::{Credentials, LoginResponse, UserInfo};
use crate::page::{Location, Page};

// =============================================================================
// SCRIPTED API
// =============================================================================

/// `UserApi` double that replays queued results and records every call.
#[derive(Default)]
pub struct MockApi {
    login_replies: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    user_replies: Mutex<VecDeque<Result<Option<UserInfo>, ApiError>>>,
    logout_replies: Mutex<VecDeque<Result<(), ApiError>>>,
    calls: Mutex<Vec<String>>,
    login_gate: Option<Arc<Notify>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every `login` call until `gate` is notified.
    pub fn with_login_gate(mut self, gate: Arc<Notify>) -> Self {
        self.login_gate = Some(gate);
        self
    }

    pub fn push_login(&self, reply: Result<LoginResponse, ApiError>) {
        self.login_replies.lock().expect("mock mutex should lock").push_back(reply);
    }

    pub fn push_user(&self, reply: Result<Option<UserInfo>, ApiError>) {
        self.user_replies.lock().expect("mock mutex should lock").push_back(reply);
    }

    pub fn push_logout(&self, reply: Result<(), ApiError>) {
        self.logout_replies.lock().expect("mock mutex should lock").push_back(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock mutex should lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("mock mutex should lock").push(call);
    }

    fn unscripted() -> ApiError {
        ApiError::Transport("no scripted reply".into())
    }
}

#[async_trait]
impl UserApi for MockApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("login:{}", credentials.username));
        if let Some(gate) = &self.login_gate {
            gate.notified().await;
        }
        self.login_replies
            .lock()
            .expect("mock mutex should lock")
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted()))
    }

    async fn fetch_user(&self, username: &str) -> Result<Option<UserInfo>, ApiError> {
        self.record(format!("fetch_user:{username}"));
        self.user_replies
            .lock()
            .expect("mock mutex should lock")
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout".to_owned());
        self.logout_replies
            .lock()
            .expect("mock mutex should lock")
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted()))
    }
}

// =============================================================================
// RECORDING PAGE
// =============================================================================

/// `Page` double that keeps every alert and navigation plus the current
/// display region contents.
#[derive(Default)]
pub struct RecordingPage {
    alerts: Mutex<Vec<String>>,
    navigations: Mutex<Vec<Location>>,
    content: Mutex<Option<String>>,
}

impl RecordingPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("page mutex should lock").clone()
    }

    pub fn navigations(&self) -> Vec<Location> {
        self.navigations.lock().expect("page mutex should lock").clone()
    }

    pub fn content(&self) -> Option<String> {
        self.content.lock().expect("page mutex should lock").clone()
    }
}

impl Page for RecordingPage {
    fn alert(&self, message: &str) {
        self.alerts.lock().expect("page mutex should lock").push(message.to_owned());
    }

    fn navigate(&self, target: Location) {
        self.navigations.lock().expect("page mutex should lock").push(target);
    }

    fn render(&self, content: &str) {
        *self.content.lock().expect("page mutex should lock") = Some(content.to_owned());
    }
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

/// One request observed by [`MockBackend`].
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub body: String,
}

#[derive(Clone, Default)]
struct BackendState {
    replies: Arc<HashMap<(Method, String), (StatusCode, String)>>,
    hits: Arc<Mutex<Vec<Hit>>>,
}

/// Axum server on an ephemeral port replying from a fixed route table.
/// Unlisted routes answer `404 {"detail":"Not Found"}`.
pub struct MockBackend {
    pub base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockBackend {
    pub async fn spawn(routes: &[(Method, &str, u16, &str)]) -> Self {
        let replies = routes
            .iter()
            .map(|(method, path, status, body)| {
                let status = StatusCode::from_u16(*status).expect("valid status code");
                ((method.clone(), (*path).to_owned()), (status, (*body).to_owned()))
            })
            .collect();
        let state = BackendState { replies: Arc::new(replies), hits: Arc::default() };
        let hits = state.hits.clone();

        let app = Router::new().fallback(respond).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend failed");
        });

        Self { base_url: format!("http://{addr}"), hits }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("hits mutex should lock").clone()
    }
}

async fn respond(State(state): State<BackendState>, method: Method, uri: Uri, body: String) -> impl IntoResponse {
    let path = uri.path().to_owned();
    state
        .hits
        .lock()
        .expect("hits mutex should lock")
        .push(Hit { method: method.clone(), path: path.clone(), body });

    let (status, body) = state
        .replies
        .get(&(method, path))
        .cloned()
        .unwrap_or_else(|| (StatusCode::NOT_FOUND, r#"{"detail":"Not Found"}"#.to_owned()));
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

/// Base URL of a port that refuses connections.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}")
}
