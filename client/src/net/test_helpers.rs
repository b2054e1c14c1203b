//! Scripted in-memory transport for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tokio::sync::Notify;

use tempfile::TempDir;

use super::api::ApiClient;
use super::envelope::RawResponse;
use super::error::ApiError;
use super::session::{REFRESH_TOKEN_PATH, SessionManager};
use super::transport::{ApiRequest, Transport};
use crate::state::auth::AuthStore;
use crate::state::profile_cache::ProfileCache;

#[derive(Default)]
struct Script {
    authorized: bool,
    hold_refresh: bool,
    refresh_fails: bool,
    stay_unauthorized: bool,
    offline: bool,
    routes: HashMap<String, RawResponse>,
    requests: Vec<ApiRequest>,
    log: Vec<String>,
}

/// Backend double: 401 for everything until a refresh succeeds, then canned
/// responses keyed by `METHOD /path`.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<Script>,
    refresh_gate: Notify,
}

impl ScriptedTransport {
    pub(crate) fn authorized() -> Arc<Self> {
        let transport = Self::default();
        transport.lock().authorized = true;
        Arc::new(transport)
    }

    pub(crate) fn unauthorized() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park refresh requests until [`Self::release_refresh`].
    pub(crate) fn hold_refresh(&self) {
        self.lock().hold_refresh = true;
    }

    pub(crate) fn release_refresh(&self) {
        self.refresh_gate.notify_one();
    }

    pub(crate) fn fail_refresh(&self) {
        self.lock().refresh_fails = true;
    }

    /// Keep answering 401 even after a successful refresh.
    pub(crate) fn stay_unauthorized(&self) {
        self.lock().stay_unauthorized = true;
    }

    pub(crate) fn go_offline(&self) {
        self.lock().offline = true;
    }

    pub(crate) fn route(&self, method: &str, path: &str, status: u16, body: Value) {
        self.lock().routes.insert(format!("{method} {path}"), json_response(status, body));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    pub(crate) fn last_request(&self) -> Option<ApiRequest> {
        self.lock().requests.last().cloned()
    }

    /// Responses in the order the backend produced them.
    pub(crate) fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub(crate) fn refresh_count(&self) -> usize {
        self.lock().requests.iter().filter(|r| r.path == REFRESH_TOKEN_PATH).count()
    }

    pub(crate) fn count_for(&self, path: &str) -> usize {
        self.lock().requests.iter().filter(|r| r.path == path).count()
    }

    async fn refresh(&self) -> RawResponse {
        let hold = self.lock().hold_refresh;
        if hold {
            self.refresh_gate.notified().await;
        }
        let mut script = self.lock();
        if script.refresh_fails {
            script.log.push("refresh failed".to_owned());
            return json_response(401, json!({ "message": "Invalid refresh token" }));
        }
        script.authorized = !script.stay_unauthorized;
        script.log.push("refresh ok".to_owned());
        json_response(200, json!({ "statusCode": 200, "message": "Access token refreshed" }))
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        {
            let mut script = self.lock();
            script.requests.push(request.clone());
            if script.offline {
                return Err(ApiError::Transport("connection refused".to_owned()));
            }
        }
        if request.path == REFRESH_TOKEN_PATH {
            return Ok(self.refresh().await);
        }

        let mut script = self.lock();
        let label = request.label();
        if !script.authorized {
            script.log.push(format!("401 {label}"));
            return Ok(json_response(401, json!({ "message": "Unauthorized request" })));
        }
        let response = script
            .routes
            .get(&label)
            .cloned()
            .unwrap_or_else(|| json_response(200, json!({ "path": request.path })));
        script.log.push(format!("{} {label}", response.status));
        Ok(response)
    }
}

/// Response with a JSON body and the status's canonical reason phrase.
pub(crate) fn json_response(status: u16, body: Value) -> RawResponse {
    let reason = reqwest::StatusCode::from_u16(status).ok().and_then(|s| s.canonical_reason());
    RawResponse { status, reason: reason.unwrap_or("Unknown Status").to_owned(), body: Some(body) }
}

pub(crate) fn manager(transport: &Arc<ScriptedTransport>) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(transport.clone()))
}

/// Auth store over `transport` with a profile cache in a fresh temp dir.
pub(crate) fn auth_store(transport: &Arc<ScriptedTransport>) -> (AuthStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ProfileCache::new(dir.path().join("profile.json"));
    (AuthStore::new(ApiClient::with_transport(transport.clone()), cache), dir)
}

/// Auth store already logged in as `alice` (id `u1`).
pub(crate) async fn signed_in(transport: &Arc<ScriptedTransport>) -> (AuthStore, TempDir) {
    transport.route("POST", "/users/login", 200, json!({ "data": { "user": user_json("u1", "alice") } }));
    let (store, dir) = auth_store(transport);
    store.login("alice@example.com", "pw").await.unwrap();
    (store, dir)
}

/// Yield to spawned tasks until `cond` holds.
pub(crate) async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub(crate) fn user_json(id: &str, username: &str) -> Value {
    json!({
        "_id": id,
        "fullname": format!("{username} fullname"),
        "username": username,
        "email": format!("{username}@example.com"),
        "avatar": format!("https://cdn.example.com/{username}.png")
    })
}

pub(crate) fn video_json(id: &str) -> Value {
    json!({
        "_id": id,
        "title": format!("video {id}"),
        "description": "desc",
        "videofile": format!("https://cdn.example.com/{id}.mp4"),
        "thumbnail": format!("https://cdn.example.com/{id}.png"),
        "duration": 125.0,
        "views": 1200,
        "ispublished": true,
        "owner": user_json("u-owner", "owner"),
        "createdAt": "2024-01-01T00:00:00Z",
        "likes": 10,
        "dislikes": 2,
        "isLiked": false,
        "isDisliked": false
    })
}

pub(crate) fn comment_json(id: &str) -> Value {
    json!({
        "_id": id,
        "content": format!("comment {id}"),
        "video": "v-1",
        "owner": user_json("u-c", "commenter"),
        "createdAt": "2024-01-02T00:00:00Z",
        "likes": 1,
        "isLiked": false
    })
}
