use super::*;
use crate::net::test_helpers::{ScriptedTransport, manager, wait_until};
use serde_json::json;

// =========================================================================
// Happy path
// =========================================================================

#[tokio::test]
async fn successful_request_never_refreshes() {
    let transport = ScriptedTransport::authorized();
    let session = manager(&transport);

    let body = session.execute(ApiRequest::get("/users/current-user")).await.unwrap();

    assert_eq!(body, json!({ "path": "/users/current-user" }));
    assert_eq!(transport.refresh_count(), 0);
    assert!(!session.is_refreshing());
}

#[tokio::test]
async fn non_401_errors_pass_through_without_refresh() {
    let transport = ScriptedTransport::authorized();
    transport.route("GET", "/videos/missing", 404, json!({ "message": "Video not found" }));
    let session = manager(&transport);

    let err = session.execute(ApiRequest::get("/videos/missing")).await.unwrap_err();

    assert_eq!(err, ApiError::Http { status: 404, message: "Video not found".to_owned() });
    assert_eq!(transport.refresh_count(), 0);
}

#[tokio::test]
async fn transport_errors_pass_through_without_refresh() {
    let transport = ScriptedTransport::authorized();
    transport.go_offline();
    let session = manager(&transport);

    let err = session.execute(ApiRequest::get("/videos")).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(transport.refresh_count(), 0);
}

// =========================================================================
// Single request recovery
// =========================================================================

#[tokio::test]
async fn single_401_refreshes_and_retries_once() {
    let transport = ScriptedTransport::unauthorized();
    let session = manager(&transport);

    let body = session.execute(ApiRequest::get("/users/watch-history")).await.unwrap();

    assert_eq!(body, json!({ "path": "/users/watch-history" }));
    assert_eq!(transport.refresh_count(), 1);
    assert_eq!(transport.count_for("/users/watch-history"), 2);
    assert_eq!(
        transport.log(),
        vec!["401 GET /users/watch-history", "refresh ok", "200 GET /users/watch-history"]
    );
}

#[tokio::test]
async fn refresh_endpoint_401_is_never_intercepted() {
    let transport = ScriptedTransport::unauthorized();
    transport.fail_refresh();
    let session = manager(&transport);

    let err = session.execute(ApiRequest::post(REFRESH_TOKEN_PATH)).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(transport.refresh_count(), 1);
    assert!(!session.is_refreshing());
}

#[tokio::test]
async fn second_401_after_refresh_is_final() {
    let transport = ScriptedTransport::unauthorized();
    transport.stay_unauthorized();
    let session = manager(&transport);

    let err = session.execute(ApiRequest::get("/likes/videos")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(transport.refresh_count(), 1);
    assert_eq!(transport.count_for("/likes/videos"), 2);
}

#[tokio::test]
async fn refresh_failure_expires_session_and_signals() {
    let transport = ScriptedTransport::unauthorized();
    transport.fail_refresh();
    let session = manager(&transport);
    let mut expiry = session.subscribe_expiry();

    let err = session.execute(ApiRequest::get("/users/current-user")).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::SessionExpired { reason: "HTTP 401: Invalid refresh token".to_owned() }
    );
    assert!(expiry.has_changed().unwrap());
    assert_eq!(*expiry.borrow_and_update(), 1);
    assert!(!session.is_refreshing());
}

// =========================================================================
// Concurrent callers
// =========================================================================

#[tokio::test]
async fn queued_requests_resolve_after_refresh_in_arrival_order() {
    let transport = ScriptedTransport::unauthorized();
    transport.hold_refresh();
    let session = manager(&transport);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/c")).await }
    });
    wait_until(|| session.is_refreshing()).await;

    let a = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/a")).await }
    });
    wait_until(|| session.pending_waiters() == 1).await;

    let b = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/b")).await }
    });
    wait_until(|| session.pending_waiters() == 2).await;

    tokio::task::yield_now().await;
    assert!(!a.is_finished());
    assert!(!b.is_finished());
    assert!(!leader.is_finished());

    transport.release_refresh();

    assert_eq!(a.await.unwrap().unwrap(), json!({ "path": "/a" }));
    assert_eq!(b.await.unwrap().unwrap(), json!({ "path": "/b" }));
    assert_eq!(leader.await.unwrap().unwrap(), json!({ "path": "/c" }));

    assert_eq!(transport.refresh_count(), 1);
    assert_eq!(
        transport.log(),
        vec!["401 GET /c", "401 GET /a", "401 GET /b", "refresh ok", "200 GET /a", "200 GET /b", "200 GET /c"]
    );
    assert_eq!(session.pending_waiters(), 0);
    assert!(!session.is_refreshing());
}

#[tokio::test]
async fn refresh_failure_rejects_every_waiter() {
    let transport = ScriptedTransport::unauthorized();
    transport.hold_refresh();
    transport.fail_refresh();
    let session = manager(&transport);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/users/subscriptions")).await }
    });
    wait_until(|| session.is_refreshing()).await;

    let waiters: Vec<_> = ["/videos/my-videos", "/likes/videos"]
        .into_iter()
        .map(|path| {
            let session = session.clone();
            tokio::spawn(async move { session.execute(ApiRequest::get(path)).await })
        })
        .collect();
    wait_until(|| session.pending_waiters() == 2).await;

    transport.release_refresh();

    let expected = ApiError::SessionExpired { reason: "HTTP 401: Invalid refresh token".to_owned() };
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap_err(), expected);
    }
    assert_eq!(leader.await.unwrap().unwrap_err(), expected);

    assert_eq!(transport.refresh_count(), 1);
    assert_eq!(transport.count_for("/videos/my-videos"), 1);
    assert_eq!(transport.count_for("/likes/videos"), 1);
}

#[tokio::test]
async fn queued_requests_are_not_retried_twice() {
    let transport = ScriptedTransport::unauthorized();
    transport.hold_refresh();
    transport.stay_unauthorized();
    let session = manager(&transport);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/c")).await }
    });
    wait_until(|| session.is_refreshing()).await;
    let a = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/a")).await }
    });
    wait_until(|| session.pending_waiters() == 1).await;

    transport.release_refresh();

    assert!(a.await.unwrap().unwrap_err().is_unauthorized());
    assert!(leader.await.unwrap().unwrap_err().is_unauthorized());
    assert_eq!(transport.refresh_count(), 1);
    assert_eq!(transport.count_for("/a"), 2);
    assert_eq!(transport.count_for("/c"), 2);
}

#[tokio::test]
async fn dropped_leader_cancels_waiters_and_resets_state() {
    let transport = ScriptedTransport::unauthorized();
    transport.hold_refresh();
    let session = manager(&transport);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/c")).await }
    });
    wait_until(|| session.is_refreshing()).await;
    let a = tokio::spawn({
        let session = session.clone();
        async move { session.execute(ApiRequest::get("/a")).await }
    });
    wait_until(|| session.pending_waiters() == 1).await;

    leader.abort();

    assert_eq!(a.await.unwrap().unwrap_err(), ApiError::Cancelled);
    assert!(!session.is_refreshing());
    assert_eq!(session.pending_waiters(), 0);
}

#[tokio::test]
async fn later_401_starts_a_fresh_refresh_cycle() {
    let transport = ScriptedTransport::unauthorized();
    let session = manager(&transport);

    session.execute(ApiRequest::get("/a")).await.unwrap();
    assert_eq!(transport.refresh_count(), 1);

    transport.route("GET", "/b", 401, json!({ "message": "jwt expired" }));
    let err = session.execute(ApiRequest::get("/b")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(transport.refresh_count(), 2);
}
