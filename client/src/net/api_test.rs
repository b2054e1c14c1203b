use super::*;
use crate::net::test_helpers::{ScriptedTransport, comment_json, user_json, video_json};
use crate::net::transport::RequestBody;
use reqwest::Method;

fn client(transport: &Arc<ScriptedTransport>) -> ApiClient {
    ApiClient::with_transport(transport.clone())
}

fn query_of(request: &ApiRequest) -> Vec<(&str, &str)> {
    request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn part_names(request: &ApiRequest) -> Vec<String> {
    match &request.body {
        RequestBody::Multipart(parts) => parts
            .iter()
            .map(|p| match p {
                FormPart::Text { name, .. } | FormPart::File { name, .. } => name.clone(),
            })
            .collect(),
        other => panic!("expected multipart body, got {other:?}"),
    }
}

// =============================================================
// Endpoint paths
// =============================================================

#[test]
fn endpoint_paths_format_ids() {
    assert_eq!(channel_profile_endpoint("alice"), "/users/getChannelInfo/alice");
    assert_eq!(reset_password_endpoint("tok"), "/users/reset-password/tok");
    assert_eq!(video_endpoint("v1"), "/videos/v1");
    assert_eq!(owner_videos_endpoint("alice"), "/videos/owner/alice");
    assert_eq!(video_reaction_endpoint("v1", "dislike"), "/videos/v1/dislike");
    assert_eq!(video_comments_endpoint("v1"), "/videos/v1/comments");
    assert_eq!(comment_like_endpoint("c1"), "/comments/c1/like");
    assert_eq!(subscribe_endpoint("u1"), "/users/subscribe/u1");
    assert_eq!(unsubscribe_endpoint("u1"), "/unsubscribe/u1");
}

#[test]
fn endpoint_paths_escape_reserved_characters() {
    assert_eq!(video_endpoint("abc?x=1"), "/videos/abc%3Fx%3D1");
    assert_eq!(reset_password_endpoint("a/b#c"), "/users/reset-password/a%2Fb%23c");
    assert_eq!(channel_profile_endpoint("al ice"), "/users/getChannelInfo/al%20ice");
    assert_eq!(video_comments_endpoint(".."), "/videos/%2E%2E/comments");
    assert_eq!(subscribe_endpoint("."), "/users/subscribe/%2E");
}

#[tokio::test]
async fn ids_with_reserved_characters_stay_in_one_segment() {
    let transport = ScriptedTransport::authorized();

    client(&transport).video("abc?x=1#frag").await.unwrap_err();

    let request = transport.last_request().unwrap();
    assert_eq!(request.path, "/videos/abc%3Fx%3D1%23frag");
    assert!(request.query.is_empty());
}

#[test]
fn video_query_defaults_to_first_page_of_ten() {
    let query = VideoQuery::default();
    assert_eq!(query.page, 1);
    assert_eq!(query.limit, 10);
    assert!(query.search.is_none());
}

// =============================================================
// Auth
// =============================================================

#[tokio::test]
async fn login_posts_credentials_and_reads_nested_user() {
    let transport = ScriptedTransport::authorized();
    transport.route(
        "POST",
        "/users/login",
        200,
        json!({ "statusCode": 200, "data": { "user": user_json("u1", "alice"), "accessToken": "at" } }),
    );

    let data = client(&transport).login("alice@example.com", "pw").await.unwrap();

    assert_eq!(data.user.username, "alice");
    let request = transport.last_request().unwrap();
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.body,
        RequestBody::Json(json!({ "email": "alice@example.com", "password": "pw" }))
    );
}

#[tokio::test]
async fn failed_login_never_triggers_refresh() {
    let transport = ScriptedTransport::unauthorized();

    let err = client(&transport).login("a@x", "wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(transport.refresh_count(), 0);
}

#[tokio::test]
async fn register_sends_multipart_with_optional_images() {
    let transport = ScriptedTransport::authorized();
    transport.route("POST", "/users/register", 201, json!({ "message": "User registered" }));
    let form = RegisterForm {
        fullname: "Alice A".to_owned(),
        username: "alice".to_owned(),
        email: "alice@example.com".to_owned(),
        password: "pw".to_owned(),
        avatar: Some(FileUpload::new("me.png", vec![1])),
        cover_image: None,
    };

    let envelope = client(&transport).register(&form).await.unwrap();

    assert_eq!(envelope.message.as_deref(), Some("User registered"));
    let request = transport.last_request().unwrap();
    assert_eq!(part_names(&request), ["fullname", "username", "email", "password", "avatar"]);
}

#[tokio::test]
async fn reset_password_posts_new_password_to_token_path() {
    let transport = ScriptedTransport::authorized();

    client(&transport).reset_password("abc", "n3w").await.unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(request.path, "/users/reset-password/abc");
    assert_eq!(request.body, RequestBody::Json(json!({ "newPassword": "n3w" })));
}

// =============================================================
// Videos
// =============================================================

#[tokio::test]
async fn videos_sends_paging_search_and_sort() {
    let transport = ScriptedTransport::authorized();
    transport.route("GET", "/videos", 200, json!({ "videos": [video_json("v1"), video_json("v2")] }));
    let query = VideoQuery {
        sort_by: Some("views".to_owned()),
        sort_order: Some(SortOrder::Desc),
        ..VideoQuery::page(2, 12).search("rust talks")
    };

    let videos = client(&transport).videos(&query).await.unwrap();

    assert_eq!(videos.len(), 2);
    let request = transport.last_request().unwrap();
    assert_eq!(
        query_of(&request),
        [("page", "2"), ("limit", "12"), ("search", "rust talks"), ("sortBy", "views"), ("sortOrder", "desc")]
    );
}

#[tokio::test]
async fn videos_omits_blank_search() {
    let transport = ScriptedTransport::authorized();

    let videos = client(&transport).videos(&VideoQuery::default().search("")).await.unwrap();

    assert!(videos.is_empty());
    assert_eq!(query_of(&transport.last_request().unwrap()), [("page", "1"), ("limit", "10")]);
}

#[tokio::test]
async fn video_reads_payload_from_data() {
    let transport = ScriptedTransport::authorized();
    transport.route("GET", "/videos/v9", 200, json!({ "data": video_json("v9") }));

    let video = client(&transport).video("v9").await.unwrap();

    assert_eq!(video.id, "v9");
    assert_eq!(video.owner.username, "owner");
}

#[tokio::test]
async fn upload_video_sends_every_field() {
    let transport = ScriptedTransport::authorized();
    let form = UploadForm {
        title: "Intro".to_owned(),
        description: "First".to_owned(),
        video_file: FileUpload::new("clip.mp4", vec![0; 4]),
        thumbnail: FileUpload::new("thumb.png", vec![1]),
        duration: 12.5,
    };

    client(&transport).upload_video(&form).await.unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(request.path, "/videos/uploadVideo");
    assert_eq!(part_names(&request), ["title", "description", "videoFile", "thumbnail", "duration"]);
    let RequestBody::Multipart(parts) = &request.body else { unreachable!() };
    assert!(parts.contains(&FormPart::Text { name: "duration".to_owned(), value: "12.5".to_owned() }));
}

#[tokio::test]
async fn like_and_dislike_hit_reaction_paths() {
    let transport = ScriptedTransport::authorized();
    let api = client(&transport);

    api.like_video("v1").await.unwrap();
    api.dislike_video("v1").await.unwrap();

    let paths: Vec<_> = transport.requests().into_iter().map(|r| r.label()).collect();
    assert_eq!(paths, ["POST /videos/v1/like", "POST /videos/v1/dislike"]);
}

// =============================================================
// Comments, subscriptions, history
// =============================================================

#[tokio::test]
async fn add_comment_returns_created_comment() {
    let transport = ScriptedTransport::authorized();
    transport.route("POST", "/videos/v1/comments", 201, json!({ "data": { "comment": comment_json("c7") } }));

    let comment = client(&transport).add_comment("v1", "nice").await.unwrap();

    assert_eq!(comment.id, "c7");
    assert_eq!(transport.last_request().unwrap().body, RequestBody::Json(json!({ "content": "nice" })));
}

#[tokio::test]
async fn unsubscribe_uses_delete_on_top_level_path() {
    let transport = ScriptedTransport::authorized();

    client(&transport).unsubscribe("u2").await.unwrap();

    assert_eq!(transport.last_request().unwrap().label(), "DELETE /unsubscribe/u2");
}

#[tokio::test]
async fn subscribed_channels_read_nested_list() {
    let transport = ScriptedTransport::authorized();
    let mut channel = user_json("u2", "bob");
    channel["subscribedAt"] = json!("2024-03-01T00:00:00Z");
    transport.route("GET", "/users/subscriptions", 200, json!({ "data": { "channels": [channel] } }));

    let channels = client(&transport).subscribed_channels().await.unwrap();

    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].channel.username, "bob");
    assert_eq!(channels[0].subscribed_at, "2024-03-01T00:00:00Z");
}

#[tokio::test]
async fn watch_history_round_trip() {
    let transport = ScriptedTransport::authorized();
    let entry = json!({ "_id": "h1", "video": video_json("v1"), "watchedAt": "2024-01-01T00:00:00Z", "watchTime": 42.0, "completed": false });
    transport.route("GET", "/users/watch-history", 200, json!({ "data": { "history": [entry] } }));
    let api = client(&transport);

    let history = api.watch_history(1, DEFAULT_HISTORY_PAGE_SIZE).await.unwrap();
    api.add_to_watch_history("v1", 30.0).await.unwrap();
    api.clear_watch_history().await.unwrap();

    assert_eq!(history[0].video.id, "v1");
    let requests = transport.requests();
    assert_eq!(query_of(&requests[0]), [("page", "1"), ("limit", "20")]);
    assert_eq!(requests[1].body, RequestBody::Json(json!({ "videoId": "v1", "watchTime": 30.0 })));
    assert_eq!(requests[2].label(), "DELETE /users/watch-history");
}

#[tokio::test]
async fn authenticated_calls_recover_through_refresh() {
    let transport = ScriptedTransport::unauthorized();
    transport.route("GET", "/users/current-user", 200, json!({ "data": user_json("u1", "alice") }));

    let user = client(&transport).current_user().await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(transport.refresh_count(), 1);
}

#[tokio::test]
async fn backend_error_message_surfaces() {
    let transport = ScriptedTransport::authorized();
    transport.route("POST", "/users/change-password", 400, json!({ "message": "Invalid old password" }));

    let err = client(&transport).change_password("bad", "new").await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP 400: Invalid old password");
}
