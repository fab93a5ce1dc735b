use std::io::Write;
use std::sync::Arc;

use forum_graphcache::application::client::{Client, ClientConfig, DEFAULT_ENDPOINT, ResultSource};
use forum_graphcache::application::guard::RecordingNavigator;
use forum_graphcache::application::transport::ScriptedTransport;
use forum_graphcache::infra::replay::{load_session, replay};
use serde_json::json;

fn session_json() -> serde_json::Value {
    let post = |id: i64| {
        json!({
            "__typename": "Post",
            "id": id,
            "createdAt": "1",
            "updatedAt": "1",
            "title": "title",
            "textSnippet": "snippet",
            "points": 3,
            "voteStatus": null,
            "creator": { "__typename": "User", "id": 1, "username": "ann" }
        })
    };

    json!({
        "context": { "kind": "server", "cookie": "qid=abc" },
        "steps": [
            {
                "operation": { "op": "posts", "limit": 2 },
                "responses": [{ "data": { "posts": {
                    "__typename": "PaginatedPosts",
                    "hasMore": false,
                    "posts": [post(1), post(2)]
                } } }]
            },
            {
                "operation": { "op": "vote", "post_id": 2, "value": 1 },
                "responses": [{ "data": { "vote": true } }],
                "refetch": true
            },
            {
                "operation": { "op": "posts", "limit": 2 },
                "responses": [{ "data": null, "error": { "message": "unused" } }]
            },
            {
                "operation": { "op": "me" },
                "responses": [{ "error": { "message": "[GraphQL] not authenticated" } }]
            }
        ]
    })
}

#[tokio::test]
async fn replays_recorded_session() {
    let mut file = tempfile::NamedTempFile::new().expect("temp session");
    write!(file, "{}", session_json()).expect("write session");

    let session = load_session(file.path()).await.expect("session");
    let transport = Arc::new(ScriptedTransport::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let client = Client::new(
        ClientConfig::new(DEFAULT_ENDPOINT).expect("endpoint"),
        session.context.clone(),
        transport.clone(),
        navigator.clone(),
    );

    let reports = replay(&client, &transport, &session).await;
    assert_eq!(reports.len(), 4);

    assert_eq!(reports[0].source, ResultSource::Network);

    assert_eq!(reports[1].stale, ["Posts"]);
    assert_eq!(reports[1].refetched.len(), 1);
    assert_eq!(reports[1].refetched[0].source, ResultSource::Cache);

    assert_eq!(reports[2].source, ResultSource::Cache);
    assert_eq!(reports[2].unused_responses, 1);
    let data = reports[2].data.as_ref().expect("cached list");
    assert_eq!(data["posts"]["posts"][1]["points"], 4);

    assert_eq!(navigator.routes(), ["/login"]);
    assert!(
        transport
            .requests()
            .iter()
            .all(|request| request.fetch.header("cookie") == Some("qid=abc"))
    );
}

#[tokio::test]
async fn malformed_session_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp session");
    write!(file, "{{ \"steps\": [{{ \"operation\": {{ \"op\": \"teleport\" }} }}] }}")
        .expect("write session");

    assert!(load_session(file.path()).await.is_err());
}
