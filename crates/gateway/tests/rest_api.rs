//! REST surface tests: status mapping for the collaborator boundary.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use parley_gateway::{create_router, GatewayState};
use parley_realtime::DEFAULT_TYPING_IDLE;
use parley_store::{CreateChatRequest, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: GatewayState,
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

impl TestApp {
    fn new() -> Self {
        let state = GatewayState::new(Arc::new(MemoryStore::new()), DEFAULT_TYPING_IDLE);
        let router = create_router(state.clone());
        Self { router, state }
    }

    async fn seed_chat(&self, members: &[&str]) -> String {
        self.state
            .store
            .create_chat(CreateChatRequest {
                name: "general".to_string(),
                is_group: members.len() > 2,
                members: members.iter().map(|m| m.to_string()).collect(),
            })
            .await
            .expect("seed chat")
            .id
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        identity: Option<&str>,
    ) -> TestResponse {
        let app = self.router.clone();
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(identity) = identity {
            builder = builder.header("x-identity", identity);
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let response = app
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, json }
    }
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
}

#[tokio::test]
async fn chat_list_requires_identity() {
    let app = TestApp::new();

    let response = app.request(Method::GET, "/api/chats", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/chats", None, Some("alice"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!([]));
}

#[tokio::test]
async fn create_message_round_trips() {
    let app = TestApp::new();
    let chat = app.seed_chat(&["alice", "bob"]).await;

    let response = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({ "chat_id": chat, "content": "hello" })),
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["sender_id"], "alice");
    assert_eq!(response.json["content"], "hello");
    assert_eq!(response.json["members"], json!(["alice", "bob"]));

    let history = app
        .request(
            Method::GET,
            &format!("/api/chats/{chat}/messages"),
            None,
            Some("bob"),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.json.as_array().map(|a| a.len()), Some(1));
}

#[tokio::test]
async fn empty_message_is_rejected_with_bad_request() {
    let app = TestApp::new();
    let chat = app.seed_chat(&["alice", "bob"]).await;

    let response = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({ "chat_id": chat, "content": "   " })),
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attachment_only_message_is_accepted() {
    let app = TestApp::new();
    let chat = app.seed_chat(&["alice", "bob"]).await;

    let response = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({
                "chat_id": chat,
                "attachment": {
                    "kind": "image",
                    "url": "/uploads/cat.png",
                    "name": "cat.png",
                    "size": 2048
                }
            })),
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["attachment"]["kind"], "image");
}

#[tokio::test]
async fn non_member_cannot_post_or_read() {
    let app = TestApp::new();
    let chat = app.seed_chat(&["alice", "bob"]).await;

    let response = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({ "chat_id": chat, "content": "intruding" })),
            Some("mallory"),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::GET,
            &format!("/api/chats/{chat}/messages"),
            None,
            Some("mallory"),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_chat_maps_to_not_found() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({ "chat_id": "missing", "content": "hello" })),
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_sender_may_edit_or_delete() {
    let app = TestApp::new();
    let chat = app.seed_chat(&["alice", "bob"]).await;

    let created = app
        .request(
            Method::POST,
            "/api/messages",
            Some(json!({ "chat_id": chat, "content": "mine" })),
            Some("alice"),
        )
        .await;
    let message_id = created.json["id"].as_str().expect("message id").to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/messages/{message_id}"),
            Some(json!({ "content": "hijacked" })),
            Some("bob"),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/messages/{message_id}"),
            None,
            Some("bob"),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/messages/{message_id}"),
            Some(json!({ "content": "mine, edited" })),
            Some("alice"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["edited"], true);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/messages/{message_id}"),
            None,
            Some("alice"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    // the removed record keeps its routing data for the relay
    assert_eq!(response.json["members"], json!(["alice", "bob"]));
}
