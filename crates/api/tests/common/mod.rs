#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use reelworks_api::auth::jwt::{generate_access_token, JwtConfig};
use reelworks_api::config::{LogFormat, ServerConfig};
use reelworks_api::router::build_app_router;
use reelworks_api::state::AppState;
use reelworks_core::notifications::RecordingSink;
use reelworks_core::project::Package;
use reelworks_core::roles::{Actor, Identity, Role};
use reelworks_core::types::DbId;
use reelworks_core::{MemoryStore, Workflow, WorkflowConfig};

pub const JWT_SECRET: &str = "test-secret";
pub const PACKAGE_ID: DbId = 1;
pub const ADMIN_ID: DbId = 1;
pub const CLIENT_ID: DbId = 10;
pub const OTHER_CLIENT_ID: DbId = 11;
pub const EDITOR_ID: DbId = 20;

/// A test `ServerConfig`. The database URL is never dialled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: String::new(),
        jwt: JwtConfig::new(JWT_SECRET),
        lock_wait: Duration::from_millis(200),
        workflow: WorkflowConfig {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1),
        },
        log_format: LogFormat::Pretty,
    }
}

pub struct TestApp {
    pub app: Router,
    pub sink: Arc<RecordingSink>,
}

/// Build the full application over a seeded in-memory store.
pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new(config.lock_wait));
    store
        .add_package(Package {
            id: PACKAGE_ID,
            name: "Starter".to_string(),
            price: 1500,
            delivery_days: 3,
            revision_count: 2,
            is_active: true,
        })
        .await;
    for (id, name, role) in [
        (ADMIN_ID, "Amina", Role::Admin),
        (CLIENT_ID, "Acme Ltd", Role::Client),
        (OTHER_CLIENT_ID, "Globex", Role::Client),
        (EDITOR_ID, "Otieno", Role::Editor),
    ] {
        store
            .add_identity(Identity {
                id,
                display_name: name.to_string(),
                role,
                is_active: true,
            })
            .await;
    }

    let sink = Arc::new(RecordingSink::new());
    let state = AppState {
        workflow: Workflow::new(store, sink.clone(), config.workflow),
        config: Arc::new(config),
    };
    TestApp {
        app: build_app_router(state).unwrap(),
        sink,
    }
}

pub fn token_for(actor: Actor) -> String {
    generate_access_token(&actor, &JwtConfig::new(JWT_SECRET)).unwrap()
}

pub fn client_token() -> String {
    token_for(Actor::client(CLIENT_ID))
}

pub fn admin_token() -> String {
    token_for(Actor::admin(ADMIN_ID))
}

pub fn editor_token() -> String {
    token_for(Actor::editor(EDITOR_ID))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a project as the default client and return its id.
pub async fn create_project(app: &Router) -> DbId {
    let response = post_json(
        app,
        "/api/v1/projects",
        &client_token(),
        serde_json::json!({
            "package_id": PACKAGE_ID,
            "title": "Launch teaser",
            "description": "Thirty second product teaser",
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
