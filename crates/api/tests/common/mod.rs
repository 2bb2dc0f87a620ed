#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use servicedesk_api::auth::jwt::{generate_access_token, JwtConfig};
use servicedesk_api::config::ServerConfig;
use servicedesk_api::router::build_app_router;
use servicedesk_api::state::AppState;
use servicedesk_core::notify::Notifier;
use servicedesk_core::priority::Priority;
use servicedesk_core::sla::SlaRule;
use servicedesk_core::store::TicketStore;
use servicedesk_core::testing::{MemoryStore, RecordingNotifier};
use servicedesk_lifecycle::ServiceDesk;
use servicedesk_worker::{JobConfig, JobScheduler};
use tower::ServiceExt;

pub const REQUESTER: i64 = 10;
pub const OTHER_REQUESTER: i64 = 11;
pub const AGENT: i64 = 20;
pub const TEAM_LEAD: i64 = 30;
pub const ADMIN: i64 = 40;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

fn rule(priority: Priority, response: i32, resolution: i32) -> SlaRule {
    SlaRule {
        priority,
        response_time_hours: response,
        resolution_time_hours: resolution,
        escalation_threshold_percent: 80,
        is_active: true,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: ServerConfig,
}

/// The full application over an in-memory store seeded with the default
/// SLA catalog. Job loops are not spawned; manual runs still work.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::with_rules([
        rule(Priority::P1, 1, 4),
        rule(Priority::P2, 4, 8),
        rule(Priority::P3, 8, 24),
        rule(Priority::P4, 24, 72),
    ]));
    let notifier = Arc::new(RecordingNotifier::new());

    let job_config = JobConfig::default();
    let dyn_store: Arc<dyn TicketStore> = Arc::clone(&store) as Arc<dyn TicketStore>;
    let desk = ServiceDesk::new(
        Arc::clone(&dyn_store),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        job_config.settings(),
    );
    let scheduler = Arc::new(JobScheduler::new(desk.clone(), job_config));

    let state = AppState {
        store: dyn_store,
        desk,
        scheduler,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        notifier,
        config,
    }
}

impl TestApp {
    pub fn token(&self, user_id: i64, role: &str) -> String {
        generate_access_token(user_id, role, &self.config.jwt).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response<Body> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Response<Body> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// Create a ticket as `REQUESTER` and return its id.
    pub async fn create_ticket(&self, priority: &str) -> i64 {
        let token = self.token(REQUESTER, "requester");
        let response = self
            .post(
                "/api/v1/tickets",
                &token,
                serde_json::json!({
                    "title": "Laptop will not boot",
                    "description": "Stuck on the vendor logo",
                    "priority": priority,
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        body_json(response).await["data"]["id"].as_i64().unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
