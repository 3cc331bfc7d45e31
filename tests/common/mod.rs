use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use stockbook_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    services::InventoryService,
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Test harness backed by an in-memory SQLite database.
///
/// The pool is pinned to a single connection so every task sees the same
/// memory database and transactions serialize at the pool.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");
        let db_arc: Arc<DatabaseConnection> = Arc::new(pool);

        let (tx, rx) = mpsc::channel(100);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let inventory_service = InventoryService::new(db_arc.clone(), event_sender.clone());

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            inventory_service,
        };

        Self {
            router: stockbook_api::app(state.clone()),
            state,
            _event_task: event_task,
        }
    }

    #[allow(dead_code)]
    pub fn inventory(&self) -> &InventoryService {
        &self.state.inventory_service
    }

    /// Fire one request at the router and decode the JSON response body.
    #[allow(dead_code)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request build"),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request build"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router oneshot");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, json)
    }
}
