use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use dealdesk_api::{
    api_v1_routes,
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database. One connection keeps the in-memory schema alive for the
/// lifetime of the test.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/", get(|| async { "dealdesk-api up" }))
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Issue a request against the in-process router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Seed a customer through the API and return its id.
    pub async fn seed_customer(&self, company_id: i64, name: &str) -> Uuid {
        let response = self
            .request(
                Method::POST,
                &format!("/api/v1/{company_id}/customers"),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "seed customer");
        let body = response_json(response).await;
        parse_uuid(&body["data"]["id"])
    }

    /// Seed an employee through the API and return its id.
    pub async fn seed_employee(&self, company_id: i64, name: &str, email: &str) -> Uuid {
        let response = self
            .request(
                Method::POST,
                &format!("/api/v1/{company_id}/employees"),
                Some(json!({ "name": name, "email": email })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "seed employee");
        let body = response_json(response).await;
        parse_uuid(&body["data"]["id"])
    }

    /// Seed a deal through the API and return (deal id, balance).
    pub async fn seed_deal(
        &self,
        company_id: i64,
        customer_id: Uuid,
        deal_value: &str,
        approval: &str,
        advance: &str,
    ) -> (Uuid, Decimal) {
        let response = self
            .request(
                Method::POST,
                &format!("/api/v1/{company_id}/deals"),
                Some(json!({
                    "customer_id": customer_id,
                    "requirement": "seeded deal",
                    "deal_value": deal_value,
                    "deal_approval_value": approval,
                    "advance_payment": advance,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "seed deal");
        let body = response_json(response).await;
        let id = parse_uuid(&body["data"]["id"]);
        let balance = parse_decimal(&body["data"]["balance_amount"]);
        (id, balance)
    }

    /// Fetch a deal's current state from the listing endpoint.
    pub async fn fetch_deal(&self, company_id: i64, deal_id: Uuid) -> Value {
        let response = self
            .request(
                Method::GET,
                &format!("/api/v1/{company_id}/deals?per_page=100"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "fetch deals page");
        let body = response_json(response).await;
        body["data"]["data"]
            .as_array()
            .expect("deal page array")
            .iter()
            .find(|d| d["id"] == json!(deal_id))
            .cloned()
            .unwrap_or_else(|| panic!("deal {deal_id} not present in listing"))
    }
}

/// Decode a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn parse_uuid(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("expected uuid, got {value}"))
}

pub fn parse_decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse::<Decimal>().ok())
        .or_else(|| value.as_f64().and_then(Decimal::from_f64_retain))
        .unwrap_or_else(|| panic!("expected decimal, got {value}"))
}
