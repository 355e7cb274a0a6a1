use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: String,
    pub database: HealthStatus,
}

/// Liveness: process is up.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Readiness: process is up and the database answers a ping.
async fn ready(State(db): State<Arc<DatabaseConnection>>) -> impl IntoResponse {
    let database = match db.ping().await {
        Ok(()) => HealthStatus::Up,
        Err(e) => {
            error!(error = %e, "Database ping failed in readiness check");
            HealthStatus::Down
        }
    };

    let status_code = if database == HealthStatus::Up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let info = HealthInfo {
        status: if database == HealthStatus::Up {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        database,
    };

    (status_code, Json(info))
}

/// Health routes with their own database state.
pub fn health_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .with_state(db)
}
