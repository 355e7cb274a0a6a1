//! DealDesk API Library
//!
//! This crate provides the core functionality for the DealDesk CRM API:
//! the deal/payment ledger, customer and employee directories, and AMS
//! service contracts, all scoped per tenant.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: None,
        }
    }
}

/// The versioned API surface: every resource nested under its tenant segment.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/:company_id/deals", handlers::deals::deal_routes())
        .nest(
            "/:company_id/customers",
            handlers::customers::customer_routes(),
        )
        .nest(
            "/:company_id/employees",
            handlers::employees::employee_routes(),
        )
        .nest(
            "/:company_id/contracts",
            handlers::contracts::contract_routes(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data() {
        let response = ApiResponse::success(7);
        assert!(response.success);
        assert_eq!(response.data, Some(7));
        assert!(response.message.is_none());
    }

    #[test]
    fn message_envelope_serializes_without_data_field() {
        let response: ApiResponse<()> = ApiResponse::message("Deal deleted");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Deal deleted");
        assert!(json.get("data").is_none());
    }
}
