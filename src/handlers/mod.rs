pub mod common;
pub mod contracts;
pub mod customers;
pub mod deals;
pub mod employees;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub deals: Arc<crate::services::deals::DealService>,
    pub payments: Arc<crate::services::payments::PaymentService>,
    pub ledger_queries: Arc<crate::services::ledger_queries::LedgerQueryService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub employees: Arc<crate::services::employees::EmployeeService>,
    pub contracts: Arc<crate::services::contracts::ContractService>,
}

impl AppServices {
    /// Build the services container shared by the HTTP handlers.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let deals = Arc::new(crate::services::deals::DealService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let payments = Arc::new(crate::services::payments::PaymentService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let ledger_queries = Arc::new(crate::services::ledger_queries::LedgerQueryService::new(
            db_pool.clone(),
        ));
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let employees = Arc::new(crate::services::employees::EmployeeService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let contracts = Arc::new(crate::services::contracts::ContractService::new(
            db_pool,
            Some(event_sender),
        ));

        Self {
            deals,
            payments,
            ledger_queries,
            customers,
            employees,
            contracts,
        }
    }
}
