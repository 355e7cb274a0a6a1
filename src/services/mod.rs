pub mod contracts;
pub mod customers;
pub mod deal_number;
pub mod deals;
pub mod employees;
pub mod ledger_queries;
pub mod payments;
