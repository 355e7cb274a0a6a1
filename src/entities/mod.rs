pub mod customer;
pub mod deal;
pub mod employee;
pub mod payment;
pub mod service_contract;
