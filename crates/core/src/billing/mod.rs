pub mod allocation;
pub mod service;

pub use allocation::{allocate, AllocationOutcome};
pub use service::BillingService;
