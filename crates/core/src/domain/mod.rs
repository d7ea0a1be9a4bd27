pub mod payment;
pub mod rule;
pub mod snapshot;
pub mod work;
