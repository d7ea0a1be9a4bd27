use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::rule::RuleId;
use crate::domain::work::{WorkFamily, WorkId};

/// Closed set of failure conditions for the pricing and billing core.
/// Every kind is a distinct, recoverable condition the caller matches on;
/// nothing is swallowed or retried internally.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("work family `{family:?}` has no pricing mapping")]
    UnsupportedFamily { family: WorkFamily },
    #[error("expected exactly one pricing identity for work {work_id}, found {found}")]
    AmbiguousOrMissingWork { work_id: WorkId, found: usize },
    #[error("bridge work {work_id} has no constituent teeth")]
    EmptyBridge { work_id: WorkId },
    #[error(
        "no pricing rule matches work {work_id} in price group `{price_group}` as of {pricing_date}"
    )]
    NoPricingRule { work_id: WorkId, price_group: String, pricing_date: NaiveDate },
    #[error("pricing rule {rule_id} defines neither a base price nor a per-unit price")]
    InvalidPricingRule { rule_id: RuleId },
    #[error("work {work_id} already has a fixed price")]
    AlreadyFixed { work_id: WorkId },
    #[error("work {work_id} has no fixed price")]
    NoFixedPrice { work_id: WorkId },
    #[error("payment amount must be positive, got {amount}")]
    InvalidPaymentAmount { amount: Decimal },
    #[error("work {work_id} is listed more than once in the allocation request")]
    DuplicateAllocationTarget { work_id: WorkId },
    #[error("storage failure: {0}")]
    Storage(String),
}
