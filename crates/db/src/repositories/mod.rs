use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use dentabill_core::PricingError;

pub mod memory;
pub mod payment;
pub mod price_override;
pub mod price_snapshot;
pub mod pricing_rule;
pub mod work_identity;

pub use memory::{
    InMemoryClientBalances, InMemoryOverrideStore, InMemoryPaymentLedger, InMemoryRuleSource,
    InMemorySnapshotStore, InMemoryWorkStore,
};
pub use payment::{SqlClientBalanceRepository, SqlPaymentLedgerRepository};
pub use price_override::SqlPriceOverrideRepository;
pub use price_snapshot::SqlPriceSnapshotRepository;
pub use pricing_rule::SqlPricingRuleRepository;
pub use work_identity::SqlWorkIdentityRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for PricingError {
    fn from(value: RepositoryError) -> Self {
        PricingError::Storage(value.to_string())
    }
}

/// Parse a TEXT column holding an exact decimal string.
pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|error| RepositoryError::Decode(format!("invalid decimal for {field}: {error}")))
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp for {field}: {error}")))
}
