use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rule::RuleId;
use crate::domain::work::WorkId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub String);

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Advisory pricing preview. Nothing is persisted until the price is fixed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePriceResult {
    pub base_price: Decimal,
    pub currency: String,
    pub price_group: String,
    pub matched_rule_id: Option<RuleId>,
}

/// The fixed work price. Created at most once per work, immutable after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub id: SnapshotId,
    pub work_id: WorkId,
    pub price: Decimal,
    pub currency: String,
    pub price_group: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a snapshot about to be frozen. The store assigns the id and
/// timestamp on the one successful insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceSnapshot {
    pub work_id: WorkId,
    pub price: Decimal,
    pub currency: String,
    pub price_group: String,
}

/// A signed manual adjustment layered on a fixed price. Append-only;
/// corrections are made with counter-entries, never by editing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOverride {
    pub id: String,
    pub snapshot_id: SnapshotId,
    pub adjustment: Decimal,
    pub reason: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for an override about to be recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceOverride {
    pub snapshot_id: SnapshotId,
    pub adjustment: Decimal,
    pub reason: String,
    pub created_by: String,
}

/// Final price exposed to billing: frozen base plus every override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResolution {
    pub snapshot_id: SnapshotId,
    pub base_price: Decimal,
    pub total_overrides: Decimal,
    pub final_price: Decimal,
    pub currency: String,
    pub price_group: String,
    pub overrides: Vec<PriceOverride>,
}
