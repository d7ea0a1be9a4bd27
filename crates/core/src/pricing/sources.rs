//! Read-side collaborator interfaces consumed by the pricing and billing
//! services. Implementations live in `dentabill-db` (SQLite) and in the
//! in-memory test doubles.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::payment::ClientBalance;
use crate::domain::rule::{PricingRule, RuleQuery};
use crate::domain::snapshot::{
    NewPriceOverride, NewPriceSnapshot, PriceOverride, PriceSnapshot, SnapshotId,
};
use crate::domain::work::{ClientId, WorkId, WorkPricingIdentity};
use crate::errors::PricingError;

#[async_trait]
pub trait WorkIdentitySource: Send + Sync {
    /// Resolve the flattened pricing identity of one work. Fails with
    /// `UnsupportedFamily` or `AmbiguousOrMissingWork`; exactly one
    /// subtype record must back a valid work id.
    async fn find_pricing_identity(
        &self,
        work_id: &WorkId,
    ) -> Result<WorkPricingIdentity, PricingError>;
}

#[async_trait]
pub trait PricingRuleSource: Send + Sync {
    /// Load every rule satisfying the eligibility predicate for `query`.
    /// Final selection (specificity, recency) happens in the core matcher.
    async fn find_candidate_rules(
        &self,
        query: &RuleQuery,
    ) -> Result<Vec<PricingRule>, PricingError>;
}

/// Outcome of the atomic insert-if-absent on the snapshot store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotInsert {
    Inserted(PriceSnapshot),
    /// A snapshot for this work already existed; nothing was written.
    Conflict,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn find_by_work(&self, work_id: &WorkId)
        -> Result<Option<PriceSnapshot>, PricingError>;

    /// Persist a new snapshot unless one exists for the work. Must be atomic
    /// with respect to concurrent attempts on the same work id; of two
    /// racing inserts exactly one returns `Inserted`.
    async fn insert_if_absent(
        &self,
        snapshot: NewPriceSnapshot,
    ) -> Result<SnapshotInsert, PricingError>;
}

#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Record a new override. Overrides are append-only; there is no update
    /// or delete, corrections are counter-entries.
    async fn append(&self, entry: NewPriceOverride) -> Result<PriceOverride, PricingError>;

    async fn find_by_snapshot(
        &self,
        snapshot_id: &SnapshotId,
    ) -> Result<Vec<PriceOverride>, PricingError>;
}

#[async_trait]
pub trait PaymentLedgerSource: Send + Sync {
    /// Sum of received cash payments per work. Works without payments are
    /// absent from the map.
    async fn cash_paid_amounts(
        &self,
        work_ids: &[WorkId],
    ) -> Result<HashMap<WorkId, Decimal>, PricingError>;

    /// Sum of absolute client-balance applications per work.
    async fn balance_paid_amounts(
        &self,
        work_ids: &[WorkId],
    ) -> Result<HashMap<WorkId, Decimal>, PricingError>;
}

#[async_trait]
pub trait ClientBalanceSource: Send + Sync {
    async fn client_balance(&self, client_id: &ClientId) -> Result<ClientBalance, PricingError>;
}
