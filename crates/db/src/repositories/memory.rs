//! In-memory implementations of the core collaborator traits. Used by
//! tests and demos that want the full service wiring without SQLite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use dentabill_core::{
    ClientBalance, ClientBalanceSource, ClientId, NewPriceOverride, NewPriceSnapshot,
    OverrideStore, PaymentLedgerSource, PriceOverride, PriceSnapshot, PricingError, PricingRule,
    PricingRuleSource, RuleQuery, SnapshotId, SnapshotInsert, SnapshotStore, WorkId,
    WorkIdentitySource, WorkPricingIdentity,
};

#[derive(Default)]
pub struct InMemoryWorkStore {
    identities: RwLock<HashMap<String, WorkPricingIdentity>>,
}

impl InMemoryWorkStore {
    pub async fn insert(&self, identity: WorkPricingIdentity) {
        let mut identities = self.identities.write().await;
        identities.insert(identity.work_id.0.clone(), identity);
    }
}

#[async_trait]
impl WorkIdentitySource for InMemoryWorkStore {
    async fn find_pricing_identity(
        &self,
        work_id: &WorkId,
    ) -> Result<WorkPricingIdentity, PricingError> {
        let identities = self.identities.read().await;
        identities.get(&work_id.0).cloned().ok_or_else(|| {
            PricingError::AmbiguousOrMissingWork { work_id: work_id.clone(), found: 0 }
        })
    }
}

#[derive(Default)]
pub struct InMemoryRuleSource {
    rules: RwLock<Vec<PricingRule>>,
}

impl InMemoryRuleSource {
    pub async fn insert(&self, rule: PricingRule) {
        let mut rules = self.rules.write().await;
        rules.push(rule);
    }

    fn eligible(rule: &PricingRule, query: &RuleQuery) -> bool {
        fn wildcard_or_equal(rule: &Option<String>, wanted: &Option<String>) -> bool {
            match rule {
                None => true,
                Some(value) => wanted.as_deref() == Some(value.as_str()),
            }
        }

        rule.work_family == query.work_family
            && rule.work_type == query.work_type
            && rule.price_group == query.price_group
            && rule.valid_from <= query.pricing_date
            && wildcard_or_equal(&rule.constitution, &query.constitution)
            && wildcard_or_equal(&rule.building_technique, &query.building_technique)
            && wildcard_or_equal(&rule.core_material_id, &query.core_material_id)
    }
}

#[async_trait]
impl PricingRuleSource for InMemoryRuleSource {
    async fn find_candidate_rules(
        &self,
        query: &RuleQuery,
    ) -> Result<Vec<PricingRule>, PricingError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().filter(|rule| Self::eligible(rule, query)).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, PriceSnapshot>>,
    next_id: AtomicU64,
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn find_by_work(
        &self,
        work_id: &WorkId,
    ) -> Result<Option<PriceSnapshot>, PricingError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&work_id.0).cloned())
    }

    async fn insert_if_absent(
        &self,
        snapshot: NewPriceSnapshot,
    ) -> Result<SnapshotInsert, PricingError> {
        let mut snapshots = self.snapshots.write().await;
        if snapshots.contains_key(&snapshot.work_id.0) {
            return Ok(SnapshotInsert::Conflict);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = PriceSnapshot {
            id: SnapshotId(format!("snap-mem-{id}")),
            work_id: snapshot.work_id.clone(),
            price: snapshot.price,
            currency: snapshot.currency,
            price_group: snapshot.price_group,
            created_at: Utc::now(),
        };
        snapshots.insert(snapshot.work_id.0, stored.clone());
        Ok(SnapshotInsert::Inserted(stored))
    }
}

#[derive(Default)]
pub struct InMemoryOverrideStore {
    overrides: RwLock<Vec<PriceOverride>>,
    next_id: AtomicU64,
}

#[async_trait]
impl OverrideStore for InMemoryOverrideStore {
    async fn append(&self, entry: NewPriceOverride) -> Result<PriceOverride, PricingError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = PriceOverride {
            id: format!("ovr-mem-{id}"),
            snapshot_id: entry.snapshot_id,
            adjustment: entry.adjustment,
            reason: entry.reason,
            created_by: entry.created_by,
            created_at: Utc::now(),
        };
        let mut overrides = self.overrides.write().await;
        overrides.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_snapshot(
        &self,
        snapshot_id: &SnapshotId,
    ) -> Result<Vec<PriceOverride>, PricingError> {
        let overrides = self.overrides.read().await;
        Ok(overrides.iter().filter(|o| &o.snapshot_id == snapshot_id).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryPaymentLedger {
    cash: RwLock<HashMap<String, Decimal>>,
    balance: RwLock<HashMap<String, Decimal>>,
}

impl InMemoryPaymentLedger {
    pub async fn record_cash(&self, work_id: &WorkId, amount: Decimal) {
        let mut cash = self.cash.write().await;
        *cash.entry(work_id.0.clone()).or_default() += amount;
    }

    pub async fn record_balance(&self, work_id: &WorkId, amount: Decimal) {
        let mut balance = self.balance.write().await;
        *balance.entry(work_id.0.clone()).or_default() += amount.abs();
    }
}

#[async_trait]
impl PaymentLedgerSource for InMemoryPaymentLedger {
    async fn cash_paid_amounts(
        &self,
        work_ids: &[WorkId],
    ) -> Result<HashMap<WorkId, Decimal>, PricingError> {
        let cash = self.cash.read().await;
        Ok(work_ids
            .iter()
            .filter_map(|id| cash.get(&id.0).map(|amount| (id.clone(), *amount)))
            .collect())
    }

    async fn balance_paid_amounts(
        &self,
        work_ids: &[WorkId],
    ) -> Result<HashMap<WorkId, Decimal>, PricingError> {
        let balance = self.balance.read().await;
        Ok(work_ids
            .iter()
            .filter_map(|id| balance.get(&id.0).map(|amount| (id.clone(), *amount)))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryClientBalances {
    clients: RwLock<HashMap<String, ClientBalance>>,
}

impl InMemoryClientBalances {
    pub async fn insert(&self, client_id: &ClientId, account: ClientBalance) {
        let mut clients = self.clients.write().await;
        clients.insert(client_id.0.clone(), account);
    }
}

#[async_trait]
impl ClientBalanceSource for InMemoryClientBalances {
    async fn client_balance(&self, client_id: &ClientId) -> Result<ClientBalance, PricingError> {
        let clients = self.clients.read().await;
        clients
            .get(&client_id.0)
            .cloned()
            .ok_or_else(|| PricingError::Storage(format!("client {client_id} not found")))
    }
}
