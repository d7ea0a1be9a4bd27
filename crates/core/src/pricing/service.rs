use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rule::RuleQuery;
use crate::domain::snapshot::{BasePriceResult, NewPriceSnapshot, PriceResolution, PriceSnapshot};
use crate::domain::work::WorkId;
use crate::errors::PricingError;
use crate::pricing::sources::{
    OverrideStore, PricingRuleSource, SnapshotInsert, SnapshotStore, WorkIdentitySource,
};
use crate::pricing::{calculator, matcher};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePreviewRequest {
    pub work_id: WorkId,
    pub price_group: String,
    pub pricing_date: NaiveDate,
}

/// Pricing entry points: non-committing preview, write-once fix, and the
/// final-price read path. Collaborators are wired in at construction; the
/// service itself holds no mutable state.
pub struct PricingService {
    identities: Arc<dyn WorkIdentitySource>,
    rules: Arc<dyn PricingRuleSource>,
    snapshots: Arc<dyn SnapshotStore>,
    overrides: Arc<dyn OverrideStore>,
}

impl PricingService {
    pub fn new(
        identities: Arc<dyn WorkIdentitySource>,
        rules: Arc<dyn PricingRuleSource>,
        snapshots: Arc<dyn SnapshotStore>,
        overrides: Arc<dyn OverrideStore>,
    ) -> Self {
        Self { identities, rules, snapshots, overrides }
    }

    /// Resolve identity, select the best matching rule, and compute the base
    /// price. Read-only and idempotent: identical inputs yield identical
    /// results and nothing is persisted.
    pub async fn preview_base_price(
        &self,
        request: &PricePreviewRequest,
    ) -> Result<BasePriceResult, PricingError> {
        let identity = self.identities.find_pricing_identity(&request.work_id).await?;

        let query = RuleQuery {
            work_family: identity.work_family,
            work_type: identity.work_type,
            price_group: request.price_group.clone(),
            constitution: identity.constitution.clone(),
            building_technique: identity.building_technique.clone(),
            core_material_id: identity.core_material_id.clone(),
            pricing_date: request.pricing_date,
        };
        let candidates = self.rules.find_candidate_rules(&query).await?;

        let rule =
            matcher::select_best_rule(&candidates, &identity, &request.price_group, request.pricing_date)
                .ok_or_else(|| PricingError::NoPricingRule {
                    work_id: request.work_id.clone(),
                    price_group: request.price_group.clone(),
                    pricing_date: request.pricing_date,
                })?;

        let amount = calculator::base_price(rule, identity.prosthetic_units)?;

        Ok(BasePriceResult {
            base_price: amount,
            currency: rule.currency.clone(),
            price_group: request.price_group.clone(),
            matched_rule_id: Some(rule.id.clone()),
        })
    }

    /// Freeze a previewed base price. The store's insert-if-absent is the
    /// only existence check; a concurrent or repeated fix surfaces as
    /// `AlreadyFixed` and never overwrites the first snapshot.
    pub async fn fix_base_price(
        &self,
        work_id: &WorkId,
        preview: &BasePriceResult,
    ) -> Result<PriceSnapshot, PricingError> {
        let outcome = self
            .snapshots
            .insert_if_absent(NewPriceSnapshot {
                work_id: work_id.clone(),
                price: preview.base_price,
                currency: preview.currency.clone(),
                price_group: preview.price_group.clone(),
            })
            .await?;

        match outcome {
            SnapshotInsert::Inserted(snapshot) => Ok(snapshot),
            SnapshotInsert::Conflict => {
                Err(PricingError::AlreadyFixed { work_id: work_id.clone() })
            }
        }
    }

    /// Final price = frozen base + sum of all signed overrides. No floor or
    /// ceiling is applied here.
    pub async fn resolve_final_price(
        &self,
        work_id: &WorkId,
    ) -> Result<PriceResolution, PricingError> {
        let snapshot = self
            .snapshots
            .find_by_work(work_id)
            .await?
            .ok_or_else(|| PricingError::NoFixedPrice { work_id: work_id.clone() })?;

        let overrides = self.overrides.find_by_snapshot(&snapshot.id).await?;
        let total_overrides: Decimal = overrides.iter().map(|entry| entry.adjustment).sum();

        Ok(PriceResolution {
            snapshot_id: snapshot.id,
            base_price: snapshot.price,
            total_overrides,
            final_price: snapshot.price + total_overrides,
            currency: snapshot.currency,
            price_group: snapshot.price_group,
            overrides,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    use super::{PricePreviewRequest, PricingService};
    use crate::domain::rule::{PricingRule, RuleId, RuleQuery};
    use crate::domain::snapshot::{
        NewPriceOverride, NewPriceSnapshot, PriceOverride, PriceSnapshot, SnapshotId,
    };
    use crate::domain::work::{
        CrownWork, WorkFamily, WorkId, WorkPricingIdentity, WorkRecord, WorkType,
    };
    use crate::errors::PricingError;
    use crate::pricing::matcher;
    use crate::pricing::sources::{
        OverrideStore, PricingRuleSource, SnapshotInsert, SnapshotStore, WorkIdentitySource,
    };

    struct StubIdentities {
        records: HashMap<String, WorkRecord>,
    }

    #[async_trait]
    impl WorkIdentitySource for StubIdentities {
        async fn find_pricing_identity(
            &self,
            work_id: &WorkId,
        ) -> Result<WorkPricingIdentity, PricingError> {
            self.records
                .get(&work_id.0)
                .map(WorkRecord::pricing_identity)
                .ok_or_else(|| PricingError::AmbiguousOrMissingWork {
                    work_id: work_id.clone(),
                    found: 0,
                })
        }
    }

    struct StubRules {
        rules: Vec<PricingRule>,
    }

    #[async_trait]
    impl PricingRuleSource for StubRules {
        async fn find_candidate_rules(
            &self,
            query: &RuleQuery,
        ) -> Result<Vec<PricingRule>, PricingError> {
            let identity = WorkPricingIdentity {
                work_id: WorkId("unused".to_string()),
                work_family: query.work_family,
                work_type: query.work_type,
                constitution: query.constitution.clone(),
                building_technique: query.building_technique.clone(),
                core_material_id: query.core_material_id.clone(),
                prosthetic_units: 1,
            };
            Ok(self
                .rules
                .iter()
                .filter(|rule| {
                    matcher::is_eligible(rule, &identity, &query.price_group, query.pricing_date)
                })
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct StubSnapshots {
        by_work: RwLock<HashMap<String, PriceSnapshot>>,
    }

    #[async_trait]
    impl SnapshotStore for StubSnapshots {
        async fn find_by_work(
            &self,
            work_id: &WorkId,
        ) -> Result<Option<PriceSnapshot>, PricingError> {
            Ok(self.by_work.read().await.get(&work_id.0).cloned())
        }

        async fn insert_if_absent(
            &self,
            snapshot: NewPriceSnapshot,
        ) -> Result<SnapshotInsert, PricingError> {
            let mut guard = self.by_work.write().await;
            if guard.contains_key(&snapshot.work_id.0) {
                return Ok(SnapshotInsert::Conflict);
            }
            let stored = PriceSnapshot {
                id: SnapshotId(format!("snap-{}", Uuid::new_v4())),
                work_id: snapshot.work_id.clone(),
                price: snapshot.price,
                currency: snapshot.currency,
                price_group: snapshot.price_group,
                created_at: Utc::now(),
            };
            guard.insert(snapshot.work_id.0, stored.clone());
            Ok(SnapshotInsert::Inserted(stored))
        }
    }

    #[derive(Default)]
    struct StubOverrides {
        by_snapshot: RwLock<HashMap<String, Vec<PriceOverride>>>,
    }

    #[async_trait]
    impl OverrideStore for StubOverrides {
        async fn append(&self, entry: NewPriceOverride) -> Result<PriceOverride, PricingError> {
            let stored = PriceOverride {
                id: format!("ovr-{}", Uuid::new_v4()),
                snapshot_id: entry.snapshot_id.clone(),
                adjustment: entry.adjustment,
                reason: entry.reason,
                created_by: entry.created_by,
                created_at: Utc::now(),
            };
            self.by_snapshot
                .write()
                .await
                .entry(entry.snapshot_id.0)
                .or_default()
                .push(stored.clone());
            Ok(stored)
        }

        async fn find_by_snapshot(
            &self,
            snapshot_id: &SnapshotId,
        ) -> Result<Vec<PriceOverride>, PricingError> {
            Ok(self.by_snapshot.read().await.get(&snapshot_id.0).cloned().unwrap_or_default())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn crown_record(work_id: &str) -> WorkRecord {
        WorkRecord::Crown(CrownWork {
            work_id: WorkId(work_id.to_string()),
            work_type: WorkType::Crown,
            constitution: Some("metal_ceramic".to_string()),
            building_technique: None,
            core_material_id: None,
        })
    }

    fn flat_rule(id: &str, amount: Decimal) -> PricingRule {
        PricingRule {
            id: RuleId(id.to_string()),
            work_family: WorkFamily::FixedProsthesis,
            work_type: WorkType::Crown,
            price_group: "standard".to_string(),
            constitution: None,
            building_technique: None,
            core_material_id: None,
            base_price: Some(amount),
            price_per_unit: None,
            currency: "EUR".to_string(),
            valid_from: date(2024, 1, 1),
        }
    }

    fn service(records: Vec<(&str, WorkRecord)>, rules: Vec<PricingRule>) -> PricingService {
        PricingService::new(
            Arc::new(StubIdentities {
                records: records.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            }),
            Arc::new(StubRules { rules }),
            Arc::new(StubSnapshots::default()),
            Arc::new(StubOverrides::default()),
        )
    }

    fn request(work_id: &str) -> PricePreviewRequest {
        PricePreviewRequest {
            work_id: WorkId(work_id.to_string()),
            price_group: "standard".to_string(),
            pricing_date: date(2025, 6, 1),
        }
    }

    #[tokio::test]
    async fn preview_is_idempotent_and_side_effect_free() {
        let svc = service(
            vec![("W-1", crown_record("W-1"))],
            vec![flat_rule("R-1", dec(10_000))],
        );

        let first = svc.preview_base_price(&request("W-1")).await.expect("preview");
        let second = svc.preview_base_price(&request("W-1")).await.expect("preview again");

        assert_eq!(first, second);
        assert_eq!(first.base_price, dec(10_000));
        assert_eq!(first.matched_rule_id, Some(RuleId("R-1".to_string())));
        assert!(svc.snapshots.find_by_work(&WorkId("W-1".to_string())).await.expect("read").is_none());
    }

    #[tokio::test]
    async fn preview_without_eligible_rule_reports_no_pricing_rule() {
        let svc = service(vec![("W-1", crown_record("W-1"))], Vec::new());

        let error = svc.preview_base_price(&request("W-1")).await.expect_err("no rules");
        assert!(matches!(error, PricingError::NoPricingRule { ref work_id, .. } if work_id.0 == "W-1"));
    }

    #[tokio::test]
    async fn second_fix_conflicts_and_first_price_stands() {
        let svc = service(
            vec![("W-1", crown_record("W-1"))],
            vec![flat_rule("R-1", dec(10_000))],
        );
        let work_id = WorkId("W-1".to_string());

        let preview = svc.preview_base_price(&request("W-1")).await.expect("preview");
        let snapshot = svc.fix_base_price(&work_id, &preview).await.expect("first fix");
        assert_eq!(snapshot.price, dec(10_000));

        let mut repriced = preview.clone();
        repriced.base_price = dec(99_900);
        let error = svc.fix_base_price(&work_id, &repriced).await.expect_err("second fix");
        assert_eq!(error, PricingError::AlreadyFixed { work_id: work_id.clone() });

        let stored = svc.snapshots.find_by_work(&work_id).await.expect("read").expect("snapshot");
        assert_eq!(stored.price, dec(10_000));
    }

    #[tokio::test]
    async fn final_price_is_base_plus_signed_overrides() {
        let svc = service(
            vec![("W-1", crown_record("W-1"))],
            vec![flat_rule("R-1", dec(10_000))],
        );
        let work_id = WorkId("W-1".to_string());

        let preview = svc.preview_base_price(&request("W-1")).await.expect("preview");
        let snapshot = svc.fix_base_price(&work_id, &preview).await.expect("fix");

        for (adjustment, reason) in
            [(dec(2_500), "surcharge: rush order"), (dec(-1_000), "loyalty discount")]
        {
            svc.overrides
                .append(NewPriceOverride {
                    snapshot_id: snapshot.id.clone(),
                    adjustment,
                    reason: reason.to_string(),
                    created_by: "billing".to_string(),
                })
                .await
                .expect("append override");
        }

        let resolution = svc.resolve_final_price(&work_id).await.expect("resolve");
        assert_eq!(resolution.base_price, dec(10_000));
        assert_eq!(resolution.total_overrides, dec(1_500));
        assert_eq!(resolution.final_price, dec(11_500));
        assert_eq!(resolution.overrides.len(), 2);
    }

    #[tokio::test]
    async fn resolving_an_unfixed_work_fails() {
        let svc = service(
            vec![("W-1", crown_record("W-1"))],
            vec![flat_rule("R-1", dec(10_000))],
        );

        let error = svc
            .resolve_final_price(&WorkId("W-1".to_string()))
            .await
            .expect_err("not fixed yet");
        assert_eq!(error, PricingError::NoFixedPrice { work_id: WorkId("W-1".to_string()) });
    }

    #[tokio::test]
    async fn missing_work_surfaces_integrity_error() {
        let svc = service(Vec::new(), vec![flat_rule("R-1", dec(10_000))]);

        let error = svc.preview_base_price(&request("W-404")).await.expect_err("unknown work");
        assert_eq!(
            error,
            PricingError::AmbiguousOrMissingWork { work_id: WorkId("W-404".to_string()), found: 0 }
        );
    }
}
