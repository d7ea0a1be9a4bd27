use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::work::{WorkFamily, WorkType};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wildcard/temporal pricing rule. Optional attributes match any identity
/// value when absent. Exactly one of `base_price` / `price_per_unit` must be
/// usable; a rule with neither is rejected at calculation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: RuleId,
    pub work_family: WorkFamily,
    pub work_type: WorkType,
    pub price_group: String,
    pub constitution: Option<String>,
    pub building_technique: Option<String>,
    pub core_material_id: Option<String>,
    pub base_price: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub currency: String,
    pub valid_from: NaiveDate,
}

impl PricingRule {
    /// Count of non-wildcard optional attributes. Higher wins rule
    /// selection before the recency tie-break.
    pub fn specificity(&self) -> u32 {
        u32::from(self.constitution.is_some())
            + u32::from(self.building_technique.is_some())
            + u32::from(self.core_material_id.is_some())
    }
}

/// Candidate-rule lookup parameters handed to the rule source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleQuery {
    pub work_family: WorkFamily,
    pub work_type: WorkType,
    pub price_group: String,
    pub constitution: Option<String>,
    pub building_technique: Option<String>,
    pub core_material_id: Option<String>,
    pub pricing_date: NaiveDate,
}
