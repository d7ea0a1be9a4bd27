use rust_decimal::Decimal;

use crate::domain::rule::PricingRule;
use crate::errors::PricingError;

/// Turn a matched rule and a unit count into a concrete base amount.
///
/// A flat `base_price` wins verbatim over per-unit math, whatever the unit
/// count; that is how a rule author prices a bundled bridge. Only when no
/// flat price is set does `price_per_unit * units` apply.
pub fn base_price(rule: &PricingRule, prosthetic_units: u32) -> Result<Decimal, PricingError> {
    if let Some(flat) = rule.base_price {
        return Ok(flat);
    }
    if let Some(per_unit) = rule.price_per_unit {
        return Ok(per_unit * Decimal::from(prosthetic_units));
    }
    Err(PricingError::InvalidPricingRule { rule_id: rule.id.clone() })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::base_price;
    use crate::domain::rule::{PricingRule, RuleId};
    use crate::domain::work::{WorkFamily, WorkType};
    use crate::errors::PricingError;

    fn rule(base: Option<Decimal>, per_unit: Option<Decimal>) -> PricingRule {
        PricingRule {
            id: RuleId("R-1".to_string()),
            work_family: WorkFamily::FixedProsthesis,
            work_type: WorkType::Crown,
            price_group: "standard".to_string(),
            constitution: None,
            building_technique: None,
            core_material_id: None,
            base_price: base,
            price_per_unit: per_unit,
            currency: "EUR".to_string(),
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        }
    }

    #[test]
    fn flat_price_ignores_unit_count() {
        let r = rule(Some(Decimal::new(40_000, 2)), Some(Decimal::new(5_000, 2)));
        assert_eq!(base_price(&r, 3).expect("priced"), Decimal::new(40_000, 2));
        assert_eq!(base_price(&r, 1).expect("priced"), Decimal::new(40_000, 2));
    }

    #[test]
    fn per_unit_price_scales_with_units() {
        let r = rule(None, Some(Decimal::new(5_000, 2)));
        assert_eq!(base_price(&r, 3).expect("priced"), Decimal::new(15_000, 2));
    }

    #[test]
    fn rule_without_usable_price_is_invalid() {
        let r = rule(None, None);
        let error = base_price(&r, 1).expect_err("no usable price");
        assert_eq!(error, PricingError::InvalidPricingRule { rule_id: RuleId("R-1".to_string()) });
    }
}
