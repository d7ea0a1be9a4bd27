//! Rule eligibility and selection.
//!
//! The predicate and the tie-break order are business policy: changing
//! either is a pricing-policy change, not a refactor. Selection lives here
//! as one scoring function instead of being hidden in SQL ordering.

use chrono::NaiveDate;

use crate::domain::rule::PricingRule;
use crate::domain::work::WorkPricingIdentity;

fn wildcard_or_equal(rule_value: &Option<String>, identity_value: &Option<String>) -> bool {
    match rule_value {
        None => true,
        Some(required) => identity_value.as_deref() == Some(required.as_str()),
    }
}

/// Eligibility predicate: exact family/type/group match, rule already valid
/// at the pricing date, and every optional attribute either wildcard or
/// equal to the identity's value.
pub fn is_eligible(
    rule: &PricingRule,
    identity: &WorkPricingIdentity,
    price_group: &str,
    pricing_date: NaiveDate,
) -> bool {
    rule.work_family == identity.work_family
        && rule.work_type == identity.work_type
        && rule.price_group == price_group
        && rule.valid_from <= pricing_date
        && wildcard_or_equal(&rule.constitution, &identity.constitution)
        && wildcard_or_equal(&rule.building_technique, &identity.building_technique)
        && wildcard_or_equal(&rule.core_material_id, &identity.core_material_id)
}

/// Select the single best rule among eligible candidates:
/// 1. most non-wildcard optional attributes (specificity),
/// 2. latest `valid_from` (recency),
/// 3. smallest rule id, so full ties still resolve deterministically.
pub fn select_best_rule<'a>(
    candidates: &'a [PricingRule],
    identity: &WorkPricingIdentity,
    price_group: &str,
    pricing_date: NaiveDate,
) -> Option<&'a PricingRule> {
    candidates
        .iter()
        .filter(|rule| is_eligible(rule, identity, price_group, pricing_date))
        .max_by(|a, b| {
            a.specificity()
                .cmp(&b.specificity())
                .then(a.valid_from.cmp(&b.valid_from))
                .then(b.id.0.cmp(&a.id.0))
        })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{is_eligible, select_best_rule};
    use crate::domain::rule::{PricingRule, RuleId};
    use crate::domain::work::{WorkFamily, WorkId, WorkPricingIdentity, WorkType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn identity() -> WorkPricingIdentity {
        WorkPricingIdentity {
            work_id: WorkId("W-1".to_string()),
            work_family: WorkFamily::FixedProsthesis,
            work_type: WorkType::Crown,
            constitution: Some("metal_ceramic".to_string()),
            building_technique: Some("cast".to_string()),
            core_material_id: Some("MAT-7".to_string()),
            prosthetic_units: 1,
        }
    }

    fn rule(id: &str, valid_from: NaiveDate) -> PricingRule {
        PricingRule {
            id: RuleId(id.to_string()),
            work_family: WorkFamily::FixedProsthesis,
            work_type: WorkType::Crown,
            price_group: "standard".to_string(),
            constitution: None,
            building_technique: None,
            core_material_id: None,
            base_price: Some(Decimal::new(10_000, 2)),
            price_per_unit: None,
            currency: "EUR".to_string(),
            valid_from,
        }
    }

    #[test]
    fn wildcard_rule_matches_any_identity_attributes() {
        let r = rule("R-1", date(2024, 1, 1));
        assert!(is_eligible(&r, &identity(), "standard", date(2025, 6, 1)));

        let mut bare = identity();
        bare.constitution = None;
        bare.building_technique = None;
        bare.core_material_id = None;
        assert!(is_eligible(&r, &bare, "standard", date(2025, 6, 1)));
    }

    #[test]
    fn specific_rule_requires_equal_attribute() {
        let mut r = rule("R-1", date(2024, 1, 1));
        r.constitution = Some("full_ceramic".to_string());
        assert!(!is_eligible(&r, &identity(), "standard", date(2025, 6, 1)));

        r.constitution = Some("metal_ceramic".to_string());
        assert!(is_eligible(&r, &identity(), "standard", date(2025, 6, 1)));
    }

    #[test]
    fn specific_rule_never_matches_absent_identity_attribute() {
        let mut r = rule("R-1", date(2024, 1, 1));
        r.core_material_id = Some("MAT-7".to_string());

        let mut bare = identity();
        bare.core_material_id = None;
        assert!(!is_eligible(&r, &bare, "standard", date(2025, 6, 1)));
    }

    #[test]
    fn future_rules_and_foreign_groups_are_ineligible() {
        let r = rule("R-1", date(2026, 1, 1));
        assert!(!is_eligible(&r, &identity(), "standard", date(2025, 6, 1)));
        assert!(!is_eligible(&rule("R-2", date(2024, 1, 1)), &identity(), "vip", date(2025, 6, 1)));
    }

    #[test]
    fn higher_specificity_beats_recency() {
        let wildcard_newer = rule("R-WILD", date(2025, 5, 1));
        let mut specific_older = rule("R-SPEC", date(2024, 1, 1));
        specific_older.constitution = Some("metal_ceramic".to_string());
        specific_older.building_technique = Some("cast".to_string());

        let candidates = vec![wildcard_newer, specific_older];
        let best = select_best_rule(&candidates, &identity(), "standard", date(2025, 6, 1))
            .expect("one eligible rule");
        assert_eq!(best.id.0, "R-SPEC");
    }

    #[test]
    fn specificity_tie_breaks_on_latest_valid_from() {
        let mut older = rule("R-OLD", date(2024, 1, 1));
        older.constitution = Some("metal_ceramic".to_string());
        let mut newer = rule("R-NEW", date(2025, 1, 1));
        newer.constitution = Some("metal_ceramic".to_string());

        let candidates = vec![older, newer];
        let best = select_best_rule(&candidates, &identity(), "standard", date(2025, 6, 1))
            .expect("eligible rules");
        assert_eq!(best.id.0, "R-NEW");
    }

    #[test]
    fn full_tie_is_deterministic_on_rule_id() {
        let a = rule("R-A", date(2024, 1, 1));
        let b = rule("R-B", date(2024, 1, 1));

        let forward = vec![a.clone(), b.clone()];
        let reversed = vec![b, a];
        let first = select_best_rule(&forward, &identity(), "standard", date(2025, 6, 1))
            .expect("eligible")
            .id
            .clone();
        let second = select_best_rule(&reversed, &identity(), "standard", date(2025, 6, 1))
            .expect("eligible")
            .id
            .clone();
        assert_eq!(first, second);
        assert_eq!(first.0, "R-A");
    }

    #[test]
    fn no_eligible_rule_yields_none() {
        let candidates = vec![rule("R-1", date(2026, 1, 1))];
        assert!(select_best_rule(&candidates, &identity(), "standard", date(2025, 6, 1)).is_none());
    }

    #[test]
    fn winner_always_has_maximum_specificity_among_eligible() {
        let mut rules = Vec::new();
        for (i, spec) in [0u32, 1, 2, 3, 2, 1].iter().enumerate() {
            let mut r = rule(&format!("R-{i}"), date(2024, 1, 1 + i as u32));
            if *spec >= 1 {
                r.constitution = Some("metal_ceramic".to_string());
            }
            if *spec >= 2 {
                r.building_technique = Some("cast".to_string());
            }
            if *spec >= 3 {
                r.core_material_id = Some("MAT-7".to_string());
            }
            rules.push(r);
        }

        let best = select_best_rule(&rules, &identity(), "standard", date(2025, 6, 1))
            .expect("eligible rules");
        let max_spec =
            rules.iter().map(super::PricingRule::specificity).max().expect("non-empty");
        assert_eq!(best.specificity(), max_spec);
    }
}
