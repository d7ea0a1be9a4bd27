use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;

use dentabill_core::{
    PricingError, PricingRule, PricingRuleSource, RuleId, RuleQuery, WorkFamily, WorkType,
};

use super::{parse_decimal, RepositoryError};
use crate::DbPool;

/// Fetches candidate pricing rules with the eligibility predicate pushed
/// into SQL. The wildcard semantics live in the WHERE clause: a NULL rule
/// attribute matches any identity value, a concrete one must equal it.
/// Ranking among the returned candidates is the core matcher's job.
pub struct SqlPricingRuleRepository {
    pool: DbPool,
}

impl SqlPricingRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<PricingRule, RepositoryError> {
        let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let family_raw: String =
            row.try_get("work_family").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let work_family = WorkFamily::parse(&family_raw).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown work family `{family_raw}` on rule {id}"))
        })?;

        let type_raw: String =
            row.try_get("work_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let work_type = WorkType::parse(&type_raw).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown work type `{type_raw}` on rule {id}"))
        })?;

        let base_price: Option<String> =
            row.try_get("base_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let price_per_unit: Option<String> =
            row.try_get("price_per_unit").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let valid_from_raw: String =
            row.try_get("valid_from").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let valid_from = NaiveDate::parse_from_str(&valid_from_raw, "%Y-%m-%d").map_err(|e| {
            RepositoryError::Decode(format!("invalid valid_from on rule {id}: {e}"))
        })?;

        Ok(PricingRule {
            id: RuleId(id),
            work_family,
            work_type,
            price_group: row
                .try_get("price_group")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            constitution: row
                .try_get("constitution")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            building_technique: row
                .try_get("building_technique")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            core_material_id: row
                .try_get("core_material_id")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            base_price: base_price
                .as_deref()
                .map(|value| parse_decimal("pricing_rule.base_price", value))
                .transpose()?,
            price_per_unit: price_per_unit
                .as_deref()
                .map(|value| parse_decimal("pricing_rule.price_per_unit", value))
                .transpose()?,
            currency: row
                .try_get("currency")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            valid_from,
        })
    }
}

#[async_trait]
impl PricingRuleSource for SqlPricingRuleRepository {
    async fn find_candidate_rules(
        &self,
        query: &RuleQuery,
    ) -> Result<Vec<PricingRule>, PricingError> {
        let rows = sqlx::query(
            "SELECT id, work_family, work_type, price_group, constitution,
                    building_technique, core_material_id, base_price,
                    price_per_unit, currency, valid_from
             FROM pricing_rule
             WHERE work_family = ?
               AND work_type = ?
               AND price_group = ?
               AND (constitution IS NULL OR constitution = ?)
               AND (building_technique IS NULL OR building_technique = ?)
               AND (core_material_id IS NULL OR core_material_id = ?)
               AND valid_from <= ?",
        )
        .bind(query.work_family.as_str())
        .bind(query.work_type.as_str())
        .bind(&query.price_group)
        .bind(&query.constitution)
        .bind(&query.building_technique)
        .bind(&query.core_material_id)
        .bind(query.pricing_date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.iter()
            .map(|row| Self::map_row(row).map_err(PricingError::from))
            .collect()
    }
}
