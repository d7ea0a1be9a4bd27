use async_trait::async_trait;
use sqlx::Row;

use dentabill_core::{
    domain::work::resolve_identity, BridgeTooth, BridgeToothRole, BridgeWork, CrownWork,
    PricingError, WorkFamily, WorkId, WorkIdentitySource, WorkPricingIdentity, WorkRecord,
    WorkType,
};

use super::RepositoryError;
use crate::DbPool;

/// Loads a work's subtype record and flattens it into the pricing identity.
///
/// The union of crown and bridge representations happens in code through
/// `WorkRecord`, not in SQL: the repository only fetches the raw subtype
/// rows and enforces that exactly one backs the work.
pub struct SqlWorkIdentityRepository {
    pool: DbPool,
}

impl SqlWorkIdentityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_family(&self, work_id: &WorkId) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT family FROM work WHERE id = ?")
            .bind(&work_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get("family").map_err(|e| RepositoryError::Decode(e.to_string())))
            .transpose()
    }

    async fn load_crown(&self, work_id: &WorkId) -> Result<Option<CrownWork>, RepositoryError> {
        let row = sqlx::query(
            "SELECT work_type, constitution, building_technique, core_material_id
             FROM crown_work WHERE work_id = ?",
        )
        .bind(&work_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let work_type_raw: String =
            row.try_get("work_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let work_type = WorkType::parse(&work_type_raw).ok_or_else(|| {
            RepositoryError::Decode(format!(
                "unknown work type `{work_type_raw}` on crown work {work_id}"
            ))
        })?;

        Ok(Some(CrownWork {
            work_id: work_id.clone(),
            work_type,
            constitution: row
                .try_get("constitution")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            building_technique: row
                .try_get("building_technique")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            core_material_id: row
                .try_get("core_material_id")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        }))
    }

    async fn load_bridge(&self, work_id: &WorkId) -> Result<Option<BridgeWork>, RepositoryError> {
        let row = sqlx::query(
            "SELECT constitution, building_technique, core_material_id
             FROM bridge_work WHERE work_id = ?",
        )
        .bind(&work_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let tooth_rows = sqlx::query(
            "SELECT tooth_number, role FROM bridge_tooth
             WHERE bridge_work_id = ? ORDER BY tooth_number ASC",
        )
        .bind(&work_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut teeth = Vec::with_capacity(tooth_rows.len());
        for tooth in tooth_rows {
            let number: i64 =
                tooth.try_get("tooth_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let role_raw: String =
                tooth.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let role = BridgeToothRole::parse(&role_raw).ok_or_else(|| {
                RepositoryError::Decode(format!(
                    "unknown tooth role `{role_raw}` on bridge work {work_id}"
                ))
            })?;
            let tooth_number = u8::try_from(number).map_err(|_| {
                RepositoryError::Decode(format!(
                    "tooth number `{number}` on bridge work {work_id} is out of range"
                ))
            })?;
            teeth.push(BridgeTooth { tooth_number, role });
        }

        Ok(Some(BridgeWork {
            work_id: work_id.clone(),
            constitution: row
                .try_get("constitution")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            building_technique: row
                .try_get("building_technique")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            core_material_id: row
                .try_get("core_material_id")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            teeth,
        }))
    }
}

#[async_trait]
impl WorkIdentitySource for SqlWorkIdentityRepository {
    async fn find_pricing_identity(
        &self,
        work_id: &WorkId,
    ) -> Result<WorkPricingIdentity, PricingError> {
        let family_raw = self
            .load_family(work_id)
            .await
            .map_err(PricingError::from)?
            .ok_or_else(|| PricingError::AmbiguousOrMissingWork {
                work_id: work_id.clone(),
                found: 0,
            })?;

        let family = WorkFamily::parse(&family_raw).ok_or_else(|| {
            PricingError::Storage(format!("unknown work family `{family_raw}` on work {work_id}"))
        })?;

        if family != WorkFamily::FixedProsthesis {
            return Err(PricingError::UnsupportedFamily { family });
        }

        let crown = self.load_crown(work_id).await.map_err(PricingError::from)?;
        let bridge = self.load_bridge(work_id).await.map_err(PricingError::from)?;

        let record = match (crown, bridge) {
            (Some(crown), None) => WorkRecord::Crown(crown),
            (None, Some(bridge)) => WorkRecord::Bridge(bridge),
            (None, None) => {
                return Err(PricingError::AmbiguousOrMissingWork {
                    work_id: work_id.clone(),
                    found: 0,
                })
            }
            (Some(_), Some(_)) => {
                return Err(PricingError::AmbiguousOrMissingWork {
                    work_id: work_id.clone(),
                    found: 2,
                })
            }
        };

        resolve_identity(family, &record)
    }
}
