use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use dentabill_core::{NewPriceOverride, OverrideStore, PriceOverride, PricingError, SnapshotId};

use super::{parse_decimal, parse_timestamp, RepositoryError};
use crate::DbPool;

/// Append-only override ledger. Rows are never updated or deleted; a wrong
/// adjustment is corrected by appending a counter-entry.
pub struct SqlPriceOverrideRepository {
    pool: DbPool,
}

impl SqlPriceOverrideRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<PriceOverride, RepositoryError> {
        let adjustment: String =
            row.try_get("adjustment").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at: String =
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(PriceOverride {
            id: row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            snapshot_id: SnapshotId(
                row.try_get("snapshot_id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            ),
            adjustment: parse_decimal("price_override.adjustment", &adjustment)?,
            reason: row.try_get("reason").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            created_by: row
                .try_get("created_by")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            created_at: parse_timestamp("price_override.created_at", &created_at)?,
        })
    }
}

#[async_trait]
impl OverrideStore for SqlPriceOverrideRepository {
    async fn append(&self, entry: NewPriceOverride) -> Result<PriceOverride, PricingError> {
        let id = format!("ovr-{}", uuid::Uuid::new_v4());
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO price_override
                 (id, snapshot_id, adjustment, reason, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.snapshot_id.0)
        .bind(entry.adjustment.to_string())
        .bind(&entry.reason)
        .bind(&entry.created_by)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(PriceOverride {
            id,
            snapshot_id: entry.snapshot_id,
            adjustment: entry.adjustment,
            reason: entry.reason,
            created_by: entry.created_by,
            created_at,
        })
    }

    async fn find_by_snapshot(
        &self,
        snapshot_id: &SnapshotId,
    ) -> Result<Vec<PriceOverride>, PricingError> {
        let rows = sqlx::query(
            "SELECT id, snapshot_id, adjustment, reason, created_by, created_at
             FROM price_override
             WHERE snapshot_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(&snapshot_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.iter()
            .map(|row| Self::map_row(row).map_err(PricingError::from))
            .collect()
    }
}
