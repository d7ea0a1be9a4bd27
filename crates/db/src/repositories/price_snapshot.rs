use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use dentabill_core::{
    NewPriceSnapshot, PriceSnapshot, PricingError, SnapshotId, SnapshotInsert, SnapshotStore,
    WorkId,
};

use super::{parse_decimal, parse_timestamp, RepositoryError};
use crate::DbPool;

/// Write-once price snapshots. The `UNIQUE(work_id)` constraint plus
/// `ON CONFLICT DO NOTHING` make the insert race-safe: of two concurrent
/// attempts exactly one row lands, the loser observes zero affected rows.
pub struct SqlPriceSnapshotRepository {
    pool: DbPool,
}

impl SqlPriceSnapshotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<PriceSnapshot, RepositoryError> {
        let price: String =
            row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at: String =
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(PriceSnapshot {
            id: SnapshotId(row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?),
            work_id: WorkId(
                row.try_get("work_id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            ),
            price: parse_decimal("work_price_snapshot.price", &price)?,
            currency: row
                .try_get("currency")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            price_group: row
                .try_get("price_group")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            created_at: parse_timestamp("work_price_snapshot.created_at", &created_at)?,
        })
    }
}

#[async_trait]
impl SnapshotStore for SqlPriceSnapshotRepository {
    async fn find_by_work(
        &self,
        work_id: &WorkId,
    ) -> Result<Option<PriceSnapshot>, PricingError> {
        let row = sqlx::query(
            "SELECT id, work_id, price, currency, price_group, created_at
             FROM work_price_snapshot WHERE work_id = ?",
        )
        .bind(&work_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.as_ref()
            .map(Self::map_row)
            .transpose()
            .map_err(PricingError::from)
    }

    async fn insert_if_absent(
        &self,
        snapshot: NewPriceSnapshot,
    ) -> Result<SnapshotInsert, PricingError> {
        let id = format!("snap-{}", uuid::Uuid::new_v4());
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO work_price_snapshot
                 (id, work_id, price, currency, price_group, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(work_id) DO NOTHING",
        )
        .bind(&id)
        .bind(&snapshot.work_id.0)
        .bind(snapshot.price.to_string())
        .bind(&snapshot.currency)
        .bind(&snapshot.price_group)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Ok(SnapshotInsert::Conflict);
        }

        Ok(SnapshotInsert::Inserted(PriceSnapshot {
            id: SnapshotId(id),
            work_id: snapshot.work_id,
            price: snapshot.price,
            currency: snapshot.currency,
            price_group: snapshot.price_group,
            created_at,
        }))
    }
}
