use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use dentabill_core::{
    ClientBalance, ClientBalanceSource, ClientId, PaymentLedgerSource, PricingError, WorkId,
};

use super::{parse_decimal, RepositoryError};
use crate::DbPool;

/// Reads paid amounts from the cash and balance ledgers. Amounts are stored
/// as TEXT decimal strings, so summation happens in Rust after fetching;
/// SQLite's SUM would coerce them to floats.
pub struct SqlPaymentLedgerRepository {
    pool: DbPool,
}

impl SqlPaymentLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn sum_by_work(
        &self,
        sql: &str,
        work_ids: &[WorkId],
        absolute: bool,
    ) -> Result<HashMap<WorkId, Decimal>, RepositoryError> {
        let mut totals: HashMap<WorkId, Decimal> = HashMap::new();
        if work_ids.is_empty() {
            return Ok(totals);
        }

        let placeholders = vec!["?"; work_ids.len()].join(", ");
        let sql = sql.replace("{ids}", &placeholders);
        let mut query = sqlx::query(&sql);
        for work_id in work_ids {
            query = query.bind(&work_id.0);
        }

        let rows = query.fetch_all(&self.pool).await?;
        for row in rows {
            let work_id: String =
                row.try_get("work_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let amount: String =
                row.try_get("amount").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let amount = parse_decimal("ledger.amount", &amount)?;
            let amount = if absolute { amount.abs() } else { amount };
            *totals.entry(WorkId(work_id)).or_default() += amount;
        }
        Ok(totals)
    }
}

#[async_trait]
impl PaymentLedgerSource for SqlPaymentLedgerRepository {
    async fn cash_paid_amounts(
        &self,
        work_ids: &[WorkId],
    ) -> Result<HashMap<WorkId, Decimal>, PricingError> {
        // Cash rows keep their sign so refund rows net against receipts.
        self.sum_by_work(
            "SELECT work_id, amount FROM cash_payment
             WHERE status = 'received' AND work_id IN ({ids})",
            work_ids,
            false,
        )
        .await
        .map_err(PricingError::from)
    }

    async fn balance_paid_amounts(
        &self,
        work_ids: &[WorkId],
    ) -> Result<HashMap<WorkId, Decimal>, PricingError> {
        // Balance applications are recorded as negative movements; the paid
        // amount is their magnitude.
        self.sum_by_work(
            "SELECT work_id, amount FROM balance_movement
             WHERE work_id IS NOT NULL AND work_id IN ({ids})",
            work_ids,
            true,
        )
        .await
        .map_err(PricingError::from)
    }
}

/// Reads the client account needed to route an unallocated payment
/// remainder onto the client's balance.
pub struct SqlClientBalanceRepository {
    pool: DbPool,
}

impl SqlClientBalanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientBalanceSource for SqlClientBalanceRepository {
    async fn client_balance(&self, client_id: &ClientId) -> Result<ClientBalance, PricingError> {
        let row = sqlx::query("SELECT balance, currency, active FROM client WHERE id = ?")
            .bind(&client_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?
            .ok_or_else(|| PricingError::Storage(format!("client {client_id} not found")))?;

        let balance: String = row
            .try_get("balance")
            .map_err(|e| RepositoryError::Decode(e.to_string()))
            .map_err(PricingError::from)?;
        let active: bool = row
            .try_get("active")
            .map_err(|e| RepositoryError::Decode(e.to_string()))
            .map_err(PricingError::from)?;
        let currency: String = row
            .try_get("currency")
            .map_err(|e| RepositoryError::Decode(e.to_string()))
            .map_err(PricingError::from)?;

        Ok(ClientBalance {
            balance: parse_decimal("client.balance", &balance).map_err(PricingError::from)?,
            currency,
            active,
        })
    }
}
