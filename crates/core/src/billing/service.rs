use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::billing::allocation;
use crate::domain::payment::{PaymentPreview, WorkBalance};
use crate::domain::work::{ClientId, WorkId};
use crate::errors::PricingError;
use crate::pricing::sources::{ClientBalanceSource, PaymentLedgerSource};
use crate::pricing::PricingService;

/// Payment allocation entry point. Consumes final prices from the pricing
/// read path and already-paid amounts from the payment ledger; computes a
/// preview only, nothing is persisted here.
pub struct BillingService {
    pricing: Arc<PricingService>,
    ledger: Arc<dyn PaymentLedgerSource>,
    clients: Arc<dyn ClientBalanceSource>,
}

impl BillingService {
    pub fn new(
        pricing: Arc<PricingService>,
        ledger: Arc<dyn PaymentLedgerSource>,
        clients: Arc<dyn ClientBalanceSource>,
    ) -> Self {
        Self { pricing, ledger, clients }
    }

    /// Propose a FIFO distribution of one payment across the given works.
    /// `work_ids` order is authoritative. A non-zero remainder must be
    /// confirmed by the caller before it may be applied to the client's
    /// standing balance downstream.
    pub async fn preview_payment_allocation(
        &self,
        client_id: &ClientId,
        payment_amount: Decimal,
        work_ids: &[WorkId],
    ) -> Result<PaymentPreview, PricingError> {
        if payment_amount <= Decimal::ZERO {
            return Err(PricingError::InvalidPaymentAmount { amount: payment_amount });
        }

        // Each work may appear once; a repeated id would get a fresh
        // full-unpaid balance per occurrence and absorb more than it owes.
        let mut seen = HashSet::with_capacity(work_ids.len());
        for work_id in work_ids {
            if !seen.insert(work_id) {
                return Err(PricingError::DuplicateAllocationTarget {
                    work_id: work_id.clone(),
                });
            }
        }

        let cash_paid = self.ledger.cash_paid_amounts(work_ids).await?;
        let balance_paid = self.ledger.balance_paid_amounts(work_ids).await?;

        let mut balances = Vec::with_capacity(work_ids.len());
        for work_id in work_ids {
            let resolution = self.pricing.resolve_final_price(work_id).await?;
            let already_paid = cash_paid.get(work_id).copied().unwrap_or(Decimal::ZERO)
                + balance_paid.get(work_id).copied().unwrap_or(Decimal::ZERO);
            balances.push(WorkBalance::new(work_id.clone(), resolution.final_price, already_paid));
        }

        let outcome = allocation::allocate(payment_amount, &balances);
        let requires_balance_confirmation = outcome.remaining_unallocated > Decimal::ZERO;

        let client_balance_after = if requires_balance_confirmation {
            let account = self.clients.client_balance(client_id).await?;
            account.active.then(|| account.balance + outcome.remaining_unallocated)
        } else {
            None
        };

        Ok(PaymentPreview {
            client_id: client_id.clone(),
            payment_amount,
            total_allocated: outcome.total_allocated,
            remaining_unallocated: outcome.remaining_unallocated,
            requires_balance_confirmation,
            allocations: outcome.allocations,
            client_balance_after,
        })
    }
}
