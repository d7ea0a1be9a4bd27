use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::work::{ClientId, WorkId};

/// Settlement state of a single work, derived from its remaining balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

/// Derived billing balance for one work. Never stored directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkBalance {
    pub work_id: WorkId,
    pub total_due: Decimal,
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub status: PaymentStatus,
}

impl WorkBalance {
    pub fn new(work_id: WorkId, total_due: Decimal, total_paid: Decimal) -> Self {
        // Overpaid works carry no remaining debt into allocation.
        let remaining = (total_due - total_paid).max(Decimal::ZERO);
        let status = derive_status(total_due, remaining);
        Self { work_id, total_due, total_paid, remaining, status }
    }
}

pub fn derive_status(total_due: Decimal, remaining: Decimal) -> PaymentStatus {
    if remaining <= Decimal::ZERO {
        PaymentStatus::Paid
    } else if remaining >= total_due {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    }
}

/// Proposed, uncommitted share of one payment for one work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub work_id: WorkId,
    pub allocated_amount: Decimal,
    pub resulting_status: PaymentStatus,
}

/// Preview of distributing one client payment across outstanding works.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPreview {
    pub client_id: ClientId,
    pub payment_amount: Decimal,
    pub total_allocated: Decimal,
    pub remaining_unallocated: Decimal,
    pub requires_balance_confirmation: bool,
    pub allocations: Vec<PaymentAllocation>,
    pub client_balance_after: Option<Decimal>,
}

/// Standing balance account of a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBalance {
    pub balance: Decimal,
    pub currency: String,
    pub active: bool,
}
