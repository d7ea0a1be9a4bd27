//! FIFO payment allocation.
//!
//! Pure computation: walk the works in caller order, give each the smaller
//! of its unpaid amount and what is left of the payment pool, and account
//! for every cent. `allocated + remainder == payment_amount` always holds.

use rust_decimal::Decimal;

use crate::domain::payment::{derive_status, PaymentAllocation, WorkBalance};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationOutcome {
    pub allocations: Vec<PaymentAllocation>,
    pub total_allocated: Decimal,
    pub remaining_unallocated: Decimal,
}

/// Distribute `payment_amount` across `balances` in the given order. The
/// order is authoritative; works are never re-sorted here. Fully paid works
/// receive a zero allocation and keep their position in the output.
pub fn allocate(payment_amount: Decimal, balances: &[WorkBalance]) -> AllocationOutcome {
    let mut pool = payment_amount;
    let mut total_allocated = Decimal::ZERO;
    let mut allocations = Vec::with_capacity(balances.len());

    for balance in balances {
        let share = pool.min(balance.remaining);
        pool -= share;
        total_allocated += share;

        let remaining_after = balance.remaining - share;
        allocations.push(PaymentAllocation {
            work_id: balance.work_id.clone(),
            allocated_amount: share,
            resulting_status: derive_status(balance.total_due, remaining_after),
        });
    }

    AllocationOutcome { allocations, total_allocated, remaining_unallocated: pool }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::allocate;
    use crate::domain::payment::{PaymentStatus, WorkBalance};
    use crate::domain::work::WorkId;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn balance(work_id: &str, due_cents: i64, paid_cents: i64) -> WorkBalance {
        WorkBalance::new(WorkId(work_id.to_string()), dec(due_cents), dec(paid_cents))
    }

    #[test]
    fn payment_splits_across_works_in_input_order() {
        // Scenario: unpaid 80.00 then 200.00, payment 150.00.
        let balances = vec![balance("W-1", 8_000, 0), balance("W-2", 20_000, 0)];
        let outcome = allocate(dec(15_000), &balances);

        assert_eq!(outcome.allocations.len(), 2);
        assert_eq!(outcome.allocations[0].work_id.0, "W-1");
        assert_eq!(outcome.allocations[0].allocated_amount, dec(8_000));
        assert_eq!(outcome.allocations[0].resulting_status, PaymentStatus::Paid);
        assert_eq!(outcome.allocations[1].work_id.0, "W-2");
        assert_eq!(outcome.allocations[1].allocated_amount, dec(7_000));
        assert_eq!(outcome.allocations[1].resulting_status, PaymentStatus::Partial);
        assert_eq!(outcome.total_allocated, dec(15_000));
        assert_eq!(outcome.remaining_unallocated, Decimal::ZERO);
    }

    #[test]
    fn excess_payment_becomes_remainder() {
        let balances = vec![balance("W-1", 8_000, 0)];
        let outcome = allocate(dec(10_000), &balances);

        assert_eq!(outcome.total_allocated, dec(8_000));
        assert_eq!(outcome.remaining_unallocated, dec(2_000));
        assert_eq!(outcome.total_allocated + outcome.remaining_unallocated, dec(10_000));
    }

    #[test]
    fn fully_paid_work_contributes_zero_and_keeps_position() {
        let balances = vec![
            balance("W-PAID", 5_000, 5_000),
            balance("W-OPEN", 6_000, 0),
        ];
        let outcome = allocate(dec(4_000), &balances);

        assert_eq!(outcome.allocations[0].work_id.0, "W-PAID");
        assert_eq!(outcome.allocations[0].allocated_amount, Decimal::ZERO);
        assert_eq!(outcome.allocations[0].resulting_status, PaymentStatus::Paid);
        assert_eq!(outcome.allocations[1].allocated_amount, dec(4_000));
        assert_eq!(outcome.allocations[1].resulting_status, PaymentStatus::Partial);
    }

    #[test]
    fn no_allocation_exceeds_a_works_unpaid_amount() {
        let balances = vec![
            balance("W-1", 3_000, 1_000),
            balance("W-2", 7_000, 6_500),
            balance("W-3", 12_000, 0),
        ];
        let payment = dec(100_000);
        let outcome = allocate(payment, &balances);

        for (allocation, balance) in outcome.allocations.iter().zip(&balances) {
            assert!(allocation.allocated_amount <= balance.remaining);
            assert!(allocation.allocated_amount >= Decimal::ZERO);
        }
        let unpaid_total: Decimal = balances.iter().map(|b| b.remaining).sum();
        assert_eq!(outcome.total_allocated, unpaid_total);
        assert_eq!(outcome.total_allocated + outcome.remaining_unallocated, payment);
    }

    #[test]
    fn conservation_holds_on_exact_exhaustion_boundary() {
        let balances = vec![balance("W-1", 8_000, 0), balance("W-2", 7_000, 0)];
        let outcome = allocate(dec(15_000), &balances);

        assert_eq!(outcome.remaining_unallocated, Decimal::ZERO);
        assert_eq!(outcome.allocations[1].resulting_status, PaymentStatus::Paid);
    }

    #[test]
    fn empty_work_list_leaves_everything_unallocated() {
        let outcome = allocate(dec(5_000), &[]);
        assert!(outcome.allocations.is_empty());
        assert_eq!(outcome.total_allocated, Decimal::ZERO);
        assert_eq!(outcome.remaining_unallocated, dec(5_000));
    }
}
