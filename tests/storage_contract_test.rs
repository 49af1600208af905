//! Storage contract terms, reachable inventory space and decision sets.
//!
//! Ratchet pillars follow the worked cavern example used across the valuation tests:
//! two tables, the second tightening capacity to 1800.

use approx::assert_relative_eq;
use storage_valuation::core::{InjectWithdrawRange, ValuationError};
use storage_valuation::storage::{
    CmdtyStorage, InventoryRatchet, RatchetInterpolation, RatchetTable, StorageContract,
    bang_bang_decision_set, inventory_space,
};
use storage_valuation::time::{Day, TimePeriod, TimeSeries};

fn day(y: i32, m: u32, d: u32) -> Day {
    Day::from_ymd(y, m, d).unwrap()
}

fn ratchet_storage(interpolation: RatchetInterpolation) -> StorageContract<Day> {
    StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
        .ratchets(
            vec![
                RatchetTable::new(
                    day(2019, 8, 28),
                    vec![
                        InventoryRatchet::new(0.0, 150.0, 250.0),
                        InventoryRatchet::new(2000.0, 200.0, 150.0),
                    ],
                ),
                RatchetTable::new(
                    day(2019, 9, 10),
                    vec![
                        InventoryRatchet::new(0.0, 170.0, 240.0),
                        InventoryRatchet::new(700.0, 180.0, 200.0),
                        InventoryRatchet::new(1800.0, 190.0, 170.0),
                    ],
                ),
            ],
            interpolation,
        )
        .build()
        .unwrap()
}

#[test]
fn ratchet_tables_switch_on_their_start_period() {
    let storage = ratchet_storage(RatchetInterpolation::Linear);
    assert_eq!(storage.max_inventory(day(2019, 9, 9)), 2000.0);
    assert_eq!(storage.max_inventory(day(2019, 9, 10)), 1800.0);
    assert_eq!(storage.min_inventory(day(2019, 9, 20)), 0.0);
    // Must be empty at the end without a terminal payoff.
    assert_eq!(storage.max_inventory(day(2019, 9, 25)), 0.0);
    assert!(storage.must_be_empty_at_end());
}

#[test]
fn linear_ratchets_interpolate_between_pillars() {
    let storage = ratchet_storage(RatchetInterpolation::Linear);
    let range = storage.inject_withdraw_range(day(2019, 9, 1), 1000.0);
    assert_relative_eq!(range.min_inject_withdraw, -175.0, epsilon = 1e-12);
    assert_relative_eq!(range.max_inject_withdraw, 200.0, epsilon = 1e-12);

    let range = storage.inject_withdraw_range(day(2019, 9, 12), 350.0);
    assert_relative_eq!(range.min_inject_withdraw, -175.0, epsilon = 1e-12);
    assert_relative_eq!(range.max_inject_withdraw, 220.0, epsilon = 1e-12);
}

#[test]
fn step_ratchets_use_lower_pillar() {
    let storage = ratchet_storage(RatchetInterpolation::Step);
    let range = storage.inject_withdraw_range(day(2019, 9, 12), 1200.0);
    assert_eq!(range, InjectWithdrawRange::new(-180.0, 200.0));
    let range = storage.inject_withdraw_range(day(2019, 9, 12), 1800.0);
    assert_eq!(range, InjectWithdrawRange::new(-190.0, 170.0));
}

#[test]
fn ratchet_space_respects_capacity_and_emptying() {
    let storage = ratchet_storage(RatchetInterpolation::Linear);
    let space = inventory_space(&storage, 0.0, day(2019, 8, 28)).unwrap();

    assert_eq!(space.start(), Some(day(2019, 8, 29)));
    assert_eq!(space.end(), Some(day(2019, 9, 25)));
    for (period, range) in space.iter() {
        assert!(range.min <= range.max + 1e-9, "{period}: {range:?}");
        assert!(range.min >= storage.min_inventory(period) - 1e-9);
        assert!(range.max <= storage.max_inventory(period) + 1e-9);
    }
    let last = space.get(day(2019, 9, 25)).unwrap();
    assert_eq!((last.min, last.max), (0.0, 0.0));
    // One day before the end only what a single withdrawal can clear is allowed.
    let before_end = space.get(day(2019, 9, 24)).unwrap();
    assert!(before_end.max <= 190.0 + 1e-6);
    assert!(before_end.max >= 170.0 - 1e-6);
}

#[test]
fn terminal_payoff_lifts_empty_end_requirement() {
    let storage = StorageContract::builder(day(2019, 9, 1), day(2019, 9, 5))
        .min_inventory(0.0)
        .max_inventory(100.0)
        .max_injection_rate(30.0)
        .max_withdrawal_rate(30.0)
        .terminal_storage_npv(|price, inventory| 0.9 * price * inventory)
        .build()
        .unwrap();
    assert!(!storage.must_be_empty_at_end());
    assert_eq!(storage.max_inventory(day(2019, 9, 5)), 100.0);
    assert_relative_eq!(storage.terminal_storage_npv(10.0, 50.0), 450.0);

    let space = inventory_space(&storage, 0.0, day(2019, 9, 1)).unwrap();
    let end = space.get(day(2019, 9, 5)).unwrap();
    assert_relative_eq!(end.max, 100.0);
}

#[test]
fn per_period_terms_come_from_series() {
    let start = day(2019, 9, 1);
    let end = start.offset(3);
    let storage = StorageContract::builder(start, end)
        .min_inventory(0.0)
        .max_inventory(TimeSeries::new(start, vec![100.0, 80.0, 60.0, 60.0]))
        .max_injection_rate(20.0)
        .max_withdrawal_rate(TimeSeries::new(start, vec![5.0, 10.0, 15.0, 15.0]))
        .injection_cost(TimeSeries::new(start, vec![1.0, 2.0, 3.0, 3.0]))
        .build()
        .unwrap();

    assert_eq!(storage.max_inventory(start.next()), 80.0);
    let range = storage.inject_withdraw_range(start.offset(2), 30.0);
    assert_eq!(range, InjectWithdrawRange::new(-15.0, 20.0));
    let costs = storage.injection_cost(start.next(), 0.0, 10.0);
    assert_eq!(costs.len(), 1);
    assert_eq!(costs[0].date, start.next().first_day());
    assert_relative_eq!(costs[0].amount, 20.0);
}

#[test]
fn invalid_terms_are_rejected() {
    let start = day(2019, 9, 1);
    let builder = || {
        StorageContract::builder(start, start.offset(3))
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(20.0)
            .max_withdrawal_rate(20.0)
    };

    assert!(matches!(
        builder().min_inventory(150.0).build(),
        Err(ValuationError::InvalidInput(_))
    ));
    assert!(matches!(
        builder().inventory_loss(1.0).build(),
        Err(ValuationError::InvalidInput(_))
    ));
    assert!(matches!(
        builder().withdrawal_cost(-0.1).build(),
        Err(ValuationError::InvalidInput(_))
    ));
    assert!(matches!(
        StorageContract::builder(start, start.previous())
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(20.0)
            .max_withdrawal_rate(20.0)
            .build(),
        Err(ValuationError::InvalidInput(_))
    ));

    let late_table = vec![RatchetTable::new(
        start.next(),
        vec![InventoryRatchet::new(0.0, 10.0, 10.0)],
    )];
    assert!(matches!(
        StorageContract::builder(start, start.offset(3))
            .ratchets(late_table, RatchetInterpolation::Linear)
            .build(),
        Err(ValuationError::InvalidInput(_))
    ));
}

#[test]
fn decision_set_holds_zero_and_boundaries() {
    let range = InjectWithdrawRange::new(-30.0, 40.0);
    let decisions = bang_bang_decision_set(range, 50.0, 0.0, 0.0, 100.0, 1e-10).unwrap();
    assert_eq!(decisions, vec![0.0, -30.0, 40.0]);

    // Next-period capacity caps injection at 20.
    let decisions = bang_bang_decision_set(range, 80.0, 0.0, 0.0, 100.0, 1e-10).unwrap();
    assert_eq!(decisions, vec![0.0, -30.0, 20.0]);

    // Forced withdrawal: zero is no longer feasible.
    let decisions = bang_bang_decision_set(range, 50.0, 0.0, 0.0, 25.0, 1e-10).unwrap();
    assert_eq!(decisions, vec![-30.0, -25.0]);

    // A pinned next-period inventory leaves a single decision.
    let decisions = bang_bang_decision_set(range, 50.0, 0.0, 25.0, 25.0, 1e-10).unwrap();
    assert_eq!(decisions, vec![-25.0]);
}

#[test]
fn decision_set_accounts_for_loss_and_tolerance() {
    let range = InjectWithdrawRange::new(-10.0, 10.0);
    // 5 lost overnight, so reaching at least 50 takes an injection of 5 or more.
    let decisions = bang_bang_decision_set(range, 50.0, 5.0, 50.0, 100.0, 1e-10).unwrap();
    assert_eq!(decisions, vec![5.0, 10.0]);

    let within_tolerance = bang_bang_decision_set(range, 50.0, 0.0, 60.0 + 1e-12, 100.0, 1e-10);
    assert_eq!(within_tolerance.unwrap(), vec![10.0]);

    let err = bang_bang_decision_set(range, 50.0, 0.0, 61.0, 100.0, 1e-10).unwrap_err();
    assert!(err.is_infeasible());
}
