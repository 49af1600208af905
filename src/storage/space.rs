//! Reachable inventory per period.
//!
//! The space is the intersection of two passes: forward reachability from the
//! starting inventory, and backward reachability of the terminal constraint. A range
//! left with `min > max` means no decision path exists; engines report that as
//! infeasibility.

use crate::core::{InventoryRange, ValuationError};
use crate::math::bisection_bracket;
use crate::storage::CmdtyStorage;
use crate::time::{TimePeriod, TimeSeries};

const ROOT_TOLERANCE: f64 = 1e-12;
const ROOT_MAX_ITER: usize = 200;

/// Inventory space for every period from `current_period + 1` to the storage end.
///
/// Returns an empty series when `current_period` is at or after the end period.
pub fn inventory_space<T, S>(
    storage: &S,
    starting_inventory: f64,
    current_period: T,
) -> Result<TimeSeries<T, InventoryRange>, ValuationError>
where
    T: TimePeriod,
    S: CmdtyStorage<T> + ?Sized,
{
    let end = storage.end_period();
    if current_period >= end {
        return Ok(TimeSeries::empty());
    }
    let num_periods = end.offset_from(current_period) as usize;

    let mut forward = Vec::with_capacity(num_periods);
    let (mut lo, mut hi) = (starting_inventory, starting_inventory);
    for period in current_period.range_inclusive(end.previous()) {
        let retained = 1.0 - storage.inventory_percent_loss(period);
        let next = period.next();
        lo = (lo * retained + storage.inject_withdraw_range(period, lo).min_inject_withdraw)
            .max(storage.min_inventory(next));
        hi = (hi * retained + storage.inject_withdraw_range(period, hi).max_inject_withdraw)
            .min(storage.max_inventory(next));
        forward.push(InventoryRange::new(lo, hi));
    }

    let mut backward = vec![InventoryRange::new(0.0, 0.0); num_periods];
    backward[num_periods - 1] = if storage.must_be_empty_at_end() {
        InventoryRange::new(0.0, 0.0)
    } else {
        InventoryRange::new(storage.min_inventory(end), storage.max_inventory(end))
    };
    for idx in (0..num_periods - 1).rev() {
        let period = current_period.offset(idx as i64 + 1);
        backward[idx] = backward_range(storage, period, backward[idx + 1])?;
    }

    let ranges = forward
        .into_iter()
        .zip(backward)
        .map(|(f, b)| InventoryRange::new(f.min.max(b.min), f.max.min(b.max)))
        .collect();
    Ok(TimeSeries::new(current_period.next(), ranges))
}

/// Inventories in `period` from which some decision lands inside `next`.
///
/// Decision bounds may jump at the storage's breakpoints, so the reachable set is
/// searched piece by piece: the lower bound is the smallest inventory above which every
/// inventory can still reach `next.min`, and the upper bound the largest inventory below
/// which every inventory can still get down to `next.max`.
fn backward_range<T, S>(
    storage: &S,
    period: T,
    next: InventoryRange,
) -> Result<InventoryRange, ValuationError>
where
    T: TimePeriod,
    S: CmdtyStorage<T> + ?Sized,
{
    let min_inventory = storage.min_inventory(period);
    let max_inventory = storage.max_inventory(period);
    let retained = 1.0 - storage.inventory_percent_loss(period);
    let tol = ROOT_TOLERANCE * (1.0 + max_inventory.abs());

    let mut points = vec![min_inventory];
    points.extend(
        storage
            .inject_withdraw_breakpoints(period)
            .into_iter()
            .filter(|&b| b > min_inventory && b < max_inventory),
    );
    if max_inventory > min_inventory {
        points.push(max_inventory);
    }

    // Highest reachable next-period inventory, minus the required floor.
    let reach_floor = |x: f64| {
        x * retained + storage.inject_withdraw_range(period, x).max_inject_withdraw - next.min
    };
    // Lowest reachable next-period inventory, minus the allowed cap.
    let reach_cap = |x: f64| {
        x * retained + storage.inject_withdraw_range(period, x).min_inject_withdraw - next.max
    };

    let lo = match lowest_feasible(&points, reach_floor, tol)? {
        Some(lo) => lo,
        None => {
            let max_inject = storage
                .inject_withdraw_range(period, max_inventory)
                .max_inject_withdraw;
            (next.min - max_inject) / retained
        }
    };
    let hi = match highest_feasible(&points, reach_cap, tol)? {
        Some(hi) => hi,
        None => {
            let min_withdraw = storage
                .inject_withdraw_range(period, min_inventory)
                .min_inject_withdraw;
            (next.max - min_withdraw) / retained
        }
    };

    Ok(InventoryRange::new(lo, hi))
}

/// Smallest `x` with `f >= 0` on all of `[x, max]`, scanning pieces down from the top.
///
/// `None` when `f(max) < 0`.
fn lowest_feasible<F>(points: &[f64], f: F, tol: f64) -> Result<Option<f64>, ValuationError>
where
    F: Fn(f64) -> f64,
{
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Ok(None);
    };
    if f(last) < 0.0 {
        return Ok(None);
    }
    for piece in points.windows(2).rev() {
        let (a, b) = (piece[0], piece[1]);
        // Left limit at b; b itself belongs to the piece above, already feasible.
        let inner = (b - tol).max(a);
        if f(inner) < 0.0 {
            return Ok(Some(b));
        }
        if f(a) < 0.0 {
            let (_, feasible) = bisection_bracket(&f, a, inner, tol, ROOT_MAX_ITER)?;
            return Ok(Some(feasible));
        }
    }
    Ok(Some(first))
}

/// Largest `x` with `f <= 0` on all of `[min, x]`, scanning pieces up from the bottom.
///
/// `None` when `f(min) > 0`.
fn highest_feasible<F>(points: &[f64], f: F, tol: f64) -> Result<Option<f64>, ValuationError>
where
    F: Fn(f64) -> f64,
{
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Ok(None);
    };
    if f(first) > 0.0 {
        return Ok(None);
    }
    for piece in points.windows(2) {
        let (a, b) = (piece[0], piece[1]);
        if f(a) > 0.0 {
            // Jump at a: the piece below was feasible up to its left limit.
            return Ok(Some((a - tol).max(first)));
        }
        let inner = (b - tol).max(a);
        if f(inner) > 0.0 {
            let (feasible, _) = bisection_bracket(&f, a, inner, tol, ROOT_MAX_ITER)?;
            return Ok(Some(feasible));
        }
    }
    if f(last) > 0.0 {
        return Ok(Some((last - tol).max(first)));
    }
    Ok(Some(last))
}
