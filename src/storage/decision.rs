//! Candidate decisions at a grid point.
//!
//! With a value function concave in inventory the optimum sits on an extreme point
//! of the feasible decision interval: the lowest or highest admissible volume, or
//! doing nothing. Only those are evaluated.

use crate::core::{InjectWithdrawRange, ValuationError};

/// Extreme-point decisions landing inside `[next_min, next_max]` after loss.
///
/// The set holds `0.0` first when it lies strictly inside the feasible interval,
/// followed by the lowest and the highest feasible volume. A feasible interval empty
/// by no more than `tolerance` collapses to the boundary decision nearest to it;
/// anything wider is [`ValuationError::Infeasible`].
pub fn bang_bang_decision_set(
    range: InjectWithdrawRange,
    inventory: f64,
    inventory_loss: f64,
    next_min: f64,
    next_max: f64,
    tolerance: f64,
) -> Result<Vec<f64>, ValuationError> {
    let after_loss = inventory - inventory_loss;
    let hit_next_min = next_min - after_loss;
    let hit_next_max = next_max - after_loss;

    if range.max_inject_withdraw < hit_next_min {
        if hit_next_min - range.max_inject_withdraw <= tolerance {
            return Ok(vec![range.max_inject_withdraw]);
        }
        return Err(ValuationError::Infeasible(format!(
            "inventory {inventory} cannot reach next period minimum {next_min}"
        )));
    }
    if range.min_inject_withdraw > hit_next_max {
        if range.min_inject_withdraw - hit_next_max <= tolerance {
            return Ok(vec![range.min_inject_withdraw]);
        }
        return Err(ValuationError::Infeasible(format!(
            "inventory {inventory} cannot get down to next period maximum {next_max}"
        )));
    }

    let lowest = range.min_inject_withdraw.max(hit_next_min);
    let highest = range.max_inject_withdraw.min(hit_next_max);
    if lowest > highest {
        if lowest - highest <= tolerance {
            return Ok(vec![highest]);
        }
        return Err(ValuationError::Infeasible(format!(
            "next period inventory range [{next_min}, {next_max}] is empty"
        )));
    }

    let mut decisions = Vec::with_capacity(3);
    if lowest < 0.0 && highest > 0.0 {
        decisions.push(0.0);
    }
    decisions.push(lowest);
    if highest > lowest {
        decisions.push(highest);
    }
    Ok(decisions)
}
