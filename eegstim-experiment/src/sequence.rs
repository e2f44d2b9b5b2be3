//! Balanced, run-length-limited trial orders.
//!
//! Orders are built by weighted rejection sampling: every step draws uniformly from a pool
//! holding one entry per remaining trial of each condition that may still be placed, so
//! the condition with more trials left is proportionally more likely. A dead end abandons
//! the attempt and the whole construction starts over, up to a fixed budget.

use eegstim_core::{Condition, Payload, Trial};
use rand::Rng;
use tracing::debug;

use crate::error::SequenceError;

/// Draws an order with exactly `per_state` trials of each condition and no run longer than
/// `max_run`.
pub fn generate_conditions<R: Rng>(
    per_state: usize,
    max_run: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<Condition>, SequenceError> {
    for attempt in 1..=max_attempts {
        if let Some(order) = try_build(per_state, max_run, rng) {
            debug!(attempt, per_state, max_run, "sequence generated");
            return Ok(order);
        }
    }
    Err(SequenceError::Exhausted {
        trials_per_state: per_state,
        max_run,
        attempts: max_attempts,
    })
}

fn try_build<R: Rng>(per_state: usize, max_run: usize, rng: &mut R) -> Option<Vec<Condition>> {
    let total = per_state.checked_mul(2)?;
    let mut remaining = [per_state; 2];
    let mut order = Vec::with_capacity(total);
    let mut pool = Vec::with_capacity(total);
    let mut last: Option<Condition> = None;
    let mut streak = 0usize;

    while order.len() < total {
        pool.clear();
        for condition in Condition::ALL {
            let next_streak = if last == Some(condition) { streak + 1 } else { 1 };
            if next_streak > max_run {
                continue;
            }
            pool.extend(std::iter::repeat_n(condition, remaining[condition.index()]));
        }
        if pool.is_empty() {
            return None;
        }

        let pick = pool[rng.random_range(0..pool.len())];
        remaining[pick.index()] -= 1;
        streak = if last == Some(pick) { streak + 1 } else { 1 };
        last = Some(pick);
        order.push(pick);
    }
    Some(order)
}

/// Attaches a fresh arithmetic prompt to every active slot, in presentation order.
pub fn attach_payloads<R: Rng>(
    order: &[Condition],
    start_range: (u32, u32),
    decrement_range: (u32, u32),
    rng: &mut R,
) -> Vec<Trial> {
    order
        .iter()
        .map(|condition| match condition {
            Condition::Active => {
                let start = rng.random_range(start_range.0..=start_range.1);
                let decrement = rng.random_range(decrement_range.0..=decrement_range.1);
                Trial::active(Payload { start, decrement })
            }
            Condition::Rest => Trial::rest(),
        })
        .collect()
}

/// Length of the longest block of identical neighbours.
pub fn longest_run(order: &[Condition]) -> usize {
    order
        .chunk_by(|a, b| a == b)
        .map(<[Condition]>::len)
        .max()
        .unwrap_or(0)
}
