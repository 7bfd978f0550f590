//! Tick logic for the composite node kinds.
//!
//! Children are always processed in declaration order; a composite that
//! discards still-running children does so through their `abort`, so exit
//! callbacks observe the cancellation.

use super::node::BehaviorNode;
use super::{State, TickContext};
use crate::error::{Interrupt, TickError};

pub(super) fn tick_sequence(
    children: &mut [BehaviorNode],
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    let last = children.len() - 1;
    for (index, child) in children.iter_mut().enumerate() {
        if !child.state().is_terminal() {
            child.update(ctx)?;
        }
        match child.state() {
            State::Succeeded if index == last => return Ok(State::Succeeded),
            State::Succeeded => continue,
            State::Failed => return Ok(State::Failed),
            State::Running => return Ok(State::Running),
            unexpected => return Err(unexpected_child_state(child, unexpected)),
        }
    }
    // Composites are validated to have at least one child, and the last child
    // always returns out of the loop.
    Ok(State::Succeeded)
}

pub(super) fn tick_selector(
    children: &mut [BehaviorNode],
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    let last = children.len() - 1;
    for (index, child) in children.iter_mut().enumerate() {
        if !child.state().is_terminal() {
            child.update(ctx)?;
        }
        match child.state() {
            State::Succeeded => return Ok(State::Succeeded),
            State::Failed if index == last => return Ok(State::Failed),
            State::Failed => continue,
            State::Running => return Ok(State::Running),
            unexpected => return Err(unexpected_child_state(child, unexpected)),
        }
    }
    Ok(State::Failed)
}

pub(super) fn tick_parallel(
    children: &mut [BehaviorNode],
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    let mut child_failed = false;
    for child in children.iter_mut() {
        if !child.state().is_terminal() {
            child.update(ctx)?;
        }
        match child.state() {
            State::Succeeded | State::Running => continue,
            State::Failed => {
                // Children not yet visited this pass are left for the abort
                // sweep below.
                child_failed = true;
                break;
            }
            unexpected => return Err(unexpected_child_state(child, unexpected)),
        }
    }

    if child_failed {
        for child in children.iter_mut() {
            if child.state() == State::Running {
                child.abort(ctx)?;
            }
        }
        return Ok(State::Failed);
    }
    if children.iter().all(|child| child.state() == State::Succeeded) {
        Ok(State::Succeeded)
    } else {
        Ok(State::Running)
    }
}

/// On the first update of a run, one weighted draw picks the single child
/// driven for the remainder of that run; the node then mirrors that child's
/// state. Ticket counts beyond the child list are ignored; children without a
/// ticket entry weigh 1.
pub(super) fn tick_lotto(
    tickets: &[u64],
    selected: &mut Option<usize>,
    children: &mut [BehaviorNode],
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    let index = match *selected {
        Some(index) => index,
        None => {
            let drawn = draw_weighted(tickets, children.len(), ctx);
            *selected = Some(drawn);
            drawn
        }
    };

    let child = &mut children[index];
    if !child.state().is_terminal() {
        child.update(ctx)?;
    }
    Ok(child.state())
}

fn draw_weighted(tickets: &[u64], count: usize, ctx: &mut TickContext) -> usize {
    let weight_of = |index: usize| tickets.get(index).copied().unwrap_or(1);
    let total: u64 = (0..count).map(weight_of).sum();
    if total == 0 {
        // Every covered weight is zero; fall back to a uniform pick.
        return ((ctx.random() * count as f64) as usize).min(count - 1);
    }

    let mut threshold = (ctx.random() * total as f64) as u64;
    for index in 0..count {
        let weight = weight_of(index);
        if threshold < weight {
            return index;
        }
        threshold -= weight;
    }
    count - 1
}

pub(super) fn unexpected_child_state(child: &BehaviorNode, state: State) -> Interrupt {
    TickError::UnexpectedChildState {
        child: child.display_name(),
        state,
    }
    .into()
}
