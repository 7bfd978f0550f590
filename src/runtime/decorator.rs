//! Tick logic for the decorator node kinds, root included.

use super::composite::unexpected_child_state;
use super::node::BehaviorNode;
use super::{State, TickContext};
use crate::definition::Bounds;
use crate::error::Interrupt;

/// Pure passthrough of the single child; exists to anchor guard paths and the
/// public entry point.
pub(super) fn tick_root(
    child: &mut BehaviorNode,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if !child.state().is_terminal() {
        child.update(ctx)?;
    }
    Ok(child.state())
}

/// Drives the child to SUCCEEDED a target number of times: a fixed count, a
/// count drawn from an inclusive range, or unbounded when no count is given.
/// One child iteration is driven per tick; a child failure fails the repeat
/// outright.
pub(super) fn tick_repeat(
    iterations: Option<Bounds>,
    target: &mut Option<u64>,
    completed: &mut u64,
    child: &mut BehaviorNode,
    current: State,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if current == State::Ready {
        child.reset();
        *completed = 0;
        *target = iterations.map(|bounds| resolve_bounds(bounds, ctx));
    }

    let can_iterate = match (iterations, *target) {
        (None, _) => true,
        (Some(_), Some(count)) => *completed < count,
        // A configured target is always resolved on the READY tick.
        (Some(_), None) => true,
    };
    if !can_iterate {
        return Ok(State::Succeeded);
    }

    if child.state() == State::Succeeded {
        child.reset();
    }
    child.update(ctx)?;
    match child.state() {
        State::Failed => Ok(State::Failed),
        State::Succeeded => {
            *completed += 1;
            Ok(State::Running)
        }
        State::Running => Ok(State::Running),
        unexpected => Err(unexpected_child_state(child, unexpected)),
    }
}

/// Mirror of repeat with success and failure swapped: retries the child until
/// it succeeds, failing once the configured attempts are exhausted.
pub(super) fn tick_retry(
    attempts: Option<Bounds>,
    target: &mut Option<u64>,
    failed: &mut u64,
    child: &mut BehaviorNode,
    current: State,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if current == State::Ready {
        child.reset();
        *failed = 0;
        *target = attempts.map(|bounds| resolve_bounds(bounds, ctx));
    }

    let can_attempt = match (attempts, *target) {
        (None, _) => true,
        (Some(_), Some(count)) => *failed < count,
        (Some(_), None) => true,
    };
    if !can_attempt {
        return Ok(State::Failed);
    }

    if child.state() == State::Failed {
        child.reset();
    }
    child.update(ctx)?;
    match child.state() {
        State::Succeeded => Ok(State::Succeeded),
        State::Failed => {
            *failed += 1;
            Ok(State::Running)
        }
        State::Running => Ok(State::Running),
        unexpected => Err(unexpected_child_state(child, unexpected)),
    }
}

/// Mirrors the child but swaps SUCCEEDED and FAILED.
pub(super) fn tick_flip(
    child: &mut BehaviorNode,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if !child.state().is_terminal() {
        child.update(ctx)?;
    }
    Ok(match child.state() {
        State::Succeeded => State::Failed,
        State::Failed => State::Succeeded,
        other => other,
    })
}

/// Mirrors RUNNING but forces any terminal child state to SUCCEEDED.
pub(super) fn tick_succeed(
    child: &mut BehaviorNode,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if !child.state().is_terminal() {
        child.update(ctx)?;
    }
    match child.state() {
        State::Succeeded | State::Failed => Ok(State::Succeeded),
        State::Running => Ok(State::Running),
        unexpected => Err(unexpected_child_state(child, unexpected)),
    }
}

/// Mirrors RUNNING but forces any terminal child state to FAILED.
pub(super) fn tick_fail(
    child: &mut BehaviorNode,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if !child.state().is_terminal() {
        child.update(ctx)?;
    }
    match child.state() {
        State::Succeeded | State::Failed => Ok(State::Failed),
        State::Running => Ok(State::Running),
        unexpected => Err(unexpected_child_state(child, unexpected)),
    }
}

fn resolve_bounds(bounds: Bounds, ctx: &mut TickContext) -> u64 {
    match bounds {
        Bounds::Fixed(value) => value,
        Bounds::Range([lower, upper]) => ctx.random_in_range(lower, upper),
    }
}
