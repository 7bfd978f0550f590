//! Tick logic for the leaf node kinds.

use super::guard::describe;
use super::{State, TickContext};
use crate::agent::{CallValue, Deferred, DeferredStatus};
use crate::definition::{Bounds, CallDefinition};
use crate::error::{Interrupt, TickError};
use std::time::Instant;

/// Invokes the bound action call, or observes a previously returned deferred
/// result. A pending deferred keeps the node RUNNING without re-invoking the
/// call; settlement is only ever observed here, on the tick after it happens.
pub(super) fn tick_action(
    call: &CallDefinition,
    pending: &mut Option<Deferred>,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if let Some(deferred) = pending.as_ref() {
        let status = deferred.status();
        return match status {
            DeferredStatus::Pending => Ok(State::Running),
            DeferredStatus::Resolved(state @ (State::Succeeded | State::Failed)) => {
                *pending = None;
                Ok(state)
            }
            DeferredStatus::Resolved(state) => Err(TickError::InvalidDeferredState {
                call: call.call.clone(),
                state,
            }
            .into()),
            DeferredStatus::Rejected(reason) => Err(TickError::RejectedDeferred {
                call: call.call.clone(),
                reason,
            }
            .into()),
        };
    }

    match ctx.invoke(&call.call, &call.args)? {
        CallValue::Void => Ok(State::Running),
        CallValue::State(state @ (State::Succeeded | State::Failed)) => Ok(state),
        CallValue::Deferred(deferred) => {
            *pending = Some(deferred);
            Ok(State::Running)
        }
        other => Err(TickError::InvalidCallResult {
            call: call.call.clone(),
            expected: "SUCCEEDED, FAILED, nothing, or a deferred result",
            found: describe(&other),
        }
        .into()),
    }
}

/// Invokes the bound condition call synchronously; the result must be a
/// boolean and the node is never left RUNNING.
pub(super) fn tick_condition(
    call: &CallDefinition,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    match ctx.invoke(&call.call, &call.args)? {
        CallValue::Bool(true) => Ok(State::Succeeded),
        CallValue::Bool(false) => Ok(State::Failed),
        other => Err(TickError::InvalidCallResult {
            call: call.call.clone(),
            expected: "a boolean",
            found: describe(&other),
        }
        .into()),
    }
}

/// Waits out a duration fixed at the first tick of a run: configured, drawn
/// from an inclusive range, or indefinite when none is given. Elapsed time
/// advances through the injected delta-time source when present, else by
/// wall-clock difference from the start of the run.
pub(super) fn tick_wait(
    duration: Option<Bounds>,
    started: &mut Option<Instant>,
    elapsed_ms: &mut f64,
    total_ms: &mut Option<f64>,
    current: State,
    ctx: &mut TickContext,
) -> Result<State, Interrupt> {
    if current == State::Ready {
        *started = Some(Instant::now());
        *elapsed_ms = 0.0;
        *total_ms = duration.map(|bounds| match bounds {
            Bounds::Fixed(value) => value as f64,
            Bounds::Range([lower, upper]) => ctx.random_in_range(lower, upper) as f64,
        });
    }

    if let Some(delta_seconds) = ctx.delta_time() {
        *elapsed_ms += delta_seconds * 1000.0;
    } else if let Some(start) = started {
        *elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    }

    match *total_ms {
        Some(total) if *elapsed_ms >= total => Ok(State::Succeeded),
        _ => Ok(State::Running),
    }
}
