//! The agent-facing call contract.
//!
//! The engine never inspects an agent beyond "does it have a callable with
//! this name". Actions, conditions, guards and callback hooks are all resolved
//! through [`Agent::invoke`] first, falling back to functions registered on
//! the [`Registry`](crate::registry::Registry).

use crate::definition::Literal;
use crate::runtime::State;
use std::cell::RefCell;
use std::rc::Rc;

/// An external object exposing named callables the tree invokes for actions,
/// conditions and callbacks.
pub trait Agent {
    /// Invokes the named callable with the declared literal arguments.
    ///
    /// Returning `None` means the agent has no callable with this name; the
    /// engine then falls back to the registry, and if that also fails the
    /// tick errors with an unknown-call failure.
    fn invoke(&mut self, call: &str, args: &[Literal]) -> Option<CallValue>;
}

/// What an agent callable returned.
#[derive(Debug, Clone)]
pub enum CallValue {
    /// No result. Callbacks always produce this; an action producing it stays
    /// RUNNING and is invoked again on the next tick.
    Void,
    /// A condition or guard verdict.
    Bool(bool),
    /// A terminal action result, SUCCEEDED or FAILED.
    State(State),
    /// An action result that will arrive later through a [`Deferred`].
    Deferred(Deferred),
}

impl From<bool> for CallValue {
    fn from(value: bool) -> Self {
        CallValue::Bool(value)
    }
}

impl From<State> for CallValue {
    fn from(state: State) -> Self {
        CallValue::State(state)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeferredStatus {
    Pending,
    Resolved(State),
    Rejected(String),
}

/// The settlement cell for an asynchronous action result.
///
/// The action call hands one clone back to the engine and keeps another;
/// settling it at any later point is observed by the action node on its next
/// update, never synchronously. The first settlement wins; later calls are
/// ignored. A node that is reset or aborted while a settlement is outstanding
/// drops its clone, so a late settlement lands in a cell nothing observes.
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    cell: Rc<RefCell<Option<DeferredStatus>>>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles the computation with a terminal state. Settling with anything
    /// other than SUCCEEDED or FAILED is a contract violation reported on the
    /// observing tick.
    pub fn resolve(&self, state: State) {
        let mut cell = self.cell.borrow_mut();
        if cell.is_none() {
            *cell = Some(DeferredStatus::Resolved(state));
        }
    }

    /// Settles the computation with a failure reason, reported as a fatal
    /// error on the observing tick.
    pub fn reject(&self, reason: impl Into<String>) {
        let mut cell = self.cell.borrow_mut();
        if cell.is_none() {
            *cell = Some(DeferredStatus::Rejected(reason.into()));
        }
    }

    pub fn is_settled(&self) -> bool {
        self.cell.borrow().is_some()
    }

    pub(crate) fn status(&self) -> DeferredStatus {
        self.cell
            .borrow()
            .clone()
            .unwrap_or(DeferredStatus::Pending)
    }
}
