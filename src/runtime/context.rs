//! Per-tick context: the agent, the registry, and the caller-injected hooks.

use super::{AttributeDetails, NodeType, State};
use crate::agent::{Agent, CallValue};
use crate::definition::{CallDefinition, Literal};
use crate::error::TickError;
use crate::registry::Registry;
use rand::Rng;
use serde::Serialize;

/// Optional hooks injected by the caller for one or more ticks.
///
/// `delta_time` reports elapsed seconds per call and drives `wait` nodes;
/// without it they fall back to wall-clock time. `random` supplies uniform
/// values in `[0,1)` for weighted lotto draws and ranged bounds; without it
/// the thread-local generator is used. `on_state_change` observes every node
/// state transition.
#[derive(Default)]
pub struct TickOptions {
    pub delta_time: Option<Box<dyn FnMut() -> f64>>,
    pub random: Option<Box<dyn FnMut() -> f64>>,
    pub on_state_change: Option<Box<dyn FnMut(&NodeStateChange)>>,
}

/// A node state transition reported to the `on_state_change` observer.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStateChange {
    pub id: u64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub previous: State,
    pub next: State,
    pub attributes: Vec<AttributeDetails>,
}

/// Everything a recursive update pass needs, threaded through the call chain.
pub(crate) struct TickContext<'a> {
    agent: &'a mut dyn Agent,
    registry: &'a Registry,
    options: &'a mut TickOptions,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        agent: &'a mut dyn Agent,
        registry: &'a Registry,
        options: &'a mut TickOptions,
    ) -> Self {
        Self {
            agent,
            registry,
            options,
        }
    }

    /// Resolves and invokes a named callable: a like-named callable on the
    /// agent wins, else a registered global function (given the agent as its
    /// first argument), else the call fails to bind.
    pub(crate) fn invoke(&mut self, call: &str, args: &[Literal]) -> Result<CallValue, TickError> {
        if let Some(value) = self.agent.invoke(call, args) {
            return Ok(value);
        }
        let function = self.registry.function(call);
        match function {
            Some(function) => Ok(function(self.agent, args)),
            None => Err(TickError::UnknownCall {
                call: call.to_string(),
            }),
        }
    }

    /// Invokes a callback attribute, discarding its result. Exit callbacks
    /// receive their `(succeeded, aborted)` flags appended as two trailing
    /// boolean arguments.
    pub(crate) fn invoke_callback(
        &mut self,
        definition: &CallDefinition,
        exit_flags: Option<(bool, bool)>,
    ) -> Result<(), TickError> {
        match exit_flags {
            Some((succeeded, aborted)) => {
                let mut args = definition.args.clone();
                args.push(Literal::Bool(succeeded));
                args.push(Literal::Bool(aborted));
                self.invoke(&definition.call, &args)?;
            }
            None => {
                self.invoke(&definition.call, &definition.args)?;
            }
        }
        Ok(())
    }

    /// A uniform value in `[0,1)` from the injected source, falling back to
    /// the thread-local generator.
    pub(crate) fn random(&mut self) -> f64 {
        match &mut self.options.random {
            Some(random) => random(),
            None => rand::rng().random(),
        }
    }

    /// Draws a uniform integer from an inclusive range through `random`.
    pub(crate) fn random_in_range(&mut self, lower: u64, upper: u64) -> u64 {
        let span = (upper - lower + 1) as f64;
        (lower + (self.random() * span) as u64).min(upper)
    }

    pub(crate) fn delta_time(&mut self) -> Option<f64> {
        self.options.delta_time.as_mut().map(|delta| delta())
    }

    pub(crate) fn observes_state_changes(&self) -> bool {
        self.options.on_state_change.is_some()
    }

    pub(crate) fn notify_state_change(&mut self, change: NodeStateChange) {
        if let Some(observer) = &mut self.options.on_state_change {
            observer(&change);
        }
    }
}
