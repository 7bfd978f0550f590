//! The public facade over the core: building, stepping and inspecting a
//! behaviour tree instance.

use crate::agent::Agent;
use crate::compiler;
use crate::definition::{NodeDefinition, parse_text};
use crate::error::{BuildError, Interrupt, TickError};
use crate::registry::Registry;
use crate::runtime::{BehaviorNode, NodeDetails, State, TickContext, TickOptions};

/// A tree definition in either input form. Both forms produce identical
/// runtime trees.
#[derive(Debug, Clone)]
pub enum TreeDefinition {
    /// DSL text in the node-type-keyword grammar.
    Text(String),
    /// An array of structured root definitions, exactly one of them unnamed.
    Structured(Vec<NodeDefinition>),
}

impl From<&str> for TreeDefinition {
    fn from(text: &str) -> Self {
        TreeDefinition::Text(text.to_string())
    }
}

impl From<String> for TreeDefinition {
    fn from(text: String) -> Self {
        TreeDefinition::Text(text)
    }
}

impl From<Vec<NodeDefinition>> for TreeDefinition {
    fn from(definitions: Vec<NodeDefinition>) -> Self {
        TreeDefinition::Structured(definitions)
    }
}

impl From<NodeDefinition> for TreeDefinition {
    fn from(definition: NodeDefinition) -> Self {
        TreeDefinition::Structured(vec![definition])
    }
}

/// An instantiated behaviour tree, stepped against an agent.
///
/// The tree owns its node state exclusively; the registry is injected into
/// both the build and every step so multiple trees and agents can share one.
pub struct BehaviorTree {
    root: BehaviorNode,
}

impl BehaviorTree {
    /// Builds a tree from a definition, resolving branch references against
    /// the definition's own named roots and the registry's subtrees.
    pub fn new(
        definition: impl Into<TreeDefinition>,
        registry: &Registry,
    ) -> Result<Self, BuildError> {
        let definitions = match definition.into() {
            TreeDefinition::Text(text) => parse_text(&text)?,
            TreeDefinition::Structured(definitions) => definitions,
        };
        let root = compiler::build(&definitions, registry)?;
        Ok(Self { root })
    }

    /// One synchronous tick of the tree against the agent, with default
    /// options (wall-clock waits, thread-local randomness, no observer).
    pub fn step(&mut self, agent: &mut dyn Agent, registry: &Registry) -> Result<(), TickError> {
        self.step_with(agent, registry, &mut TickOptions::default())
    }

    /// One synchronous tick with caller-supplied options. If the previous run
    /// left the root in a terminal state, the whole tree is reset first and
    /// a fresh run begins on this tick.
    ///
    /// A tick error leaves the tree in whatever partial state it reached;
    /// callers should treat the run as failed and may [`reset`](Self::reset)
    /// to retry.
    pub fn step_with(
        &mut self,
        agent: &mut dyn Agent,
        registry: &Registry,
        options: &mut TickOptions,
    ) -> Result<(), TickError> {
        if self.root.state().is_terminal() {
            self.root.reset();
        }
        let mut ctx = TickContext::new(agent, registry, options);
        match self.root.update(&mut ctx) {
            Ok(()) => Ok(()),
            Err(Interrupt::Failure(error)) => Err(error),
            // Every node of a built tree carries a guard path, so a guard
            // interrupt is always absorbed by the node that owns it.
            Err(Interrupt::Guard { .. }) => {
                unreachable!("unclaimed guard interrupt escaped the root node")
            }
        }
    }

    /// Resets every node back to READY.
    pub fn reset(&mut self) {
        self.root.reset();
    }

    pub fn state(&self) -> State {
        self.root.state()
    }

    pub fn is_running(&self) -> bool {
        self.root.state() == State::Running
    }

    /// Pre-order details for every node in the tree.
    pub fn flattened_details(&self) -> Vec<NodeDetails> {
        let mut details = Vec::new();
        self.root.flatten_details(None, &mut details);
        details
    }
}
