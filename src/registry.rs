//! Name lookup for globally registered functions and subtrees.
//!
//! The registry is an explicit, caller-owned object injected into both tree
//! builds (subtree resolution) and ticks (callable fallback); nothing in the
//! crate holds global state. It is deliberately shared between trees and
//! agents, with no synchronisation beyond what the host provides.

use crate::agent::{Agent, CallValue};
use crate::definition::{Literal, NodeDefinition};
use crate::error::{BuildError, DefinitionError};
use ahash::AHashMap;

/// A registered global function: invoked with the agent first, then the
/// declared literal arguments, when the agent itself has no callable with the
/// requested name.
pub type AgentFunction = dyn Fn(&mut dyn Agent, &[Literal]) -> CallValue;

#[derive(Default)]
pub struct Registry {
    functions: AHashMap<String, Box<AgentFunction>>,
    subtrees: AHashMap<String, NodeDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a global callback under a name, replacing any previous
    /// function with that name.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(&mut dyn Agent, &[Literal]) -> CallValue + 'static,
    ) {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Registers a subtree definition under a name. The definition must be a
    /// structurally valid root node; its own name field is overwritten by the
    /// registered name. Locally defined roots take priority over registered
    /// ones on name collision at build time.
    pub fn register_subtree(
        &mut self,
        name: impl Into<String>,
        definition: NodeDefinition,
    ) -> Result<(), BuildError> {
        let name = name.into();
        let mut root = match definition {
            NodeDefinition::Root(root) => root,
            _ => return Err(DefinitionError::ExpectedRoot.into()),
        };
        root.child.validate(1).map_err(BuildError::Definition)?;
        root.name = Some(name.clone());
        self.subtrees.insert(name, NodeDefinition::Root(root));
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&AgentFunction> {
        self.functions.get(name).map(|function| &**function)
    }

    pub fn subtree(&self, name: &str) -> Option<&NodeDefinition> {
        self.subtrees.get(name)
    }

    /// Removes both the function and the subtree registered under a name.
    pub fn remove(&mut self, name: &str) {
        self.functions.remove(name);
        self.subtrees.remove(name);
    }

    /// Clears every registered function and subtree.
    pub fn clear(&mut self) {
        self.functions.clear();
        self.subtrees.clear();
    }
}
