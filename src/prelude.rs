//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the kodo crate so hosts can
//! pull in the core surface with a single import.
//!
//! # Example
//!
//! ```rust,no_run
//! use kodo::prelude::*;
//!
//! struct Drone;
//! impl Agent for Drone {
//!     fn invoke(&mut self, call: &str, _args: &[Literal]) -> Option<CallValue> {
//!         match call {
//!             "IsCharged" => Some(true.into()),
//!             "TakeOff" => Some(State::Succeeded.into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let mut tree = BehaviorTree::new(
//!     "root { sequence { condition [IsCharged] action [TakeOff] } }",
//!     &registry,
//! )?;
//! tree.step(&mut Drone, &registry)?;
//! # Ok(())
//! # }
//! ```

// Core facade
pub use crate::registry::Registry;
pub use crate::tree::{BehaviorTree, TreeDefinition};

// Agent-facing contract
pub use crate::agent::{Agent, CallValue, Deferred};

// Definition model
pub use crate::definition::{
    AttributeDefinitions, Bounds, CallDefinition, Literal, NodeDefinition, parse_text,
};

// Runtime introspection
pub use crate::runtime::{
    AttributeDetails, AttributeKind, NodeDetails, NodeStateChange, NodeType, State, TickOptions,
};

// Error types
pub use crate::error::{BuildError, DefinitionError, ResolutionError, TickError};
