//! # Kodo - Behaviour Tree Compilation and Ticking Engine
//!
//! **Kodo** is an embeddable decision-making engine: a small domain-specific
//! language (or an equivalent structured definition) describes a hierarchical
//! behaviour tree, which is compiled into a tree of runtime nodes and then
//! repeatedly "ticked" against a caller-supplied agent to drive step-wise,
//! resumable decision logic — game AI, robotics, or any reactive control loop.
//!
//! ## Core Workflow
//!
//! 1.  **Define**: Write a tree as DSL text, or build the structured
//!     [`NodeDefinition`](definition::NodeDefinition) model directly (it is
//!     `serde`-ready, so JSON works too). Both forms produce identical trees.
//! 2.  **Register** (optional): Put shared subtrees and global fallback
//!     functions into a [`Registry`](registry::Registry). The registry is an
//!     explicit object you own — there is no hidden global state.
//! 3.  **Build**: [`BehaviorTree::new`](tree::BehaviorTree::new) validates the
//!     definition, resolves branch references, and precomputes the guard path
//!     of every node.
//! 4.  **Tick**: Call [`step`](tree::BehaviorTree::step) once per update of
//!     your control loop. Node state is preserved between ticks, in-flight
//!     asynchronous actions stay pending, and ancestor guards abort deeply
//!     nested running nodes without any per-tick tree walk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kodo::prelude::*;
//!
//! struct Guard {
//!     enemy_visible: bool,
//! }
//!
//! impl Agent for Guard {
//!     fn invoke(&mut self, call: &str, _args: &[Literal]) -> Option<CallValue> {
//!         match call {
//!             "EnemyVisible" => Some(self.enemy_visible.into()),
//!             "Attack" => Some(State::Succeeded.into()),
//!             "Patrol" => Some(State::Succeeded.into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::new();
//!     let mut tree = BehaviorTree::new(
//!         r#"root {
//!             selector {
//!                 sequence while(EnemyVisible) {
//!                     action [Attack]
//!                 }
//!                 action [Patrol]
//!             }
//!         }"#,
//!         &registry,
//!     )?;
//!
//!     let mut agent = Guard { enemy_visible: false };
//!     tree.step(&mut agent, &registry)?;
//!     println!("tree state: {}", tree.state());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod definition;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod runtime;
pub mod tree;

mod compiler;
