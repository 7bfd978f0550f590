//! The runtime node model: the executable counterpart of a definition.
//!
//! Every node shares one state-machine contract (`update`, `abort`, `reset`)
//! over the closed set of node kinds; kind-specific tick logic lives in
//! [`composite`], [`decorator`] and [`leaf`].

use crate::definition::Literal;
use serde::Serialize;
use std::fmt;

mod composite;
mod context;
mod decorator;
mod guard;
mod leaf;
mod node;

pub use context::{NodeStateChange, TickOptions};
pub(crate) use context::TickContext;
pub(crate) use guard::GuardPath;
pub(crate) use node::{BehaviorNode, NodeAttributes, NodeKind};

/// The execution state of a runtime node.
///
/// Terminal states (SUCCEEDED, FAILED) are sticky: once reached, further
/// updates are no-ops until an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Ready,
    Running,
    Succeeded,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Succeeded | State::Failed)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            State::Ready => "READY",
            State::Running => "RUNNING",
            State::Succeeded => "SUCCEEDED",
            State::Failed => "FAILED",
        };
        write!(f, "{}", label)
    }
}

/// The closed set of runtime node kinds. Branch nodes are resolved away at
/// instantiation and never appear at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    Sequence,
    Selector,
    Parallel,
    Lotto,
    Repeat,
    Retry,
    Flip,
    Succeed,
    Fail,
    Action,
    Condition,
    Wait,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeType::Root => "root",
            NodeType::Sequence => "sequence",
            NodeType::Selector => "selector",
            NodeType::Parallel => "parallel",
            NodeType::Lotto => "lotto",
            NodeType::Repeat => "repeat",
            NodeType::Retry => "retry",
            NodeType::Flip => "flip",
            NodeType::Succeed => "succeed",
            NodeType::Fail => "fail",
            NodeType::Action => "action",
            NodeType::Condition => "condition",
            NodeType::Wait => "wait",
        };
        write!(f, "{}", label)
    }
}

/// The attribute kinds a node can carry, at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    While,
    Until,
    Entry,
    Step,
    Exit,
}

/// Introspection details of a single bound attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDetails {
    pub kind: AttributeKind,
    pub call: String,
    pub args: Vec<Literal>,
}

/// Introspection details of a single runtime node, as produced by
/// [`BehaviorTree::flattened_details`](crate::tree::BehaviorTree::flattened_details)
/// in pre-order.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetails {
    pub id: u64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub state: State,
    pub attributes: Vec<AttributeDetails>,
    pub args: Vec<Literal>,
    pub parent_id: Option<u64>,
}
