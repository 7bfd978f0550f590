//! The canonical definition model for a behaviour tree.
//!
//! A definition is an array of root nodes: exactly one unnamed primary root
//! plus any number of named subtree roots referenced by `branch` nodes. The
//! model is the target of both input forms — the text DSL (via [`parse_text`])
//! and structured data (via `serde`, using a lowercase `"type"` discriminator)
//! — so that both produce identical runtime trees.

use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use std::fmt;

mod parser;
mod tokenizer;

pub use parser::parse_text;

/// A literal argument value carried by a definition and handed to agent
/// callables at tick time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// A named agent/registry callable plus the literal arguments it is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDefinition {
    pub call: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Literal>,
}

impl CallDefinition {
    pub fn new(call: impl Into<String>, args: Vec<Literal>) -> Self {
        Self {
            call: call.into(),
            args,
        }
    }
}

/// The optional attribute set of a node: two guard kinds and three callback
/// hooks, at most one of each.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeDefinitions {
    #[serde(rename = "while", default, skip_serializing_if = "Option::is_none")]
    pub while_guard: Option<CallDefinition>,
    #[serde(rename = "until", default, skip_serializing_if = "Option::is_none")]
    pub until_guard: Option<CallDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<CallDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<CallDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<CallDefinition>,
}

impl AttributeDefinitions {
    pub fn is_empty(&self) -> bool {
        self.while_guard.is_none()
            && self.until_guard.is_none()
            && self.entry.is_none()
            && self.step.is_none()
            && self.exit.is_none()
    }
}

/// A fixed value or an inclusive `[lower, upper]` range, resolved at tick time
/// (ranges draw through the injected random source).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bounds {
    Fixed(u64),
    Range([u64; 2]),
}

impl Bounds {
    pub(crate) fn validate(&self, node: &'static str) -> Result<(), DefinitionError> {
        match *self {
            Bounds::Fixed(_) => Ok(()),
            Bounds::Range([lower, upper]) if lower <= upper => Ok(()),
            Bounds::Range([lower, upper]) => Err(DefinitionError::InvalidBounds {
                node,
                lower,
                upper,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
    pub child: Box<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchDefinition {
    #[serde(rename = "ref")]
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeDefinition {
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
    pub children: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LottoDefinition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<u64>,
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
    pub children: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<Bounds>,
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
    pub child: Box<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Bounds>,
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
    pub child: Box<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratorDefinition {
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
    pub child: Box<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Bounds>,
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafCallDefinition {
    pub call: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Literal>,
    #[serde(flatten)]
    pub attributes: AttributeDefinitions,
}

/// A single node definition, discriminated by its `"type"` field in the
/// structured form and by its leading keyword in the DSL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeDefinition {
    Root(RootDefinition),
    Branch(BranchDefinition),
    Sequence(CompositeDefinition),
    Selector(CompositeDefinition),
    Parallel(CompositeDefinition),
    Lotto(LottoDefinition),
    Repeat(RepeatDefinition),
    Retry(RetryDefinition),
    Flip(DecoratorDefinition),
    Succeed(DecoratorDefinition),
    Fail(DecoratorDefinition),
    Wait(WaitDefinition),
    Action(LeafCallDefinition),
    Condition(LeafCallDefinition),
}

impl NodeDefinition {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeDefinition::Root(_) => "root",
            NodeDefinition::Branch(_) => "branch",
            NodeDefinition::Sequence(_) => "sequence",
            NodeDefinition::Selector(_) => "selector",
            NodeDefinition::Parallel(_) => "parallel",
            NodeDefinition::Lotto(_) => "lotto",
            NodeDefinition::Repeat(_) => "repeat",
            NodeDefinition::Retry(_) => "retry",
            NodeDefinition::Flip(_) => "flip",
            NodeDefinition::Succeed(_) => "succeed",
            NodeDefinition::Fail(_) => "fail",
            NodeDefinition::Wait(_) => "wait",
            NodeDefinition::Action(_) => "action",
            NodeDefinition::Condition(_) => "condition",
        }
    }

    /// Recursive depth-first structural validation. Depth 0 is the definition
    /// level, where only root nodes may appear; roots may appear nowhere else.
    pub fn validate(&self, depth: usize) -> Result<(), DefinitionError> {
        match self {
            NodeDefinition::Root(root) => {
                if depth > 0 {
                    return Err(DefinitionError::NestedRoot);
                }
                root.child.validate(depth + 1)
            }
            NodeDefinition::Branch(_) => Ok(()),
            NodeDefinition::Sequence(composite)
            | NodeDefinition::Selector(composite)
            | NodeDefinition::Parallel(composite) => {
                Self::validate_children(self.type_name(), &composite.children, depth)
            }
            NodeDefinition::Lotto(lotto) => {
                Self::validate_children("lotto", &lotto.children, depth)
            }
            NodeDefinition::Repeat(repeat) => {
                if let Some(bounds) = repeat.iterations {
                    bounds.validate("repeat")?;
                }
                repeat.child.validate(depth + 1)
            }
            NodeDefinition::Retry(retry) => {
                if let Some(bounds) = retry.attempts {
                    bounds.validate("retry")?;
                }
                retry.child.validate(depth + 1)
            }
            NodeDefinition::Flip(decorator)
            | NodeDefinition::Succeed(decorator)
            | NodeDefinition::Fail(decorator) => decorator.child.validate(depth + 1),
            NodeDefinition::Wait(wait) => match wait.duration {
                Some(bounds) => bounds.validate("wait"),
                None => Ok(()),
            },
            NodeDefinition::Action(_) | NodeDefinition::Condition(_) => Ok(()),
        }
    }

    fn validate_children(
        node: &'static str,
        children: &[NodeDefinition],
        depth: usize,
    ) -> Result<(), DefinitionError> {
        if children.is_empty() {
            return Err(DefinitionError::ExpectedChildren { node });
        }
        for child in children {
            child.validate(depth + 1)?;
        }
        Ok(())
    }
}
