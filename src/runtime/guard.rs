//! Guard paths: the precomputed ancestor guard chains behind the unwind
//! protocol.

use super::TickContext;
use super::node::GuardKind;
use crate::agent::CallValue;
use crate::definition::CallDefinition;
use crate::error::{Interrupt, TickError};

/// One guard-declaring node along an ancestor chain.
#[derive(Debug, Clone)]
pub(crate) struct GuardPathPart {
    pub owner: u64,
    pub guards: Vec<(GuardKind, CallDefinition)>,
}

/// The ordered chain of every guard-declaring ancestor of a node, root to
/// self inclusive. Built once per node after instantiation and shared by
/// reference wherever the same ancestor chain recurs, so evaluation is a flat
/// O(depth) sweep of boolean calls on every tick.
#[derive(Debug, Clone, Default)]
pub(crate) struct GuardPath {
    parts: Vec<GuardPathPart>,
}

impl GuardPath {
    /// A new path with one more guard-declaring node appended.
    pub(crate) fn extend(&self, owner: u64, guards: Vec<(GuardKind, CallDefinition)>) -> Self {
        let mut parts = self.parts.clone();
        parts.push(GuardPathPart { owner, guards });
        Self { parts }
    }

    /// Evaluates every guard in root-to-self order. The first unsatisfied
    /// guard raises the guard-failure interrupt naming the node that declared
    /// it, to be absorbed by exactly that node as the update call stack
    /// unwinds.
    pub(crate) fn evaluate(&self, ctx: &mut TickContext) -> Result<(), Interrupt> {
        for part in &self.parts {
            for (kind, condition) in &part.guards {
                let value = ctx.invoke(&condition.call, &condition.args)?;
                let satisfied = match value {
                    CallValue::Bool(verdict) => match kind {
                        GuardKind::While => verdict,
                        GuardKind::Until => !verdict,
                    },
                    other => {
                        return Err(TickError::InvalidCallResult {
                            call: condition.call.clone(),
                            expected: "a boolean",
                            found: describe(&other),
                        }
                        .into());
                    }
                };
                if !satisfied {
                    return Err(Interrupt::Guard { owner: part.owner });
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn describe(value: &CallValue) -> &'static str {
    match value {
        CallValue::Void => "nothing",
        CallValue::Bool(_) => "a boolean",
        CallValue::State(_) => "a state",
        CallValue::Deferred(_) => "a deferred result",
    }
}
