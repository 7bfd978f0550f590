//! The runtime node: one struct over a closed kind enum, sharing the
//! update/abort/reset contract and the guard-unwind handler.

use super::{
    AttributeDetails, AttributeKind, GuardPath, NodeDetails, NodeType, State, TickContext,
    composite, decorator, leaf,
};
use crate::agent::Deferred;
use crate::definition::{AttributeDefinitions, Bounds, CallDefinition};
use crate::error::Interrupt;
use crate::runtime::context::NodeStateChange;
use itertools::Itertools;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

fn next_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

/// Guard attribute kinds: `while` is satisfied when its condition holds,
/// `until` while it does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GuardKind {
    While,
    Until,
}

/// The fixed attribute set bound to a runtime node, at most one of each kind.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeAttributes {
    pub while_guard: Option<CallDefinition>,
    pub until_guard: Option<CallDefinition>,
    pub entry: Option<CallDefinition>,
    pub step: Option<CallDefinition>,
    pub exit: Option<CallDefinition>,
}

impl From<&AttributeDefinitions> for NodeAttributes {
    fn from(definitions: &AttributeDefinitions) -> Self {
        Self {
            while_guard: definitions.while_guard.clone(),
            until_guard: definitions.until_guard.clone(),
            entry: definitions.entry.clone(),
            step: definitions.step.clone(),
            exit: definitions.exit.clone(),
        }
    }
}

impl NodeAttributes {
    pub(crate) fn has_guards(&self) -> bool {
        self.while_guard.is_some() || self.until_guard.is_some()
    }

    pub(crate) fn guard_parts(&self) -> Vec<(GuardKind, CallDefinition)> {
        let mut parts = Vec::new();
        if let Some(condition) = &self.while_guard {
            parts.push((GuardKind::While, condition.clone()));
        }
        if let Some(condition) = &self.until_guard {
            parts.push((GuardKind::Until, condition.clone()));
        }
        parts
    }
}

/// Kind-specific data and transient tick state.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Root {
        child: Box<BehaviorNode>,
    },
    Sequence {
        children: Vec<BehaviorNode>,
    },
    Selector {
        children: Vec<BehaviorNode>,
    },
    Parallel {
        children: Vec<BehaviorNode>,
    },
    Lotto {
        tickets: Vec<u64>,
        selected: Option<usize>,
        children: Vec<BehaviorNode>,
    },
    Repeat {
        iterations: Option<Bounds>,
        target: Option<u64>,
        completed: u64,
        child: Box<BehaviorNode>,
    },
    Retry {
        attempts: Option<Bounds>,
        target: Option<u64>,
        failed: u64,
        child: Box<BehaviorNode>,
    },
    Flip {
        child: Box<BehaviorNode>,
    },
    Succeed {
        child: Box<BehaviorNode>,
    },
    Fail {
        child: Box<BehaviorNode>,
    },
    Action {
        call: CallDefinition,
        pending: Option<Deferred>,
    },
    Condition {
        call: CallDefinition,
    },
    Wait {
        duration: Option<Bounds>,
        started: Option<Instant>,
        elapsed_ms: f64,
        total_ms: Option<f64>,
    },
}

#[derive(Debug)]
pub(crate) struct BehaviorNode {
    uid: u64,
    state: State,
    attributes: NodeAttributes,
    guard_path: Option<Rc<GuardPath>>,
    kind: NodeKind,
}

impl BehaviorNode {
    pub(crate) fn new(kind: NodeKind, attributes: NodeAttributes) -> Self {
        Self {
            uid: next_uid(),
            state: State::Ready,
            attributes,
            guard_path: None,
            kind,
        }
    }

    pub(crate) fn uid(&self) -> u64 {
        self.uid
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn attributes(&self) -> &NodeAttributes {
        &self.attributes
    }

    pub(crate) fn set_guard_path(&mut self, path: Rc<GuardPath>) {
        self.guard_path = Some(path);
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Root { .. } => NodeType::Root,
            NodeKind::Sequence { .. } => NodeType::Sequence,
            NodeKind::Selector { .. } => NodeType::Selector,
            NodeKind::Parallel { .. } => NodeType::Parallel,
            NodeKind::Lotto { .. } => NodeType::Lotto,
            NodeKind::Repeat { .. } => NodeType::Repeat,
            NodeKind::Retry { .. } => NodeType::Retry,
            NodeKind::Flip { .. } => NodeType::Flip,
            NodeKind::Succeed { .. } => NodeType::Succeed,
            NodeKind::Fail { .. } => NodeType::Fail,
            NodeKind::Action { .. } => NodeType::Action,
            NodeKind::Condition { .. } => NodeType::Condition,
            NodeKind::Wait { .. } => NodeType::Wait,
        }
    }

    /// A deterministic display name derived from the kind and its configured
    /// parameters, used for introspection and error messages.
    pub(crate) fn display_name(&self) -> String {
        match &self.kind {
            NodeKind::Root { .. } => "ROOT".to_string(),
            NodeKind::Sequence { .. } => "SEQUENCE".to_string(),
            NodeKind::Selector { .. } => "SELECTOR".to_string(),
            NodeKind::Parallel { .. } => "PARALLEL".to_string(),
            NodeKind::Lotto { tickets, .. } => {
                if tickets.is_empty() {
                    "LOTTO".to_string()
                } else {
                    format!("LOTTO [{}]", tickets.iter().join(","))
                }
            }
            NodeKind::Repeat { iterations, .. } => match iterations {
                None => "REPEAT".to_string(),
                Some(Bounds::Fixed(count)) => format!("REPEAT {}x", count),
                Some(Bounds::Range([lower, upper])) => format!("REPEAT {}x-{}x", lower, upper),
            },
            NodeKind::Retry { attempts, .. } => match attempts {
                None => "RETRY".to_string(),
                Some(Bounds::Fixed(count)) => format!("RETRY {}x", count),
                Some(Bounds::Range([lower, upper])) => format!("RETRY {}x-{}x", lower, upper),
            },
            NodeKind::Flip { .. } => "FLIP".to_string(),
            NodeKind::Succeed { .. } => "SUCCEED".to_string(),
            NodeKind::Fail { .. } => "FAIL".to_string(),
            NodeKind::Action { call, .. } => call.call.clone(),
            NodeKind::Condition { call } => call.call.clone(),
            NodeKind::Wait { duration, .. } => match duration {
                None => "WAIT".to_string(),
                Some(Bounds::Fixed(ms)) => format!("WAIT {}ms", ms),
                Some(Bounds::Range([lower, upper])) => format!("WAIT {}ms-{}ms", lower, upper),
            },
        }
    }

    // --- The shared state-machine contract ---

    /// One update pass. A no-op in a terminal state; otherwise the guard path
    /// is evaluated, callbacks fire, and the kind-specific logic runs. A
    /// guard-failure interrupt owned by this node is absorbed here: the node
    /// is aborted (cascading through running children) and forced to FAILED,
    /// while any other node's interrupt re-raises to the ancestors.
    pub(crate) fn update(&mut self, ctx: &mut TickContext) -> Result<(), Interrupt> {
        if self.state.is_terminal() {
            return Ok(());
        }
        match self.tick(ctx) {
            Err(Interrupt::Guard { owner }) if owner == self.uid => {
                self.abort(ctx)?;
                self.transition(ctx, State::Failed);
                Ok(())
            }
            other => other,
        }
    }

    fn tick(&mut self, ctx: &mut TickContext) -> Result<(), Interrupt> {
        if let Some(path) = &self.guard_path {
            path.evaluate(ctx)?;
        }
        if self.state == State::Ready
            && let Some(entry) = &self.attributes.entry
        {
            ctx.invoke_callback(entry, None)?;
        }
        if let Some(step) = &self.attributes.step {
            ctx.invoke_callback(step, None)?;
        }

        let next = self.tick_kind(ctx)?;
        self.transition(ctx, next);

        if self.state.is_terminal()
            && let Some(exit) = &self.attributes.exit
        {
            ctx.invoke_callback(exit, Some((self.state == State::Succeeded, false)))?;
        }
        Ok(())
    }

    fn tick_kind(&mut self, ctx: &mut TickContext) -> Result<State, Interrupt> {
        let current = self.state;
        match &mut self.kind {
            NodeKind::Root { child } => decorator::tick_root(child, ctx),
            NodeKind::Sequence { children } => composite::tick_sequence(children, ctx),
            NodeKind::Selector { children } => composite::tick_selector(children, ctx),
            NodeKind::Parallel { children } => composite::tick_parallel(children, ctx),
            NodeKind::Lotto {
                tickets,
                selected,
                children,
            } => composite::tick_lotto(tickets, selected, children, ctx),
            NodeKind::Repeat {
                iterations,
                target,
                completed,
                child,
            } => decorator::tick_repeat(*iterations, target, completed, child, current, ctx),
            NodeKind::Retry {
                attempts,
                target,
                failed,
                child,
            } => decorator::tick_retry(*attempts, target, failed, child, current, ctx),
            NodeKind::Flip { child } => decorator::tick_flip(child, ctx),
            NodeKind::Succeed { child } => decorator::tick_succeed(child, ctx),
            NodeKind::Fail { child } => decorator::tick_fail(child, ctx),
            NodeKind::Action { call, pending } => leaf::tick_action(call, pending, ctx),
            NodeKind::Condition { call } => leaf::tick_condition(call, ctx),
            NodeKind::Wait {
                duration,
                started,
                elapsed_ms,
                total_ms,
            } => leaf::tick_wait(*duration, started, elapsed_ms, total_ms, current, ctx),
        }
    }

    /// Cooperative cancellation while RUNNING: children are aborted first,
    /// this node's state is restored to READY, and the exit callback fires
    /// with `(succeeded=false, aborted=true)`.
    pub(crate) fn abort(&mut self, ctx: &mut TickContext) -> Result<(), Interrupt> {
        if self.state != State::Running {
            return Ok(());
        }
        for child in self.children_mut() {
            child.abort(ctx)?;
        }
        self.reset();
        if let Some(exit) = &self.attributes.exit {
            ctx.invoke_callback(exit, Some((false, true)))?;
        }
        Ok(())
    }

    /// Restores READY, recursively resetting children and clearing transient
    /// leaf state (pending deferred results, wait timers, draw selections).
    pub(crate) fn reset(&mut self) {
        self.state = State::Ready;
        match &mut self.kind {
            NodeKind::Root { child }
            | NodeKind::Flip { child }
            | NodeKind::Succeed { child }
            | NodeKind::Fail { child } => child.reset(),
            NodeKind::Sequence { children }
            | NodeKind::Selector { children }
            | NodeKind::Parallel { children } => {
                for child in children {
                    child.reset();
                }
            }
            NodeKind::Lotto {
                selected, children, ..
            } => {
                *selected = None;
                for child in children {
                    child.reset();
                }
            }
            NodeKind::Repeat {
                target,
                completed,
                child,
                ..
            } => {
                *target = None;
                *completed = 0;
                child.reset();
            }
            NodeKind::Retry {
                target,
                failed,
                child,
                ..
            } => {
                *target = None;
                *failed = 0;
                child.reset();
            }
            NodeKind::Action { pending, .. } => *pending = None,
            NodeKind::Condition { .. } => {}
            NodeKind::Wait {
                started,
                elapsed_ms,
                total_ms,
                ..
            } => {
                *started = None;
                *elapsed_ms = 0.0;
                *total_ms = None;
            }
        }
    }

    fn transition(&mut self, ctx: &mut TickContext, next: State) {
        if self.state == next {
            return;
        }
        let previous = self.state;
        self.state = next;
        tracing::trace!(
            id = self.uid,
            node = %self.display_name(),
            %previous,
            %next,
            "node state changed"
        );
        if ctx.observes_state_changes() {
            let change = NodeStateChange {
                id: self.uid,
                node_type: self.node_type(),
                name: self.display_name(),
                previous,
                next,
                attributes: self.attribute_details(),
            };
            ctx.notify_state_change(change);
        }
    }

    // --- Introspection ---

    pub(crate) fn children(&self) -> Vec<&BehaviorNode> {
        match &self.kind {
            NodeKind::Root { child }
            | NodeKind::Repeat { child, .. }
            | NodeKind::Retry { child, .. }
            | NodeKind::Flip { child }
            | NodeKind::Succeed { child }
            | NodeKind::Fail { child } => vec![child],
            NodeKind::Sequence { children }
            | NodeKind::Selector { children }
            | NodeKind::Parallel { children }
            | NodeKind::Lotto { children, .. } => children.iter().collect(),
            NodeKind::Action { .. } | NodeKind::Condition { .. } | NodeKind::Wait { .. } => {
                Vec::new()
            }
        }
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut BehaviorNode> {
        match &mut self.kind {
            NodeKind::Root { child }
            | NodeKind::Repeat { child, .. }
            | NodeKind::Retry { child, .. }
            | NodeKind::Flip { child }
            | NodeKind::Succeed { child }
            | NodeKind::Fail { child } => vec![child],
            NodeKind::Sequence { children }
            | NodeKind::Selector { children }
            | NodeKind::Parallel { children }
            | NodeKind::Lotto { children, .. } => children.iter_mut().collect(),
            NodeKind::Action { .. } | NodeKind::Condition { .. } | NodeKind::Wait { .. } => {
                Vec::new()
            }
        }
    }

    pub(crate) fn attribute_details(&self) -> Vec<AttributeDetails> {
        let slots = [
            (AttributeKind::While, &self.attributes.while_guard),
            (AttributeKind::Until, &self.attributes.until_guard),
            (AttributeKind::Entry, &self.attributes.entry),
            (AttributeKind::Step, &self.attributes.step),
            (AttributeKind::Exit, &self.attributes.exit),
        ];
        slots
            .into_iter()
            .filter_map(|(kind, slot)| {
                slot.as_ref().map(|definition| AttributeDetails {
                    kind,
                    call: definition.call.clone(),
                    args: definition.args.clone(),
                })
            })
            .collect()
    }

    /// The configured argument values of this node, as shown in details:
    /// call arguments for leaves, bounds for repeat/retry/wait, ticket counts
    /// for lotto.
    fn argument_details(&self) -> Vec<crate::definition::Literal> {
        use crate::definition::Literal;
        let bounds_args = |bounds: &Option<Bounds>| match bounds {
            None => Vec::new(),
            Some(Bounds::Fixed(value)) => vec![Literal::Number(*value as f64)],
            Some(Bounds::Range([lower, upper])) => vec![
                Literal::Number(*lower as f64),
                Literal::Number(*upper as f64),
            ],
        };
        match &self.kind {
            NodeKind::Action { call, .. } => call.args.clone(),
            NodeKind::Condition { call } => call.args.clone(),
            NodeKind::Lotto { tickets, .. } => tickets
                .iter()
                .map(|ticket| Literal::Number(*ticket as f64))
                .collect(),
            NodeKind::Repeat { iterations, .. } => bounds_args(iterations),
            NodeKind::Retry { attempts, .. } => bounds_args(attempts),
            NodeKind::Wait { duration, .. } => bounds_args(duration),
            _ => Vec::new(),
        }
    }

    fn details(&self, parent_id: Option<u64>) -> NodeDetails {
        NodeDetails {
            id: self.uid,
            node_type: self.node_type(),
            name: self.display_name(),
            state: self.state,
            attributes: self.attribute_details(),
            args: self.argument_details(),
            parent_id,
        }
    }

    /// Pre-order details of this node and every descendant.
    pub(crate) fn flatten_details(&self, parent_id: Option<u64>, out: &mut Vec<NodeDetails>) {
        out.push(self.details(parent_id));
        for child in self.children() {
            child.flatten_details(Some(self.uid), out);
        }
    }
}
