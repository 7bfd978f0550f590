//! Instantiation of validated definitions into a runtime tree.
//!
//! Definition-level roots are merged with registered subtree roots (local
//! definitions win on name collision), the primary root is instantiated
//! depth-first with branch references resolved through the merged lookup, and
//! every node is then assigned its memoized guard path.

use crate::definition::{BranchDefinition, CallDefinition, NodeDefinition, RootDefinition};
use crate::error::{BuildError, DefinitionError, ResolutionError};
use crate::registry::Registry;
use crate::runtime::{BehaviorNode, GuardPath, NodeAttributes, NodeKind};
use ahash::AHashMap;
use itertools::Itertools;
use std::rc::Rc;

/// Builds the runtime tree for a set of definition-level nodes.
pub(crate) fn build(
    definitions: &[NodeDefinition],
    registry: &Registry,
) -> Result<BehaviorNode, BuildError> {
    let roots = validate_roots(definitions)?;

    let mut lookup: AHashMap<&str, &RootDefinition> = AHashMap::new();
    let mut primary: Option<&RootDefinition> = None;
    for root in &roots {
        match &root.name {
            Some(name) => {
                lookup.insert(name.as_str(), *root);
            }
            None => primary = Some(*root),
        }
    }
    let primary = primary.ok_or(DefinitionError::MissingPrimaryRoot)?;

    let resolver = BranchResolver { lookup, registry };
    let child = resolver.instantiate(&primary.child, &[])?;
    let mut root = BehaviorNode::new(
        NodeKind::Root {
            child: Box::new(child),
        },
        NodeAttributes::from(&primary.attributes),
    );

    assign_guard_paths(&mut root, &Rc::new(GuardPath::default()));

    tracing::debug!(
        root_id = root.uid(),
        named_subtrees = resolver.lookup.len(),
        "behaviour tree built"
    );
    Ok(root)
}

/// Definition-level validation: every node is a root, structural checks pass,
/// exactly one root is unnamed and no two named roots share a name.
fn validate_roots(definitions: &[NodeDefinition]) -> Result<Vec<&RootDefinition>, BuildError> {
    if definitions.is_empty() {
        return Err(DefinitionError::EmptyDefinition.into());
    }

    let mut roots = Vec::with_capacity(definitions.len());
    for definition in definitions {
        definition.validate(0)?;
        match definition {
            NodeDefinition::Root(root) => roots.push(root),
            _ => return Err(DefinitionError::ExpectedRoot.into()),
        }
    }

    let unnamed = roots.iter().filter(|root| root.name.is_none()).count();
    if unnamed == 0 {
        return Err(DefinitionError::MissingPrimaryRoot.into());
    }
    if unnamed > 1 {
        return Err(DefinitionError::DuplicatePrimaryRoot.into());
    }
    if let Some(name) = roots
        .iter()
        .filter_map(|root| root.name.as_deref())
        .duplicates()
        .next()
    {
        return Err(DefinitionError::DuplicateRootName {
            name: name.to_string(),
        }
        .into());
    }

    Ok(roots)
}

struct BranchResolver<'a> {
    lookup: AHashMap<&'a str, &'a RootDefinition>,
    registry: &'a Registry,
}

impl BranchResolver<'_> {
    /// Depth-first instantiation. `visited` is the list of branch names on
    /// the current path only — each branch extends a fresh copy, so sibling
    /// branches to the same subtree never falsely trigger cycle detection.
    fn instantiate(
        &self,
        definition: &NodeDefinition,
        visited: &[String],
    ) -> Result<BehaviorNode, ResolutionError> {
        let node = match definition {
            NodeDefinition::Root(_) => {
                // Validation rejects nested roots before instantiation runs.
                unreachable!("root definitions cannot be nested")
            }
            NodeDefinition::Branch(branch) => return self.resolve_branch(branch, visited),
            NodeDefinition::Sequence(composite) => BehaviorNode::new(
                NodeKind::Sequence {
                    children: self.instantiate_children(&composite.children, visited)?,
                },
                NodeAttributes::from(&composite.attributes),
            ),
            NodeDefinition::Selector(composite) => BehaviorNode::new(
                NodeKind::Selector {
                    children: self.instantiate_children(&composite.children, visited)?,
                },
                NodeAttributes::from(&composite.attributes),
            ),
            NodeDefinition::Parallel(composite) => BehaviorNode::new(
                NodeKind::Parallel {
                    children: self.instantiate_children(&composite.children, visited)?,
                },
                NodeAttributes::from(&composite.attributes),
            ),
            NodeDefinition::Lotto(lotto) => BehaviorNode::new(
                NodeKind::Lotto {
                    tickets: lotto.tickets.clone(),
                    selected: None,
                    children: self.instantiate_children(&lotto.children, visited)?,
                },
                NodeAttributes::from(&lotto.attributes),
            ),
            NodeDefinition::Repeat(repeat) => BehaviorNode::new(
                NodeKind::Repeat {
                    iterations: repeat.iterations,
                    target: None,
                    completed: 0,
                    child: Box::new(self.instantiate(&repeat.child, visited)?),
                },
                NodeAttributes::from(&repeat.attributes),
            ),
            NodeDefinition::Retry(retry) => BehaviorNode::new(
                NodeKind::Retry {
                    attempts: retry.attempts,
                    target: None,
                    failed: 0,
                    child: Box::new(self.instantiate(&retry.child, visited)?),
                },
                NodeAttributes::from(&retry.attributes),
            ),
            NodeDefinition::Flip(decorator) => BehaviorNode::new(
                NodeKind::Flip {
                    child: Box::new(self.instantiate(&decorator.child, visited)?),
                },
                NodeAttributes::from(&decorator.attributes),
            ),
            NodeDefinition::Succeed(decorator) => BehaviorNode::new(
                NodeKind::Succeed {
                    child: Box::new(self.instantiate(&decorator.child, visited)?),
                },
                NodeAttributes::from(&decorator.attributes),
            ),
            NodeDefinition::Fail(decorator) => BehaviorNode::new(
                NodeKind::Fail {
                    child: Box::new(self.instantiate(&decorator.child, visited)?),
                },
                NodeAttributes::from(&decorator.attributes),
            ),
            NodeDefinition::Wait(wait) => BehaviorNode::new(
                NodeKind::Wait {
                    duration: wait.duration,
                    started: None,
                    elapsed_ms: 0.0,
                    total_ms: None,
                },
                NodeAttributes::from(&wait.attributes),
            ),
            NodeDefinition::Action(leaf) => BehaviorNode::new(
                NodeKind::Action {
                    call: CallDefinition::new(leaf.call.clone(), leaf.args.clone()),
                    pending: None,
                },
                NodeAttributes::from(&leaf.attributes),
            ),
            NodeDefinition::Condition(leaf) => BehaviorNode::new(
                NodeKind::Condition {
                    call: CallDefinition::new(leaf.call.clone(), leaf.args.clone()),
                },
                NodeAttributes::from(&leaf.attributes),
            ),
        };
        Ok(node)
    }

    fn instantiate_children(
        &self,
        definitions: &[NodeDefinition],
        visited: &[String],
    ) -> Result<Vec<BehaviorNode>, ResolutionError> {
        definitions
            .iter()
            .map(|definition| self.instantiate(definition, visited))
            .collect()
    }

    /// A branch substitutes the referenced root's single child in place.
    fn resolve_branch(
        &self,
        branch: &BranchDefinition,
        visited: &[String],
    ) -> Result<BehaviorNode, ResolutionError> {
        if visited.iter().any(|name| name == &branch.target) {
            let chain = visited
                .iter()
                .map(String::as_str)
                .chain([branch.target.as_str()])
                .join(" -> ");
            return Err(ResolutionError::CircularDependency { chain });
        }

        let target = match self.lookup.get(branch.target.as_str()) {
            Some(root) => *root,
            None => match self.registry.subtree(&branch.target) {
                Some(NodeDefinition::Root(root)) => root,
                _ => {
                    return Err(ResolutionError::UndefinedBranch {
                        name: branch.target.clone(),
                    });
                }
            },
        };

        let mut extended = visited.to_vec();
        extended.push(branch.target.clone());
        self.instantiate(&target.child, &extended)
    }
}

/// Walks every root-to-leaf path once, assigning each node the chain of its
/// guard-declaring ancestors (self inclusive). Nodes that add no guards share
/// their parent's chain by reference.
fn assign_guard_paths(node: &mut BehaviorNode, inherited: &Rc<GuardPath>) {
    let path = if node.attributes().has_guards() {
        Rc::new(inherited.extend(node.uid(), node.attributes().guard_parts()))
    } else {
        Rc::clone(inherited)
    };
    node.set_guard_path(Rc::clone(&path));
    for child in node.children_mut() {
        assign_guard_paths(child, &path);
    }
}
