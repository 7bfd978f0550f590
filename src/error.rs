use crate::runtime::State;
use thiserror::Error;

/// Errors raised while tokenising, parsing or structurally validating a tree
/// definition. These are always raised during build, never during ticking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("definition contains no tokens")]
    EmptyDefinition,

    #[error("definition has unbalanced scope braces ({open} opening, {close} closing)")]
    UnbalancedBraces { open: usize, close: usize },

    #[error("unexpected token '{token}' {context}")]
    UnexpectedToken { token: String, context: String },

    #[error("expected '{expected}' but reached the end of the definition")]
    UnexpectedEnd { expected: String },

    #[error("'{token}' is not a valid argument")]
    InvalidArgument { token: String },

    #[error("{node} node arguments are invalid: {message}")]
    InvalidNodeArguments { node: &'static str, message: String },

    #[error("{node} node has a duplicate '{attribute}' attribute")]
    DuplicateAttribute {
        node: &'static str,
        attribute: &'static str,
    },

    #[error("{node} node must have exactly one child")]
    ExpectedSingleChild { node: &'static str },

    #[error("{node} node must have at least one child")]
    ExpectedChildren { node: &'static str },

    #[error("{node} node bounds are invalid: lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds {
        node: &'static str,
        lower: u64,
        upper: u64,
    },

    #[error("a root node cannot be nested within another node")]
    NestedRoot,

    #[error("every definition-level node must be a root node")]
    ExpectedRoot,

    #[error("definition must contain exactly one unnamed root node as the primary root")]
    MissingPrimaryRoot,

    #[error("definition contains more than one unnamed root node")]
    DuplicatePrimaryRoot,

    #[error("multiple root nodes share the name '{name}'")]
    DuplicateRootName { name: String },
}

/// Errors raised while instantiating a validated definition into a runtime
/// tree, when branch references are resolved against local and registered
/// subtrees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error(
        "branch references a root node '{name}' that is neither locally defined nor registered"
    )]
    UndefinedBranch { name: String },

    #[error("circular branch references detected: {chain}")]
    CircularDependency { chain: String },
}

/// The caller-visible build failure, wrapping the phase-specific error with
/// context about where the build stopped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("error parsing tree: {0}")]
    Definition(#[from] DefinitionError),

    #[error("error building tree: {0}")]
    Resolution(#[from] ResolutionError),
}

/// Errors raised while ticking a fully built tree. These indicate a missing
/// binding or a misbehaving agent callback, and leave the tree in whatever
/// partial state the tick reached; the caller may `reset()` and retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    #[error("cannot find callable '{call}' on the agent or in the registry")]
    UnknownCall { call: String },

    #[error("call '{call}' returned an invalid result: expected {expected} but found {found}")]
    InvalidCallResult {
        call: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("deferred result of action '{call}' settled with non-terminal state {state}")]
    InvalidDeferredState { call: String, state: State },

    #[error("deferred result of action '{call}' was rejected: {reason}")]
    RejectedDeferred { call: String, reason: String },

    #[error("updated child node '{child}' was left in unexpected state {state}")]
    UnexpectedChildState { child: String, state: State },
}

/// Crate-internal unwinding token threaded through the recursive update call
/// chain. `Guard` is the guard-failure signal of the unwind protocol: it names
/// the node that owns the failing guard and is absorbed by exactly that node,
/// never surfacing past the root of a fully built tree.
#[derive(Debug)]
pub(crate) enum Interrupt {
    Guard { owner: u64 },
    Failure(TickError),
}

impl From<TickError> for Interrupt {
    fn from(error: TickError) -> Self {
        Interrupt::Failure(error)
    }
}
