//! The definition DSL parser.
//!
//! Parsing keeps a stack of open child-list scopes, starting with one
//! definition-level scope. Each token is dispatched on its case-insensitive
//! value to a node-type constructor; nodes with a children block push a fresh
//! scope which a `}` token pops back into the owning node. The output is the
//! same [`NodeDefinition`] model the structured input form deserialises into.

use super::tokenizer::{TokenStream, tokenize};
use super::{
    AttributeDefinitions, Bounds, BranchDefinition, CallDefinition, CompositeDefinition,
    DecoratorDefinition, LeafCallDefinition, Literal, LottoDefinition, NodeDefinition,
    RepeatDefinition, RetryDefinition, RootDefinition, WaitDefinition,
};
use crate::error::DefinitionError;

/// Parses a DSL definition string into its definition-level nodes.
///
/// The result is structurally validated to the same degree as a hand-built
/// structured definition; top-level root checks (primary root presence, name
/// uniqueness) happen at build time, where registered subtrees are in scope.
pub fn parse_text(definition: &str) -> Result<Vec<NodeDefinition>, DefinitionError> {
    let mut stream = tokenize(definition);

    if stream.is_empty() {
        return Err(DefinitionError::EmptyDefinition);
    }
    let (open, close) = stream.brace_counts();
    if open != close {
        return Err(DefinitionError::UnbalancedBraces { open, close });
    }

    Parser::new(&mut stream).run()
}

/// A node whose children block is still open.
enum Pending {
    Root {
        name: Option<String>,
        attributes: AttributeDefinitions,
    },
    Node(NodeDefinition),
}

struct Parser<'a> {
    stream: &'a mut TokenStream,
    pending: Vec<Pending>,
    scopes: Vec<Vec<NodeDefinition>>,
    roots: Vec<NodeDefinition>,
}

/// An argument token as it appears in a `[...]` or `(...)` list.
enum RawArgument {
    Identifier(String),
    Value(Literal),
}

impl<'a> Parser<'a> {
    fn new(stream: &'a mut TokenStream) -> Self {
        Self {
            stream,
            pending: Vec::new(),
            scopes: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<NodeDefinition>, DefinitionError> {
        while let Some(token) = self.stream.next() {
            match token.to_uppercase().as_str() {
                "ROOT" => self.open_root()?,
                "SEQUENCE" => self.open_composite("sequence", NodeDefinition::Sequence)?,
                "SELECTOR" => self.open_composite("selector", NodeDefinition::Selector)?,
                "PARALLEL" => self.open_composite("parallel", NodeDefinition::Parallel)?,
                "LOTTO" => self.open_lotto()?,
                "REPEAT" => self.open_repeat()?,
                "RETRY" => self.open_retry()?,
                "FLIP" => self.open_decorator("flip", NodeDefinition::Flip)?,
                "SUCCEED" => self.open_decorator("succeed", NodeDefinition::Succeed)?,
                "FAIL" => self.open_decorator("fail", NodeDefinition::Fail)?,
                "BRANCH" => {
                    let branch = self.parse_branch_token()?;
                    self.push_leaf(branch)?;
                }
                "WAIT" => {
                    let wait = self.parse_wait()?;
                    self.push_leaf(wait)?;
                }
                "ACTION" => {
                    let action = self.parse_leaf_call("action", NodeDefinition::Action)?;
                    self.push_leaf(action)?;
                }
                "CONDITION" => {
                    let condition = self.parse_leaf_call("condition", NodeDefinition::Condition)?;
                    self.push_leaf(condition)?;
                }
                "}" => self.close_scope()?,
                _ => {
                    return Err(DefinitionError::UnexpectedToken {
                        token,
                        context: "where a node type was expected".to_string(),
                    });
                }
            }
        }

        // Brace balance was checked up front, so every scope has been closed.
        Ok(self.roots)
    }

    // --- Scope management ---

    fn open_root(&mut self) -> Result<(), DefinitionError> {
        if !self.pending.is_empty() {
            return Err(DefinitionError::NestedRoot);
        }
        let name = self.parse_optional_name("root")?;
        let attributes = self.parse_attributes("root")?;
        self.expect("{")?;
        self.pending.push(Pending::Root { name, attributes });
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn open_composite(
        &mut self,
        node: &'static str,
        build: fn(CompositeDefinition) -> NodeDefinition,
    ) -> Result<(), DefinitionError> {
        self.check_in_scope()?;
        let attributes = self.parse_attributes(node)?;
        self.expect("{")?;
        self.pending.push(Pending::Node(build(CompositeDefinition {
            attributes,
            children: Vec::new(),
        })));
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn open_lotto(&mut self) -> Result<(), DefinitionError> {
        self.check_in_scope()?;
        let tickets = self.parse_integer_list("lotto")?;
        let attributes = self.parse_attributes("lotto")?;
        self.expect("{")?;
        self.pending.push(Pending::Node(NodeDefinition::Lotto(
            LottoDefinition {
                tickets,
                attributes,
                children: Vec::new(),
            },
        )));
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn open_repeat(&mut self) -> Result<(), DefinitionError> {
        self.check_in_scope()?;
        let iterations = self.parse_optional_bounds("repeat")?;
        let attributes = self.parse_attributes("repeat")?;
        self.expect("{")?;
        self.pending.push(Pending::Node(NodeDefinition::Repeat(
            RepeatDefinition {
                iterations,
                attributes,
                child: Box::new(placeholder_child()),
            },
        )));
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn open_retry(&mut self) -> Result<(), DefinitionError> {
        self.check_in_scope()?;
        let attempts = self.parse_optional_bounds("retry")?;
        let attributes = self.parse_attributes("retry")?;
        self.expect("{")?;
        self.pending.push(Pending::Node(NodeDefinition::Retry(
            RetryDefinition {
                attempts,
                attributes,
                child: Box::new(placeholder_child()),
            },
        )));
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn open_decorator(
        &mut self,
        node: &'static str,
        build: fn(DecoratorDefinition) -> NodeDefinition,
    ) -> Result<(), DefinitionError> {
        self.check_in_scope()?;
        let attributes = self.parse_attributes(node)?;
        self.expect("{")?;
        self.pending.push(Pending::Node(build(DecoratorDefinition {
            attributes,
            child: Box::new(placeholder_child()),
        })));
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn close_scope(&mut self) -> Result<(), DefinitionError> {
        let children = self.scopes.pop().ok_or_else(|| {
            DefinitionError::UnexpectedToken {
                token: "}".to_string(),
                context: "with no open scope to close".to_string(),
            }
        })?;
        let pending = self.pending.pop().ok_or_else(|| {
            DefinitionError::UnexpectedToken {
                token: "}".to_string(),
                context: "with no open node to close".to_string(),
            }
        })?;

        match pending {
            Pending::Root { name, attributes } => {
                let child = exactly_one_child("root", children)?;
                self.roots.push(NodeDefinition::Root(RootDefinition {
                    name,
                    attributes,
                    child: Box::new(child),
                }));
            }
            Pending::Node(mut node) => {
                attach_children(&mut node, children)?;
                self.append_to_scope(node)?;
            }
        }
        Ok(())
    }

    fn push_leaf(&mut self, node: NodeDefinition) -> Result<(), DefinitionError> {
        self.append_to_scope(node)
    }

    fn append_to_scope(&mut self, node: NodeDefinition) -> Result<(), DefinitionError> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.push(node);
                Ok(())
            }
            None => Err(DefinitionError::ExpectedRoot),
        }
    }

    fn check_in_scope(&self) -> Result<(), DefinitionError> {
        // A non-root node at definition level is rejected outright.
        if self.scopes.is_empty() {
            return Err(DefinitionError::ExpectedRoot);
        }
        Ok(())
    }

    // --- Per-type argument parsing ---

    fn parse_branch_token(&mut self) -> Result<NodeDefinition, DefinitionError> {
        let arguments = self.parse_argument_list('[', ']')?;
        match arguments.as_slice() {
            [RawArgument::Identifier(name)] => Ok(NodeDefinition::Branch(BranchDefinition {
                target: name.clone(),
            })),
            _ => Err(DefinitionError::InvalidNodeArguments {
                node: "branch",
                message: "expected a single subtree name".to_string(),
            }),
        }
    }

    fn parse_wait(&mut self) -> Result<NodeDefinition, DefinitionError> {
        let duration = self.parse_optional_bounds("wait")?;
        let attributes = self.parse_attributes("wait")?;
        Ok(NodeDefinition::Wait(WaitDefinition {
            duration,
            attributes,
        }))
    }

    fn parse_leaf_call(
        &mut self,
        node: &'static str,
        build: fn(LeafCallDefinition) -> NodeDefinition,
    ) -> Result<NodeDefinition, DefinitionError> {
        let arguments = self.parse_argument_list('[', ']')?;
        let (call, args) = split_call_arguments(node, arguments)?;
        let attributes = self.parse_attributes(node)?;
        Ok(build(LeafCallDefinition {
            call,
            args,
            attributes,
        }))
    }

    fn parse_optional_name(&mut self, node: &'static str) -> Result<Option<String>, DefinitionError> {
        if self.stream.peek() != Some("[") {
            return Ok(None);
        }
        let arguments = self.parse_argument_list('[', ']')?;
        match arguments.as_slice() {
            [RawArgument::Identifier(name)] => Ok(Some(name.clone())),
            _ => Err(DefinitionError::InvalidNodeArguments {
                node,
                message: "expected a single name".to_string(),
            }),
        }
    }

    fn parse_optional_bounds(
        &mut self,
        node: &'static str,
    ) -> Result<Option<Bounds>, DefinitionError> {
        let values = self.parse_integer_list(node)?;
        let bounds = match values.as_slice() {
            [] => return Ok(None),
            [fixed] => Bounds::Fixed(*fixed),
            [lower, upper] => Bounds::Range([*lower, *upper]),
            _ => {
                return Err(DefinitionError::InvalidNodeArguments {
                    node,
                    message: "expected one value or a [lower, upper] pair".to_string(),
                });
            }
        };
        bounds.validate(node)?;
        Ok(Some(bounds))
    }

    fn parse_integer_list(&mut self, node: &'static str) -> Result<Vec<u64>, DefinitionError> {
        if self.stream.peek() != Some("[") {
            return Ok(Vec::new());
        }
        let arguments = self.parse_argument_list('[', ']')?;
        arguments
            .iter()
            .map(|argument| match argument {
                RawArgument::Value(Literal::Number(number))
                    if number.fract() == 0.0 && *number >= 0.0 =>
                {
                    Ok(*number as u64)
                }
                _ => Err(DefinitionError::InvalidNodeArguments {
                    node,
                    message: "expected non-negative integer values".to_string(),
                }),
            })
            .collect()
    }

    /// Parses zero or more attribute declarations immediately following a
    /// node's own arguments, rejecting duplicate kinds.
    fn parse_attributes(
        &mut self,
        node: &'static str,
    ) -> Result<AttributeDefinitions, DefinitionError> {
        let mut attributes = AttributeDefinitions::default();
        loop {
            let kind = match self.stream.peek().map(str::to_uppercase) {
                Some(kind)
                    if matches!(kind.as_str(), "WHILE" | "UNTIL" | "ENTRY" | "STEP" | "EXIT") =>
                {
                    kind
                }
                _ => return Ok(attributes),
            };
            self.stream.next();

            let arguments = self.parse_argument_list('(', ')')?;
            let (call, args) = split_call_arguments(node, arguments)?;
            let definition = CallDefinition { call, args };

            let slot = match kind.as_str() {
                "WHILE" => ("while", &mut attributes.while_guard),
                "UNTIL" => ("until", &mut attributes.until_guard),
                "ENTRY" => ("entry", &mut attributes.entry),
                "STEP" => ("step", &mut attributes.step),
                _ => ("exit", &mut attributes.exit),
            };
            if slot.1.is_some() {
                return Err(DefinitionError::DuplicateAttribute {
                    node,
                    attribute: slot.0,
                });
            }
            *slot.1 = Some(definition);
        }
    }

    // --- Token-level helpers ---

    fn parse_argument_list(
        &mut self,
        open: char,
        close: char,
    ) -> Result<Vec<RawArgument>, DefinitionError> {
        self.expect(&open.to_string())?;
        let close = close.to_string();
        let mut arguments = Vec::new();

        if self.stream.peek() == Some(close.as_str()) {
            self.stream.next();
            return Ok(arguments);
        }

        loop {
            let token = self.stream.next().ok_or_else(|| DefinitionError::UnexpectedEnd {
                expected: close.clone(),
            })?;
            arguments.push(self.classify_argument(&token)?);

            let separator = self.stream.next().ok_or_else(|| DefinitionError::UnexpectedEnd {
                expected: close.clone(),
            })?;
            if separator == close {
                return Ok(arguments);
            }
            if separator != "," {
                return Err(DefinitionError::UnexpectedToken {
                    token: separator,
                    context: format!("where ',' or '{}' was expected", close),
                });
            }
        }
    }

    fn classify_argument(&self, token: &str) -> Result<RawArgument, DefinitionError> {
        if let Some(literal) = self.stream.literal(token) {
            return Ok(RawArgument::Value(Literal::String(literal.to_string())));
        }
        match token {
            "null" => return Ok(RawArgument::Value(Literal::Null)),
            "true" => return Ok(RawArgument::Value(Literal::Bool(true))),
            "false" => return Ok(RawArgument::Value(Literal::Bool(false))),
            _ => {}
        }
        if let Ok(number) = token.parse::<f64>() {
            return Ok(RawArgument::Value(Literal::Number(number)));
        }
        if is_identifier(token) {
            return Ok(RawArgument::Identifier(token.to_string()));
        }
        Err(DefinitionError::InvalidArgument {
            token: token.to_string(),
        })
    }

    fn expect(&mut self, expected: &str) -> Result<(), DefinitionError> {
        match self.stream.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(DefinitionError::UnexpectedToken {
                token,
                context: format!("where '{}' was expected", expected),
            }),
            None => Err(DefinitionError::UnexpectedEnd {
                expected: expected.to_string(),
            }),
        }
    }
}

/// The first argument must be an identifier naming the callable; the rest must
/// be literal values.
fn split_call_arguments(
    node: &'static str,
    arguments: Vec<RawArgument>,
) -> Result<(String, Vec<Literal>), DefinitionError> {
    let mut iterator = arguments.into_iter();
    let call = match iterator.next() {
        Some(RawArgument::Identifier(name)) => name,
        _ => {
            return Err(DefinitionError::InvalidNodeArguments {
                node,
                message: "first argument must name the callable".to_string(),
            });
        }
    };
    let args = iterator
        .map(|argument| match argument {
            RawArgument::Value(literal) => Ok(literal),
            RawArgument::Identifier(identifier) => Err(DefinitionError::InvalidNodeArguments {
                node,
                message: format!(
                    "'{}' is not a literal; only the first argument may be an identifier",
                    identifier
                ),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((call, args))
}

fn attach_children(
    node: &mut NodeDefinition,
    children: Vec<NodeDefinition>,
) -> Result<(), DefinitionError> {
    match node {
        NodeDefinition::Sequence(composite)
        | NodeDefinition::Selector(composite)
        | NodeDefinition::Parallel(composite) => {
            if children.is_empty() {
                return Err(DefinitionError::ExpectedChildren {
                    node: node.type_name(),
                });
            }
            composite.children = children;
            Ok(())
        }
        NodeDefinition::Lotto(lotto) => {
            if children.is_empty() {
                return Err(DefinitionError::ExpectedChildren { node: "lotto" });
            }
            lotto.children = children;
            Ok(())
        }
        NodeDefinition::Repeat(repeat) => {
            repeat.child = Box::new(exactly_one_child("repeat", children)?);
            Ok(())
        }
        NodeDefinition::Retry(retry) => {
            retry.child = Box::new(exactly_one_child("retry", children)?);
            Ok(())
        }
        NodeDefinition::Flip(decorator) => {
            decorator.child = Box::new(exactly_one_child("flip", children)?);
            Ok(())
        }
        NodeDefinition::Succeed(decorator) => {
            decorator.child = Box::new(exactly_one_child("succeed", children)?);
            Ok(())
        }
        NodeDefinition::Fail(decorator) => {
            decorator.child = Box::new(exactly_one_child("fail", children)?);
            Ok(())
        }
        // Leaves never own a scope, so this cannot be reached through parsing.
        _ => Err(DefinitionError::UnexpectedToken {
            token: "}".to_string(),
            context: format!("closing a '{}' node", node.type_name()),
        }),
    }
}

fn exactly_one_child(
    node: &'static str,
    mut children: Vec<NodeDefinition>,
) -> Result<NodeDefinition, DefinitionError> {
    if children.len() != 1 {
        return Err(DefinitionError::ExpectedSingleChild { node });
    }
    Ok(children.remove(0))
}

/// A temporary child slot for decorators while their scope is open; always
/// replaced in `attach_children` before the node becomes visible.
fn placeholder_child() -> NodeDefinition {
    NodeDefinition::Branch(BranchDefinition {
        target: String::new(),
    })
}

fn is_identifier(token: &str) -> bool {
    let mut characters = token.chars();
    match characters.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            characters.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
