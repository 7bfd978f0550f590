//! Unit tests for display, details and small value types.
mod common;
use common::ScriptedAgent;
use kodo::prelude::*;

#[test]
fn state_display() {
    assert_eq!(State::Ready.to_string(), "READY");
    assert_eq!(State::Running.to_string(), "RUNNING");
    assert_eq!(State::Succeeded.to_string(), "SUCCEEDED");
    assert_eq!(State::Failed.to_string(), "FAILED");
}

#[test]
fn literal_display() {
    assert_eq!(Literal::Number(42.0).to_string(), "42");
    assert_eq!(Literal::Number(2.5).to_string(), "2.5");
    assert_eq!(Literal::Bool(true).to_string(), "true");
    assert_eq!(Literal::Null.to_string(), "null");
    assert_eq!(Literal::String("hi".to_string()).to_string(), "\"hi\"");
}

#[test]
fn error_display() {
    let definition = DefinitionError::DuplicateRootName {
        name: "Patrol".to_string(),
    };
    assert!(definition.to_string().contains("Patrol"));

    let build = BuildError::Definition(DefinitionError::EmptyDefinition);
    assert!(build.to_string().starts_with("error parsing tree:"));

    let resolution = ResolutionError::CircularDependency {
        chain: "A -> B -> A".to_string(),
    };
    assert!(resolution.to_string().contains("A -> B -> A"));

    let tick = TickError::UnknownCall {
        call: "Jump".to_string(),
    };
    assert!(tick.to_string().contains("Jump"));
}

#[test]
fn node_display_names_are_deterministic() {
    let registry = Registry::new();
    let tree = BehaviorTree::new(
        "root { sequence { repeat [3] { action [Dig] } repeat [1,5] { condition [Deep] } wait [100,500] lotto [1,2,3] { wait [250] action [Rest] flip { condition [Up] } } } }",
        &registry,
    )
    .unwrap();

    let names: Vec<String> = tree
        .flattened_details()
        .into_iter()
        .map(|node| node.name)
        .collect();

    for expected in [
        "ROOT",
        "SEQUENCE",
        "REPEAT 3x",
        "REPEAT 1x-5x",
        "WAIT 100ms-500ms",
        "LOTTO [1,2,3]",
        "WAIT 250ms",
        "FLIP",
        "Dig",
        "Deep",
        "Rest",
        "Up",
    ] {
        assert!(
            names.iter().any(|name| name == expected),
            "missing node name '{}' in {:?}",
            expected,
            names
        );
    }
}

#[test]
fn details_expose_attribute_bindings() {
    let registry = Registry::new();
    let tree = BehaviorTree::new(
        r#"root { action [Work] while(CanWork) exit(OnExit, "tag") }"#,
        &registry,
    )
    .unwrap();

    let details = tree.flattened_details();
    let action = details
        .iter()
        .find(|node| node.node_type == NodeType::Action)
        .unwrap();

    assert_eq!(action.attributes.len(), 2);
    assert_eq!(action.attributes[0].kind, AttributeKind::While);
    assert_eq!(action.attributes[0].call, "CanWork");
    assert_eq!(action.attributes[1].kind, AttributeKind::Exit);
    assert_eq!(
        action.attributes[1].args,
        vec![Literal::String("tag".to_string())]
    );
}

#[test]
fn details_serialize_to_json() {
    let registry = Registry::new();
    let tree = BehaviorTree::new("root { wait [100] }", &registry).unwrap();

    let value = serde_json::to_value(tree.flattened_details()).unwrap();
    let nodes = value.as_array().unwrap();
    assert_eq!(nodes[0]["type"], "root");
    assert_eq!(nodes[0]["state"], "READY");
    assert_eq!(nodes[1]["type"], "wait");
    assert_eq!(nodes[1]["args"], serde_json::json!([100.0]));
}

#[test]
fn call_value_conversions() {
    assert!(matches!(CallValue::from(true), CallValue::Bool(true)));
    assert!(matches!(
        CallValue::from(State::Failed),
        CallValue::State(State::Failed)
    ));
}

#[test]
fn deferred_reports_settlement() {
    let deferred = Deferred::new();
    assert!(!deferred.is_settled());
    deferred.resolve(State::Succeeded);
    assert!(deferred.is_settled());
}

#[test]
fn registered_functions_receive_the_agent_first() {
    let mut registry = Registry::new();
    registry.register_function("Fallback", |agent, _args| {
        // The global function may itself consult the agent's callables.
        match agent.invoke("IsReady", &[]) {
            Some(CallValue::Bool(ready)) => CallValue::Bool(ready),
            _ => CallValue::Bool(false),
        }
    });

    let mut tree = BehaviorTree::new("root { condition [Fallback] }", &registry).unwrap();
    let mut agent = ScriptedAgent::new().returning("IsReady", true.into());

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Succeeded);
}

#[test]
fn agent_callables_shadow_registered_functions() {
    let mut registry = Registry::new();
    registry.register_function("Check", |_, _| CallValue::Bool(false));

    let mut tree = BehaviorTree::new("root { condition [Check] }", &registry).unwrap();
    let mut agent = ScriptedAgent::new().returning("Check", true.into());

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Succeeded);
}
