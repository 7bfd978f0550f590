//! Guard evaluation, the unwind protocol, and callback attributes.
mod common;
use common::{ScriptedAgent, shared_flag};
use kodo::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn failing_while_guard_aborts_the_running_subtree() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { sequence while(CanRun) { action [Linger] exit(OnLingerExit) } }",
        &registry,
    )
    .unwrap();

    let can_run = shared_flag(true);
    let flag = Rc::clone(&can_run);
    let exit_args = common::argument_capture();
    let exit_slot = Rc::clone(&exit_args);
    let mut agent = ScriptedAgent::new()
        .on("CanRun", move |_| flag.get().into())
        .returning("Linger", CallValue::Void)
        .on("OnLingerExit", move |args| {
            *exit_slot.borrow_mut() = args.to_vec();
            CallValue::Void
        });

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Running);

    can_run.set(false);
    tree.step(&mut agent, &registry).unwrap();

    // The sequence resolves FAILED on the tick the guard fails, and the
    // running action is aborted rather than finishing naturally.
    assert_eq!(tree.state(), State::Failed);
    assert_eq!(
        *exit_args.borrow(),
        vec![Literal::Bool(false), Literal::Bool(true)]
    );
    assert_eq!(agent.calls("Linger"), 1);
}

#[test]
fn until_guards_invert_the_condition() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { sequence until(Done) { action [Linger] } }",
        &registry,
    )
    .unwrap();

    let done = shared_flag(false);
    let flag = Rc::clone(&done);
    let mut agent = ScriptedAgent::new()
        .on("Done", move |_| flag.get().into())
        .returning("Linger", CallValue::Void);

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Running);

    done.set(true);
    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Failed);
}

#[test]
fn satisfied_guards_let_the_subtree_finish() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { sequence while(CanRun) { action [Work] } }",
        &registry,
    )
    .unwrap();

    let outcomes = Rc::new(RefCell::new(vec![
        CallValue::Void,
        CallValue::State(State::Succeeded),
    ]));
    let slot = Rc::clone(&outcomes);
    let mut agent = ScriptedAgent::new()
        .returning("CanRun", true.into())
        .on("Work", move |_| slot.borrow_mut().remove(0));

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Running);
    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Succeeded);
}

#[test]
fn guard_failure_on_a_ready_leaf_fails_it_before_any_call() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { condition [AlwaysTrue] while(Blocked) }",
        &registry,
    )
    .unwrap();

    let mut agent = ScriptedAgent::new()
        .returning("Blocked", false.into())
        .returning("AlwaysTrue", true.into());

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Failed);
    assert_eq!(agent.calls("AlwaysTrue"), 0);
}

#[test]
fn guard_failure_is_absorbed_by_the_declaring_ancestor() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { sequence while(Outer) exit(OnOuterExit) { sequence while(Inner) exit(OnInnerExit) { action [Work] exit(OnWorkExit) } } }",
        &registry,
    )
    .unwrap();

    let outer = shared_flag(true);
    let outer_flag = Rc::clone(&outer);
    let outer_exit_args = common::argument_capture();
    let outer_slot = Rc::clone(&outer_exit_args);
    let mut agent = ScriptedAgent::new()
        .on("Outer", move |_| outer_flag.get().into())
        .returning("Inner", true.into())
        .returning("Work", CallValue::Void)
        .on("OnOuterExit", move |args| {
            *outer_slot.borrow_mut() = args.to_vec();
            CallValue::Void
        })
        .returning("OnInnerExit", CallValue::Void)
        .returning("OnWorkExit", CallValue::Void);

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(tree.state(), State::Running);

    outer.set(false);
    tree.step(&mut agent, &registry).unwrap();

    // The failure is claimed by the outer sequence, whose whole subtree is
    // aborted on the way: every exit callback fires with aborted=true.
    assert_eq!(tree.state(), State::Failed);
    assert_eq!(agent.calls("OnOuterExit"), 1);
    assert_eq!(agent.calls("OnInnerExit"), 1);
    assert_eq!(agent.calls("OnWorkExit"), 1);
    assert_eq!(
        *outer_exit_args.borrow(),
        vec![Literal::Bool(false), Literal::Bool(true)]
    );
}

#[test]
fn entry_fires_once_and_step_fires_every_tick() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { action [Work] entry(OnEntry) step(OnStep) exit(OnExit) }",
        &registry,
    )
    .unwrap();

    let outcomes = Rc::new(RefCell::new(vec![
        CallValue::Void,
        CallValue::State(State::Succeeded),
    ]));
    let slot = Rc::clone(&outcomes);
    let exit_args = common::argument_capture();
    let exit_slot = Rc::clone(&exit_args);
    let mut agent = ScriptedAgent::new()
        .on("Work", move |_| slot.borrow_mut().remove(0))
        .returning("OnEntry", CallValue::Void)
        .returning("OnStep", CallValue::Void)
        .on("OnExit", move |args| {
            *exit_slot.borrow_mut() = args.to_vec();
            CallValue::Void
        });

    tree.step(&mut agent, &registry).unwrap();
    tree.step(&mut agent, &registry).unwrap();

    assert_eq!(tree.state(), State::Succeeded);
    assert_eq!(agent.calls("OnEntry"), 1);
    assert_eq!(agent.calls("OnStep"), 2);
    assert_eq!(agent.calls("OnExit"), 1);
    // A natural finish reports succeeded=true, aborted=false.
    assert_eq!(
        *exit_args.borrow(),
        vec![Literal::Bool(true), Literal::Bool(false)]
    );
}

#[test]
fn exit_callback_arguments_follow_declared_literals() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        r#"root { condition [Check] exit(OnExit, "ctx", 7) }"#,
        &registry,
    )
    .unwrap();

    let exit_args = common::argument_capture();
    let exit_slot = Rc::clone(&exit_args);
    let mut agent = ScriptedAgent::new()
        .returning("Check", true.into())
        .on("OnExit", move |args| {
            *exit_slot.borrow_mut() = args.to_vec();
            CallValue::Void
        });

    tree.step(&mut agent, &registry).unwrap();
    assert_eq!(
        *exit_args.borrow(),
        vec![
            Literal::String("ctx".to_string()),
            Literal::Number(7.0),
            Literal::Bool(true),
            Literal::Bool(false),
        ]
    );
}

#[test]
fn guards_returning_non_booleans_are_fatal() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { action [Work] while(Odd) }",
        &registry,
    )
    .unwrap();

    let mut agent = ScriptedAgent::new()
        .returning("Odd", CallValue::Void)
        .returning("Work", CallValue::Void);

    let error = tree.step(&mut agent, &registry).unwrap_err();
    assert!(matches!(error, TickError::InvalidCallResult { .. }));
}

#[test]
fn guards_are_reevaluated_on_every_tick() {
    let registry = Registry::new();
    let mut tree = BehaviorTree::new(
        "root { sequence while(CanRun) { action [Linger] } }",
        &registry,
    )
    .unwrap();

    let mut agent = ScriptedAgent::new()
        .returning("CanRun", true.into())
        .returning("Linger", CallValue::Void);

    tree.step(&mut agent, &registry).unwrap();
    tree.step(&mut agent, &registry).unwrap();
    tree.step(&mut agent, &registry).unwrap();

    // The sequence's guard path is checked by the sequence and by the leaf.
    assert_eq!(agent.calls("CanRun"), 6);
}
