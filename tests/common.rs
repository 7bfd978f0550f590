//! Common test utilities: a scriptable agent and tick option builders.
use ahash::AHashMap;
use kodo::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A test agent whose callables are closures registered per name, recording
/// every invocation so tests can assert call order and counts.
#[derive(Default)]
pub struct ScriptedAgent {
    handlers: AHashMap<String, Box<dyn FnMut(&[Literal]) -> CallValue>>,
    invocations: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        call: &str,
        handler: impl FnMut(&[Literal]) -> CallValue + 'static,
    ) -> Self {
        self.handlers.insert(call.to_string(), Box::new(handler));
        self
    }

    /// Registers a callable that returns a clone of the same value on every
    /// invocation.
    pub fn returning(self, call: &str, value: CallValue) -> Self {
        self.on(call, move |_| value.clone())
    }

    pub fn calls(&self, call: &str) -> usize {
        self.invocations
            .iter()
            .filter(|name| name.as_str() == call)
            .count()
    }

    pub fn invocations(&self) -> &[String] {
        &self.invocations
    }
}

impl Agent for ScriptedAgent {
    fn invoke(&mut self, call: &str, args: &[Literal]) -> Option<CallValue> {
        let handler = self.handlers.get_mut(call)?;
        self.invocations.push(call.to_string());
        Some(handler(args))
    }
}

/// Options whose random source always yields the same value.
#[allow(dead_code)]
pub fn fixed_random(value: f64) -> TickOptions {
    TickOptions {
        random: Some(Box::new(move || value)),
        ..Default::default()
    }
}

/// Options whose delta-time source reports the same elapsed seconds per tick.
#[allow(dead_code)]
pub fn fixed_delta(seconds: f64) -> TickOptions {
    TickOptions {
        delta_time: Some(Box::new(move || seconds)),
        ..Default::default()
    }
}

/// A boolean flag shared between a test and an agent handler.
#[allow(dead_code)]
pub fn shared_flag(initial: bool) -> Rc<Cell<bool>> {
    Rc::new(Cell::new(initial))
}

/// A shared slot that captures the argument list of the latest invocation.
#[allow(dead_code)]
pub fn argument_capture() -> Rc<RefCell<Vec<Literal>>> {
    Rc::new(RefCell::new(Vec::new()))
}
