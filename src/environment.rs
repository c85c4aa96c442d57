use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result, RuntimeErrorKind};
use crate::token::Token;
use crate::value::Value;

/// A single lexical frame: name→value bindings plus a link to the enclosing
/// frame.  Frames are shared (`Rc<RefCell<..>>`) because closures keep the
/// chain active at their definition alive past its lexical exit.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Chain-walking read, used for globals (unresolved names).
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(name.lexeme.as_str()) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(name, RuntimeErrorKind::UndefinedVariable))
        }
    }

    /// Chain-walking write, used for globals (unresolved names).
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(name.lexeme.as_str()) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(name, RuntimeErrorKind::UndefinedVariable))
        }
    }

    /// The frame exactly `distance` enclosing hops away.  The resolver
    /// guarantees the chain is at least that deep.
    fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = frame
                .borrow()
                .enclosing
                .clone()
                .expect("resolved distance exceeds environment depth");

            frame = enclosing;
        }

        frame
    }

    /// Read at exactly the resolved frame, no chain walk.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        Self::ancestor(env, distance).borrow().values.get(name).cloned()
    }

    /// Write at exactly the resolved frame; `false` if the name is absent
    /// there.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        if frame.values.contains_key(name) {
            frame.values.insert(name.to_string(), value);
            true
        } else {
            false
        }
    }
}
