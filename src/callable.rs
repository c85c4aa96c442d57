use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::{Interpreter, Unwind};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A user-declared function or method: its declaration plus the environment
/// chain captured at the point of declaration.
#[derive(Debug, Clone)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A fresh function value whose closure has `this` pre-bound to the
    /// receiver.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut env: Environment = Environment::with_enclosing(Rc::clone(&self.closure));

        env.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(env)),
            is_initializer: self.is_initializer,
        }
    }

    /// Bind parameters in a fresh frame enclosing the closure, run the body,
    /// and consume the return signal.  An initializer always yields its
    /// receiver, even after a bare `return;`.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        let mut env: Environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, arg) in self.declaration.params.iter().zip(arguments) {
            env.define(&param.lexeme, arg);
        }

        let result =
            interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(env)));

        let returned: Value = match result {
            Ok(()) => Value::Nil,

            Err(Unwind::Return(value)) => value,

            Err(Unwind::Error(e)) => return Err(e),
        };

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this")
                .expect("initializer closure binds 'this'"));
        }

        Ok(returned)
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A built-in function implemented in the host.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&Interpreter, &[Value]) -> Result<Value>,
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}
