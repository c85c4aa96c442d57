//! The recursive AST walker.
//!
//! Runtime state is two environment handles (`globals` and the currently
//! active frame) plus the read-only binding-distance map produced by the
//! resolver.  Variable reads and writes follow the distance discipline: a
//! resolved expression walks exactly that many enclosing frames; an
//! unresolved one goes straight to globals.
//!
//! Execution is strictly single-threaded and synchronous.  Recursion depth
//! is bounded by the host stack.

use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result, RuntimeErrorKind};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Non-error control signal threaded through statement execution.  `Return`
/// unwinds exactly one call frame: it is consumed at function-call
/// boundaries only and never surfaces as a user-visible error.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Error(e)
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    started: Instant,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter writing `print` output to the given sink.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            })),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            started: Instant::now(),
            output,
        }
    }

    /// Monotonic seconds since this interpreter was created.
    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Execute a resolved program.  `locals` is the binding-distance map
    /// produced by the resolver for this statement sequence.
    pub fn interpret(
        &mut self,
        statements: &[Stmt],
        locals: HashMap<ExprId, usize>,
    ) -> Result<()> {
        self.locals = locals;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Return(_)) => unreachable!("resolver rejects top-level 'return'"),

                Err(Unwind::Error(e)) => return Err(e),
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> std::result::Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(env)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(decl) => {
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods)?;

                Ok(())
            }
        }
    }

    /// Run `statements` inside `env`, restoring the previous environment on
    /// every exit path, including errors and return signals.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> std::result::Result<(), Unwind> {
        let previous: Rc<RefCell<Environment>> = std::mem::replace(&mut self.environment, env);

        let mut result: std::result::Result<(), Unwind> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let token: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };

                    return Err(LoxError::runtime(
                        token,
                        RuntimeErrorKind::SuperclassNotClass,
                    ));
                }
            },

            None => None,
        };

        // The class name is visible (as nil) while methods are created, and
        // assigned the finished class afterwards.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // When inheriting, methods close over an extra frame holding `super`.
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        if let Some(ref sc) = superclass_value {
            let mut env = Environment::with_enclosing(Rc::clone(&self.environment));

            env.define("super", Value::Class(Rc::clone(sc)));

            self.environment = Rc::new(RefCell::new(env));
        }

        let mut method_map: HashMap<String, LoxFunction> = HashMap::new();

        for method in methods {
            let is_initializer: bool = method.name.lexeme == "init";

            let function =
                LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);

            method_map.insert(method.name.lexeme.clone(), function);
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

        if superclass.is_some() {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),

                LiteralValue::Str(s) => Value::String(s.clone()),

                LiteralValue::True => Value::Bool(true),

                LiteralValue::False => Value::Bool(false),

                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                // Short-circuit yields the operand value itself, never a
                // coerced boolean.
                let left_val: Value = self.evaluate(left)?;

                match operator.token_type {
                    TokenType::OR if is_truthy(&left_val) => Ok(left_val),

                    TokenType::AND if !is_truthy(&left_val) => Ok(left_val),

                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                self.assign_variable(*id, name, value.clone())?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                match callee_val {
                    Value::Function(function) => {
                        check_arity(function.arity(), args.len(), paren)?;

                        debug!("Calling {}", function);

                        function.call(self, args)
                    }

                    Value::Class(class) => {
                        check_arity(class.arity(), args.len(), paren)?;

                        LoxClass::instantiate(&class, self, args)
                    }

                    Value::Native(native) => {
                        check_arity(native.arity, args.len(), paren)?;

                        (native.func)(self, &args)
                    }

                    _ => Err(LoxError::runtime(paren, RuntimeErrorKind::NotCallable)),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),

                _ => Err(LoxError::runtime(name, RuntimeErrorKind::InstanceProperty)),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;

                    instance.borrow_mut().set(name, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name, RuntimeErrorKind::InstanceProperty)),
            },

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super { id, keyword, method } => {
                let distance: usize = *self
                    .locals
                    .get(id)
                    .unwrap_or_else(|| panic!("'super' at line {} was not resolved", keyword.line));

                let superclass: Rc<LoxClass> =
                    match Environment::get_at(&self.environment, distance, "super") {
                        Some(Value::Class(class)) => class,

                        _ => unreachable!("the 'super' frame holds the superclass"),
                    };

                // The receiver lives one frame inside the `super` frame.
                let object: Rc<RefCell<LoxInstance>> =
                    match Environment::get_at(&self.environment, distance - 1, "this") {
                        Some(Value::Instance(instance)) => instance,

                        _ => unreachable!("method frames bind 'this'"),
                    };

                match superclass.find_method(&method.lexeme) {
                    Some(m) => Ok(Value::Function(Rc::new(m.bind(object)))),

                    None => Err(LoxError::runtime(
                        method,
                        RuntimeErrorKind::UndefinedProperty,
                    )),
                }
            }
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator, RuntimeErrorKind::NumberOperand)),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => unreachable!("invalid unary operator"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOrStringOperands,
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            // Division by zero follows IEEE-754 double semantics.
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(
                    operator,
                    RuntimeErrorKind::NumberOperands,
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => unreachable!("invalid binary operator"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Variable access discipline
    // ─────────────────────────────────────────────────────────────────────

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, &name.lexeme)
                .ok_or_else(|| LoxError::runtime(name, RuntimeErrorKind::UndefinedVariable)),

            None => self.globals.borrow().get(name),
        }
    }

    fn assign_variable(&mut self, id: ExprId, name: &Token, value: Value) -> Result<()> {
        match self.locals.get(&id) {
            Some(distance) => {
                if Environment::assign_at(&self.environment, *distance, &name.lexeme, value) {
                    Ok(())
                } else {
                    Err(LoxError::runtime(name, RuntimeErrorKind::UndefinedVariable))
                }
            }

            None => self.globals.borrow_mut().assign(name, value),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// nil and `false` are falsy; everything else, including `0` and `""`, is
/// truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn check_arity(arity: usize, got: usize, paren: &Token) -> Result<()> {
    if got < arity {
        Err(LoxError::runtime(paren, RuntimeErrorKind::TooFewArguments))
    } else if got > arity {
        Err(LoxError::runtime(paren, RuntimeErrorKind::TooManyArguments))
    } else {
        Ok(())
    }
}

fn clock_native(interpreter: &Interpreter, _args: &[Value]) -> Result<Value> {
    Ok(Value::Number(interpreter.uptime()))
}
