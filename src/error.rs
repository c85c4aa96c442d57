//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.  Parse, resolve, and runtime failures carry a dedicated kind enum
//! so callers and tests can match on the failure symbolically instead of
//! scraping message strings.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] error at {location}: {kind}")]
    Parse {
        kind: ParseErrorKind,
        location: String,
        line: usize,
    },

    /// Static-analysis (resolver) failure.
    #[error("[line {line}] error at {location}: {kind}")]
    Resolve {
        kind: ResolveErrorKind,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("{kind}\n[line {line}]")]
    Runtime { kind: RuntimeErrorKind, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where-part of a parse/resolve diagnostic: `end` for the EOF token,
/// the quoted lexeme otherwise.
fn locate(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        "end".to_string()
    } else {
        format!("'{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse(token: &Token, kind: ParseErrorKind) -> Self {
        info!("Creating Parse error: line={}, kind={:?}", token.line, kind);

        LoxError::Parse {
            kind,
            location: locate(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve(token: &Token, kind: ResolveErrorKind) -> Self {
        info!(
            "Creating Resolve error: line={}, kind={:?}",
            token.line, kind
        );

        LoxError::Resolve {
            kind,
            location: locate(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime(token: &Token, kind: RuntimeErrorKind) -> Self {
        info!(
            "Creating Runtime error: line={}, kind={:?}",
            token.line, kind
        );

        LoxError::Runtime {
            kind,
            line: token.line,
        }
    }
}

/// Everything the parser can reject, one variant per syntactic rule.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("missing ')' after expression")]
    MissingRightParen,

    #[error("missing '}}' after block")]
    MissingRightBrace,

    #[error("missing ';' after value")]
    MissingValueSemicolon,

    #[error("missing ';' after expression")]
    MissingExprSemicolon,

    #[error("missing ';' after variable declaration")]
    MissingVarSemicolon,

    #[error("missing expression")]
    MissingExpr,

    #[error("missing variable name")]
    MissingVariableName,

    #[error("invalid assignment target")]
    InvalidAssignTarget,

    #[error("missing '(' after 'if'")]
    MissingIfLeftParen,

    #[error("missing ')' after 'if' condition")]
    MissingIfRightParen,

    #[error("missing '(' after 'while'")]
    MissingWhileLeftParen,

    #[error("missing ')' after condition")]
    MissingConditionRightParen,

    #[error("missing '(' after 'for'")]
    MissingForLeftParen,

    #[error("missing ')' after for clauses")]
    MissingForRightParen,

    #[error("missing ';' after loop condition")]
    MissingConditionSemicolon,

    #[error("missing ')' after arguments")]
    MissingArgumentsRightParen,

    #[error("missing function name")]
    MissingFunctionName,

    #[error("missing '(' after function name")]
    MissingFunctionLeftParen,

    #[error("missing ')' after parameters")]
    MissingFunctionRightParen,

    #[error("missing parameter name")]
    MissingParameterName,

    #[error("missing '{{' before function body")]
    MissingFunctionLeftBrace,

    #[error("missing ';' after return value")]
    MissingReturnSemicolon,

    #[error("missing class name")]
    MissingClassName,

    #[error("missing '{{' before class body")]
    MissingClassLeftBrace,

    #[error("missing '}}' after class body")]
    MissingClassRightBrace,

    #[error("missing property name after '.'")]
    MissingPropertyName,

    #[error("missing superclass name")]
    MissingSuperclassName,

    #[error("missing '.' after 'super'")]
    MissingSuperclassDot,

    #[error("missing superclass method name")]
    MissingSuperclassMethod,
}

/// Static rules the resolver enforces before any code runs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("cannot read local variable in its own initializer")]
    VarInInitializer,

    #[error("cannot declare a variable that is already in this scope")]
    DuplicateVariable,

    #[error("cannot return from top-level code")]
    TopLevelReturn,

    #[error("cannot return a value from an initializer")]
    InitializerReturn,

    #[error("cannot use 'this' outside of a class")]
    ThisOutsideClass,

    #[error("a class cannot inherit from itself")]
    SelfInherit,

    #[error("cannot use 'super' outside of a class")]
    SuperOutsideClass,

    #[error("cannot use 'super' in a class with no superclass")]
    SuperNoSuperclass,
}

/// First-failure runtime errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    #[error("operand must be a number")]
    NumberOperand,

    #[error("operands must be numbers")]
    NumberOperands,

    #[error("operands must be two numbers or two strings")]
    NumberOrStringOperands,

    #[error("undefined variable")]
    UndefinedVariable,

    #[error("callable must be a function or a class")]
    NotCallable,

    #[error("too few arguments passed to the function")]
    TooFewArguments,

    #[error("too many arguments passed to the function")]
    TooManyArguments,

    #[error("only instances have properties")]
    InstanceProperty,

    #[error("undefined property")]
    UndefinedProperty,

    #[error("superclass must be a class")]
    SuperclassNotClass,
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
