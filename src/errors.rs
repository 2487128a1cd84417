use thiserror::Error;

use crate::types::Sexpr;

/// Failures while turning characters into data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("end of input")]
    EndOfInput,
    #[error("unexpected '{token}' at line {line}, column {column}")]
    Unexpected {
        token: String,
        line: usize,
        column: usize,
    },
    #[error("unterminated string at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("malformed number '{text}' at line {line}, column {column}")]
    BadNumber {
        text: String,
        line: usize,
        column: usize,
    },
    #[error("missing ')' for list opened at line {line}, column {column}")]
    Unclosed { line: usize, column: usize },
    #[error("{0}")]
    Io(String),
}

impl From<rustyline::error::ReadlineError> for ReadError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        use rustyline::error::ReadlineError;
        match err {
            ReadlineError::Eof | ReadlineError::Interrupted => ReadError::EndOfInput,
            other => ReadError::Io(other.to_string()),
        }
    }
}

/// Failures while evaluating. Each variant is one kind of the diagnostic
/// taxonomy; the `Display` form is `<kind>: <message>` and the front end
/// prefixes it with `Error: `.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("ReadError: {0}")]
    Read(#[from] ReadError),
    #[error("UnboundSymbol: unbound variable {0}")]
    Unbound(String),
    #[error("ArityError: {0}")]
    Arity(String),
    #[error("TypeError: {0}")]
    Type(String),
    #[error("ArithmeticError: {0}")]
    Arithmetic(String),
    #[error("AssignError: cannot set! unbound variable {0}")]
    Assign(String),
    #[error("MacroError: {0}")]
    Macro(String),
    #[error("CircularForce: promise forced during its own evaluation")]
    CircularForce,
    #[error("InternalError: {0}")]
    Internal(String),
    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn too_few_operands() -> Self {
        Error::Arity(String::from("too few operands in form"))
    }

    pub fn too_many_operands() -> Self {
        Error::Arity(String::from("too many operands in form"))
    }

    pub fn wrong_arg_num(name: &str) -> Self {
        Error::Arity(format!("incorrect number of arguments: {}", name))
    }

    pub fn wrong_type(index: usize, name: &str, value: &Sexpr) -> Self {
        Error::Type(format!(
            "argument {} of {} has wrong type ({})",
            index, name, value
        ))
    }

    pub fn not_a_number(value: &Sexpr) -> Self {
        Error::Type(format!("{} is not a number", value))
    }

    pub fn not_callable(value: &Sexpr) -> Self {
        Error::Type(format!("{} is not callable", value))
    }

    pub fn bad_form(expr: &Sexpr) -> Self {
        Error::Type(format!("badly formed expression: {}", expr))
    }

    pub fn division_by_zero() -> Self {
        Error::Arithmetic(String::from("division by zero"))
    }
}
