//! Error types for the resolution engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogicError>;

/// Fatal conditions raised while building terms or running a query.
///
/// Ordinary unification or goal failure is never reported here; it only
/// drives backtracking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogicError {
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Undefined procedure: {name}/{arity}")]
    UndefinedProcedure { name: String, arity: usize },

    #[error("Unbound variable {var} in arithmetic expression {expr}")]
    UnboundInArithmetic { var: String, expr: String },

    #[error("{rest} in {list} is unknown")]
    MalformedList { list: String, rest: String },

    #[error("Illegal variable name {0:?}: the prefix '_G' is reserved")]
    IllegalVariableName(String),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Not a host value: {0}")]
    NotHostValue(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Two variables are named {0:?}")]
    DuplicateName(String),
}

impl LogicError {
    /// Stable error code, independent of the message text
    pub fn code(&self) -> &'static str {
        match self {
            LogicError::UnsupportedValue(_) => "UNSUPPORTED_VALUE",
            LogicError::UndefinedProcedure { .. } => "UNDEFINED_PROCEDURE",
            LogicError::UnboundInArithmetic { .. } => "UNBOUND_IN_ARITHMETIC",
            LogicError::MalformedList { .. } => "MALFORMED_LIST",
            LogicError::IllegalVariableName(_) => "ILLEGAL_VARIABLE_NAME",
            LogicError::Arithmetic(_) => "ARITHMETIC",
            LogicError::NotHostValue(_) => "NOT_HOST_VALUE",
            LogicError::Format(_) => "FORMAT",
            LogicError::DuplicateName(_) => "DUPLICATE_NAME",
        }
    }
}
