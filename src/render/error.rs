//! Errors raised while rendering a compiled template

use thiserror::Error;

use super::value::Value;
use crate::template::ast::{BinaryOp, UnaryOp};
use crate::theme::ThemeError;

/// Why an expression or statement could not be evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("unsupported operand types for '{op}': {left} and {right}")]
    Operands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("bad operand type for '{op}': {operand}")]
    Operand { op: &'static str, operand: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("key '{0}' not found")]
    MissingKey(String),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("{target} cannot be indexed by {index}")]
    NotIndexable {
        target: &'static str,
        index: &'static str,
    },

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("{0} is not iterable")]
    NotIterable(&'static str),

    #[error("cannot unpack {found} into {expected} names")]
    Unpack { expected: usize, found: String },

    #[error("result of {size} exceeds the limit of {limit}")]
    TooLarge { size: u128, limit: usize },

    #[error("{helper}(): {message}")]
    Helper { helper: String, message: String },

    #[error(transparent)]
    Style(#[from] ThemeError),
}

impl EvalError {
    pub fn operands(op: BinaryOp, left: &Value, right: &Value) -> Self {
        Self::Operands {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }
    }

    pub fn operand(op: UnaryOp, operand: &Value) -> Self {
        let op = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        };
        Self::Operand {
            op,
            operand: operand.type_name(),
        }
    }

    pub fn helper(helper: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Helper {
            helper: helper.into(),
            message: message.into(),
        }
    }
}

/// A render failure. No partial output accompanies it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// An expression or statement failed at `position`
    #[error("render error at byte {position}: {cause}")]
    Evaluation {
        position: usize,
        #[source]
        cause: EvalError,
    },

    /// `for`/`if` blocks and their terminators do not pair up
    #[error("template structure error at byte {position}: {reason}")]
    Structure { position: usize, reason: String },
}

impl RenderError {
    pub fn evaluation(position: usize, cause: EvalError) -> Self {
        Self::Evaluation { position, cause }
    }

    pub fn structure(position: usize, reason: impl Into<String>) -> Self {
        Self::Structure {
            position,
            reason: reason.into(),
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::Evaluation { position, .. } | Self::Structure { position, .. } => *position,
        }
    }
}
