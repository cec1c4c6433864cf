//! Restricted condition language used by ruleset authors.
//!
//! Conditions are lexed and parsed into an explicit tree and evaluated by a
//! tree-walking interpreter over typed values. Anything the grammar does not
//! describe is rejected as unsafe before evaluation begins.

mod bounds;
mod interpreter;
mod lexer;
mod parser;

pub use bounds::{numeric_bounds, BoundKind, NumericBound};
pub use interpreter::{evaluate, evaluate_condition, Bindings};
pub use lexer::is_identifier;
pub use parser::{parse, ArithmeticOp, Comparator, Expr, LogicalOp};

/// Failure to accept or evaluate a condition expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unsafe expression detected: {0}")]
    Unsafe(String),
    #[error("{0}")]
    Evaluation(String),
}
