//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Malformed literal input.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Index outside the valid range.
    #[error("Index {index} out of range{}", format_bound(.bound))]
    Index {
        /// The offending index.
        index: i64,
        /// Exclusive upper bound, when one applies.
        bound: Option<usize>,
    },

    /// Two sequences that must share a length do not.
    #[error("Length mismatch in {context}: {left} vs {right}")]
    LengthMismatch {
        /// What was being combined.
        context: String,
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },

    /// Matrix shape inconsistent with the declared number of qubits.
    #[error("{context}: expected a {expected}x{expected} matrix, got {rows}x{cols}")]
    Dimension {
        /// Name of the operation being built.
        context: String,
        /// Expected side length (2^n).
        expected: usize,
        /// Actual number of rows.
        rows: usize,
        /// Actual number of columns.
        cols: usize,
    },

    /// Probability list is negative or not normalized.
    #[error("Invalid probabilities for {context}: {reason}")]
    InvalidProbability {
        /// Name of the channel.
        context: String,
        /// What is wrong with the list.
        reason: String,
    },

    /// Only unitary operations can be classically conditioned.
    #[error("Cannot condition non-unitary operation '{0}' in an if statement")]
    NonUnitaryCondition(String),

    /// Evaluation hit a symbol with no binding.
    #[error("Symbol '{0}' is unbound")]
    UnboundSymbol(String),

    /// Numeric reduction is undefined.
    #[error("Domain error: {0}")]
    Domain(String),

    /// Requested matrix or decomposition is not defined for the operation.
    #[error("Operation '{op}' does not support {what}")]
    UnsupportedOperation {
        /// Name of the operation.
        op: String,
        /// The unsupported request.
        what: String,
    },

    /// Inverse of a non-unitary operation.
    #[error("Operation '{0}' is not invertible")]
    NotInvertible(String),

    /// Target exceeds the fixed dimensions of a block.
    #[error("Too many {register}: max {register_singular} index {index} does not fit in {capacity} {register}")]
    Capacity {
        /// Register name, plural ("qubits").
        register: &'static str,
        /// Register name, singular ("qubit").
        register_singular: &'static str,
        /// Highest index requested.
        index: usize,
        /// Fixed register size of the block.
        capacity: usize,
    },

    /// The same target appears twice in one instruction.
    #[error("Duplicate {register} target {index} in operation '{op}'")]
    DuplicateTarget {
        /// Name of the operation.
        op: String,
        /// Register kind.
        register: &'static str,
        /// The repeated index.
        index: usize,
    },

    /// Number of targets does not match the operation arity.
    #[error("'{op}' expects {expected} {register}, got {got}")]
    ArityMismatch {
        /// Name of the operation.
        op: String,
        /// Register kind.
        register: &'static str,
        /// Declared arity.
        expected: usize,
        /// Number of targets given.
        got: usize,
    },

    /// Constructor argument outside its allowed range.
    #[error("Invalid argument for {op}: {reason}")]
    InvalidArgument {
        /// Name of the operation being built.
        op: String,
        /// Human readable reason.
        reason: String,
    },
}

impl IrError {
    /// Shorthand for [`IrError::InvalidArgument`].
    pub fn invalid(op: impl Into<String>, reason: impl Into<String>) -> Self {
        IrError::InvalidArgument {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`IrError::UnsupportedOperation`].
    pub fn unsupported(op: impl Into<String>, what: impl Into<String>) -> Self {
        IrError::UnsupportedOperation {
            op: op.into(),
            what: what.into(),
        }
    }
}

#[allow(clippy::ref_option)]
fn format_bound(bound: &Option<usize>) -> String {
    match bound {
        Some(b) => format!(" (must be < {b})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
