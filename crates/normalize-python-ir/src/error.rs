//! Errors raised while normalizing a syntax tree.

/// Error from the normalization core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// A component was handed a node outside its contract. Fatal.
    #[error("invariant violation: expected {expected}, got {got}")]
    InvariantViolation { expected: &'static str, got: String },

    /// A literal node whose parts do not fit together. The resolver turns
    /// this into raw text for that one node.
    #[error("malformed {node} literal: {reason}")]
    MalformedLiteral { node: &'static str, reason: String },
}
