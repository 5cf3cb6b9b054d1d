use thiserror::Error;

use super::NodeId;

/// The result of an AIG operation.
pub type Result<T> = std::result::Result<T, AigError>;

/// Error returned when an AIG operation failed.
#[derive(Debug, Error)]
pub enum AigError {
    /// A different node with the given id already exists.
    #[error("a different node with id={0} already exists")]
    DuplicateId(NodeId),

    /// The id 0 is reserved for the `False` constant node only.
    #[error("id=0 is for node False only")]
    IdZeroButNotFalse,

    /// The node with given id does not exist.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// The operation expects an and gate but the node is the constant or an input.
    #[error("node with id={0} is not an and gate")]
    NotAGate(NodeId),

    /// Exhaustive simulation was requested on too many inputs.
    #[error("exhaustive simulation supports at most {max} inputs, got {got}")]
    TooManyInputs { got: usize, max: usize },

    /// Simulation patterns do not match the inputs of the AIG.
    #[error("invalid simulation patterns: {0}")]
    InvalidPatterns(String),

    /// The AIG has reached an invalid state. This should never happen.
    /// For example, when tracking the nodes internally with the hashmap nodes,
    /// node `nodes[id]` should have id `id`.
    #[error("the AIG has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),
}
