use thiserror::Error;

/// A fragment list that cannot be turned into changes
///
/// These are structural violations by whoever produced the fragments, so they
/// are reported back to that caller and the registry keeps its previous state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("fragment {index} has an inverted range {start}..{end} on {side}")]
    InvertedRange {
        index: usize,
        side: String,
        start: usize,
        end: usize,
    },

    #[error("fragment {index} starts before the previous fragment on {side}")]
    Unordered { index: usize, side: String },

    #[error("fragment {index} overlaps the previous fragment on {side}")]
    Overlapping { index: usize, side: String },

    #[error("fragment {index} is empty on every side")]
    Empty { index: usize },

    #[error("fragment has {actual} ranges, the comparison has {expected} sides")]
    Cardinality { expected: usize, actual: usize },

    #[error("{fragments} fragments but {details} conflict types")]
    DetailsMismatch { fragments: usize, details: usize },
}

/// Why a comparison produced no change set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    /// The inputs exceed the configured size limit; `equal` tells whether
    /// the texts are identical anyway
    #[error("comparison is too large: {lines} lines, limit is {limit}")]
    TooLarge {
        lines: usize,
        limit: usize,
        equal: bool,
    },

    /// The cancellation token fired before the computation finished
    #[error("comparison was cancelled")]
    Cancelled,

    #[error(transparent)]
    Fragment(#[from] FragmentError),
}
