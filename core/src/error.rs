use thiserror::Error;

/// Failure kinds reported by graph mutation and algorithm calls.
///
/// Vertex values are rendered with `{:?}` so the error stays independent of
/// the graph's value type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("vertex {0} already exists")]
    DuplicateVertex(String),

    #[error("vertex {0} not found")]
    VertexNotFound(String),

    #[error("no edge from {from} to {to}")]
    EdgeNotFound { from: String, to: String },

    #[error("vertex {0} is unreachable from the last source")]
    Unreachable(String),

    #[error("edge {from} -> {to} has negative weight {weight}")]
    NegativeWeight {
        from: String,
        to: String,
        weight: f64,
    },

    #[error("graph contains a negative-weight cycle")]
    NegativeCycle,

    #[error("invalid capacity/flow pair: capacity {capacity}, flow {flow}")]
    InvalidCapacity { capacity: f64, flow: f64 },

    #[error("source and sink are the same vertex {0}")]
    SameSourceSink(String),

    #[error("no single-source shortest path run has been performed")]
    NoShortestPathRun,

    #[error("all-pairs matrix has not been built")]
    MatrixNotBuilt,

    #[error("all-pairs matrix built at generation {built}, graph is at {current}")]
    StaleMatrix { built: u64, current: u64 },
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Render a vertex value for an error message.
pub(crate) fn describe<T: std::fmt::Debug>(value: &T) -> String {
    format!("{:?}", value)
}
