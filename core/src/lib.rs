//! digraph-core: in-memory directed graph with classical algorithms.
//!
//! A generic adjacency-list store keyed by vertex content, plus traversal
//! (DFS, BFS, topological sort, DAG check), single-source shortest paths
//! (BFS layering, Dijkstra, Bellman-Ford), all-pairs shortest paths
//! (Floyd-Warshall) and maximum flow (Edmonds-Karp).
//!
//! Every algorithm resets the per-vertex scratch state it uses before
//! running, so results from one run never leak into the next. Results are
//! read back through [`Vertex`] accessors or the path reconstruction
//! methods on [`Graph`].

mod all_pairs;
mod error;
mod flow;
mod graph;
mod queue;
mod shortest_path;
mod traversal;

pub use all_pairs::AllPairs;
pub use error::{GraphError, Result};
pub use graph::{
    Edge, EdgeId, EdgeSnapshot, Graph, GraphSnapshot, Mark, Vertex, VertexId, VertexSnapshot, INF,
};
pub use queue::MutablePriorityQueue;
pub use traversal::DegreeSummary;
