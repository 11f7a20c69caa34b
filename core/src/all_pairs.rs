use std::fmt::Debug;

use log::{debug, warn};

use crate::error::{describe, GraphError, Result};
use crate::graph::{Graph, VertexId, INF};

/// Dense Floyd-Warshall result, row-major and indexed by vertex position.
///
/// Positions are the graph's store order at build time. The matrix records
/// the graph generation it was built from; queries against a graph that has
/// been mutated since are refused.
#[derive(Debug, Clone)]
pub struct AllPairs {
    n: usize,
    dist: Vec<f64>,
    /// `pred[i * n + j]` is the position preceding `j` on the best i→j path.
    pred: Vec<Option<usize>>,
    generation: u64,
}

impl AllPairs {
    /// Number of vertices the matrix covers.
    pub fn size(&self) -> usize {
        self.n
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn distance(&self, from: VertexId, to: VertexId) -> Option<f64> {
        (from.0 < self.n && to.0 < self.n).then(|| self.dist[from.0 * self.n + to.0])
    }

    pub fn predecessor(&self, from: VertexId, to: VertexId) -> Option<VertexId> {
        if from.0 >= self.n || to.0 >= self.n {
            return None;
        }
        self.pred[from.0 * self.n + to.0].map(VertexId)
    }

    /// True if some vertex reaches itself with negative total weight.
    pub fn has_negative_cycle(&self) -> bool {
        (0..self.n).any(|i| self.dist[i * self.n + i] < 0.0)
    }

    pub(crate) fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        self.dist.capacity() * size_of::<f64>() + self.pred.capacity() * size_of::<Option<usize>>()
    }
}

impl<T> Graph<T>
where
    T: PartialEq + Clone + Debug,
{
    /// Build the all-pairs distance and predecessor matrices.
    ///
    /// Parallel edges contribute their smallest weight. The matrix is kept
    /// even when a negative cycle is found, so it can be inspected, but the
    /// call reports `NegativeCycle`.
    pub fn floyd_warshall_shortest_path(&mut self) -> Result<()> {
        let n = self.vertex_count();
        let mut dist = vec![INF; n * n];
        let mut pred: Vec<Option<usize>> = vec![None; n * n];

        for i in 0..n {
            dist[i * n + i] = 0.0;
            pred[i * n + i] = Some(i);
        }
        for (_, e) in self.edges() {
            let (i, j) = (e.source().0, e.dest().0);
            if e.weight() < dist[i * n + j] {
                dist[i * n + j] = e.weight();
                pred[i * n + j] = Some(i);
            }
        }

        for k in 0..n {
            for i in 0..n {
                let d_ik = dist[i * n + k];
                if d_ik == INF {
                    continue;
                }
                for j in 0..n {
                    let through = d_ik + dist[k * n + j];
                    if through < dist[i * n + j] {
                        dist[i * n + j] = through;
                        pred[i * n + j] = pred[k * n + j];
                    }
                }
            }
        }

        let matrix = AllPairs {
            n,
            dist,
            pred,
            generation: self.generation(),
        };
        let negative = matrix.has_negative_cycle();
        self.all_pairs = Some(matrix);

        if negative {
            warn!("floyd-warshall: negative cycle in {} vertex graph", n);
            return Err(GraphError::NegativeCycle);
        }
        debug!("floyd-warshall: built {}x{} matrix", n, n);
        Ok(())
    }

    /// The last all-pairs matrix, if it is still current.
    pub fn all_pairs(&self) -> Result<&AllPairs> {
        let matrix = self.all_pairs.as_ref().ok_or(GraphError::MatrixNotBuilt)?;
        if matrix.generation != self.generation() {
            warn!(
                "all-pairs matrix is stale (built at {}, graph at {})",
                matrix.generation,
                self.generation()
            );
            return Err(GraphError::StaleMatrix {
                built: matrix.generation,
                current: self.generation(),
            });
        }
        Ok(matrix)
    }

    pub fn floyd_warshall_distance(&self, orig: &T, dest: &T) -> Result<f64> {
        let matrix = self.all_pairs()?;
        let i = self.require(orig)?;
        let j = self.require(dest)?;
        Ok(matrix.distance(i, j).unwrap_or(INF))
    }

    /// Path from `orig` to `dest` read off the predecessor matrix.
    ///
    /// Walks `pred[orig][..]` back from `dest` until it reaches `orig`'s
    /// own position.
    pub fn floyd_warshall_path(&self, orig: &T, dest: &T) -> Result<Vec<T>> {
        let matrix = self.all_pairs()?;
        let i = self.require(orig)?;
        let j = self.require(dest)?;
        let unreachable = || GraphError::Unreachable(describe(dest));

        if matrix.distance(i, j).unwrap_or(INF) == INF {
            return Err(unreachable());
        }

        let mut path = vec![dest.clone()];
        let mut current = j;
        while current != i {
            current = matrix.predecessor(i, current).ok_or_else(unreachable)?;
            if path.len() > matrix.size() {
                return Err(unreachable());
            }
            path.push(self.value_of(current).ok_or_else(unreachable)?.clone());
        }

        path.reverse();
        Ok(path)
    }
}
