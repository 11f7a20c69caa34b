use std::collections::VecDeque;
use std::fmt::Debug;

use log::{debug, warn};

use crate::error::{describe, GraphError, Result};
use crate::graph::{Graph, VertexId, INF};
use crate::queue::MutablePriorityQueue;

impl<T> Graph<T>
where
    T: PartialEq + Clone + Debug,
{
    /// Reset every `dist` to [`INF`] and `path` to none, then zero the source.
    fn prepare_single_source(&mut self, source: &T) -> Result<VertexId> {
        let s = self.require(source)?;
        for v in self.vertices_mut() {
            v.dist = INF;
            v.path = None;
        }
        self.vertex_mut(s).dist = 0.0;
        self.last_source = Some(s);
        Ok(s)
    }

    fn dist_of(&self, id: VertexId) -> f64 {
        self.vertex_at(id).map_or(INF, |v| v.dist())
    }

    fn relax_targets(&self, v: VertexId) -> Vec<(VertexId, f64)> {
        self.out_edges(v).map(|(_, e)| (e.dest(), e.weight())).collect()
    }

    /// Hop-count distances by BFS layering.
    ///
    /// A vertex's `dist` is set only the first time it is reached, which
    /// makes it the minimum edge count from the source.
    pub fn unweighted_shortest_path(&mut self, source: &T) -> Result<()> {
        let s = self.prepare_single_source(source)?;

        let mut queue: VecDeque<VertexId> = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            let next = self.dist_of(v) + 1.0;
            for (w, _) in self.relax_targets(v) {
                let target = self.vertex_mut(w);
                if target.dist == INF {
                    target.dist = next;
                    target.path = Some(v);
                    queue.push_back(w);
                }
            }
        }

        debug!("unweighted shortest paths from {:?} done", source);
        Ok(())
    }

    /// Dijkstra with an indexed priority queue (insert / decrease-key).
    ///
    /// Fails with `NegativeWeight`, leaving previous results untouched, if any
    /// edge in the graph has a negative weight.
    pub fn dijkstra_shortest_path(&mut self, source: &T) -> Result<()> {
        let s = self.require(source)?;
        if let Some((_, e)) = self.edges().find(|(_, e)| e.weight() < 0.0) {
            let from = self.value_of(e.source()).map(describe).unwrap_or_default();
            let to = self.value_of(e.dest()).map(describe).unwrap_or_default();
            return Err(GraphError::NegativeWeight {
                from,
                to,
                weight: e.weight(),
            });
        }
        self.prepare_single_source(source)?;

        let mut queue = MutablePriorityQueue::new(self.vertex_count());
        queue.insert(s, 0.0);
        let mut settled = 0usize;

        while let Some((v, dist_v)) = queue.extract_min() {
            settled += 1;
            for (w, weight) in self.relax_targets(v) {
                let candidate = dist_v + weight;
                let target = self.vertex_mut(w);
                if target.dist > candidate {
                    target.dist = candidate;
                    target.path = Some(v);
                    if queue.contains(w) {
                        queue.decrease_key(w, candidate);
                    } else {
                        queue.insert(w, candidate);
                    }
                }
            }
        }

        debug!("dijkstra from {:?}: {} vertices settled", source, settled);
        Ok(())
    }

    /// Bellman-Ford: exactly |V| - 1 relaxation passes over every edge.
    ///
    /// Negative weights are allowed. A final pass that can still relax an
    /// edge means a negative cycle is reachable from the source and the call
    /// returns `NegativeCycle`; the distances from the |V| - 1 passes are
    /// left in place.
    pub fn bellman_ford_shortest_path(&mut self, source: &T) -> Result<()> {
        self.prepare_single_source(source)?;

        // Relax in vertex order, then edge-list order.
        let mut ordered: Vec<(VertexId, VertexId, f64)> = Vec::with_capacity(self.edge_count());
        for v in self.vertex_ids() {
            ordered.extend(self.out_edges(v).map(|(_, e)| (v, e.dest(), e.weight())));
        }

        let passes = self.vertex_count().saturating_sub(1);
        for _ in 0..passes {
            for &(u, w, weight) in &ordered {
                let candidate = self.dist_of(u) + weight;
                let target = self.vertex_mut(w);
                if target.dist > candidate {
                    target.dist = candidate;
                    target.path = Some(u);
                }
            }
        }

        let improvable = ordered
            .iter()
            .any(|&(u, w, weight)| self.dist_of(u) + weight < self.dist_of(w));
        if improvable {
            warn!("bellman-ford from {:?}: negative cycle reachable", source);
            return Err(GraphError::NegativeCycle);
        }

        debug!("bellman-ford from {:?}: {} passes", source, passes);
        Ok(())
    }

    /// Source of the most recent single-source run, if it still exists.
    pub fn last_source(&self) -> Option<&T> {
        self.last_source.and_then(|s| self.value_of(s))
    }

    /// Distance to `dest` from the most recent single-source run.
    pub fn distance_to(&self, dest: &T) -> Result<f64> {
        let d = self.require(dest)?;
        Ok(self.dist_of(d))
    }

    /// Reconstruct the path from the last run's source to `dest` by walking
    /// predecessor links backwards.
    ///
    /// Returns `Unreachable` if `dest` has no finite distance or its chain
    /// does not end at the source within |V| steps.
    pub fn path_to(&self, dest: &T) -> Result<Vec<T>> {
        let source = self.last_source.ok_or(GraphError::NoShortestPathRun)?;
        let d = self.require(dest)?;
        let unreachable = || GraphError::Unreachable(describe(dest));

        if self.dist_of(d) == INF {
            return Err(unreachable());
        }

        let mut path = Vec::new();
        let mut current = d;
        loop {
            let vertex = self.vertex_at(current).ok_or_else(unreachable)?;
            path.push(vertex.value().clone());
            if current == source {
                break;
            }
            if path.len() > self.vertex_count() {
                return Err(unreachable());
            }
            current = vertex.predecessor().ok_or_else(unreachable)?;
        }

        path.reverse();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GraphError;
    use crate::graph::{Graph, INF};

    fn weighted(vertices: &[u32], edges: &[(u32, u32, f64)]) -> Graph<u32> {
        let mut g = Graph::new();
        for &v in vertices {
            g.add_vertex(v).unwrap();
        }
        for &(a, b, w) in edges {
            g.add_edge(&a, &b, w).unwrap();
        }
        g
    }

    fn make_scenario() -> Graph<u32> {
        weighted(
            &[1, 2, 3, 4],
            &[(1, 2, 1.0), (2, 3, 2.0), (1, 3, 5.0), (3, 4, 1.0)],
        )
    }

    // Weighted graph from the classic exercise set.
    fn make_exercise() -> Graph<u32> {
        weighted(
            &[1, 2, 3, 4, 5, 6, 7],
            &[
                (1, 2, 2.0),
                (1, 4, 7.0),
                (2, 4, 3.0),
                (2, 5, 5.0),
                (3, 1, 2.0),
                (3, 6, 5.0),
                (4, 3, 1.0),
                (4, 5, 1.0),
                (4, 6, 6.0),
                (4, 7, 4.0),
                (5, 7, 2.0),
                (6, 4, 3.0),
                (7, 6, 4.0),
            ],
        )
    }

    fn dists(g: &Graph<u32>) -> Vec<f64> {
        g.vertices().map(|v| v.dist()).collect()
    }

    #[test]
    fn test_dijkstra_scenario() {
        let mut g = make_scenario();
        g.dijkstra_shortest_path(&1).unwrap();
        assert_eq!(dists(&g), vec![0.0, 1.0, 3.0, 4.0]);
        assert_eq!(g.path_to(&4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(g.predecessor_of(&4), Some(&3));
    }

    #[test]
    fn test_unweighted_hop_counts() {
        let mut g = make_exercise();
        g.unweighted_shortest_path(&3).unwrap();
        assert_eq!(g.path_to(&7).unwrap(), vec![3, 1, 4, 7]);
        assert_eq!(g.distance_to(&7).unwrap(), 3.0);
        assert_eq!(g.distance_to(&6).unwrap(), 1.0);
        assert_eq!(g.path_to(&3).unwrap(), vec![3]);
    }

    #[test]
    fn test_unweighted_unreachable_stays_infinite() {
        let mut g = weighted(&[0, 1, 2], &[(0, 1, 1.0)]);
        g.unweighted_shortest_path(&0).unwrap();
        assert_eq!(g.distance_to(&2).unwrap(), INF);
        assert!(matches!(g.path_to(&2), Err(GraphError::Unreachable(_))));
    }

    #[test]
    fn test_dijkstra_exercise_paths() {
        let mut g = make_exercise();
        g.dijkstra_shortest_path(&3).unwrap();
        assert_eq!(g.path_to(&7).unwrap(), vec![3, 1, 2, 4, 5, 7]);
        assert_eq!(g.distance_to(&7).unwrap(), 10.0);

        g.dijkstra_shortest_path(&1).unwrap();
        assert_eq!(g.path_to(&7).unwrap(), vec![1, 2, 4, 5, 7]);
        assert_eq!(g.path_to(&6).unwrap(), vec![1, 2, 4, 6]);
        assert_eq!(g.distance_to(&6).unwrap(), 11.0);
    }

    #[test]
    fn test_dijkstra_rejects_negative_weight() {
        let mut g = make_scenario();
        g.dijkstra_shortest_path(&1).unwrap();
        g.add_edge(&4, &1, -1.0).unwrap();
        assert!(matches!(
            g.dijkstra_shortest_path(&1),
            Err(GraphError::NegativeWeight { weight, .. }) if weight == -1.0
        ));
        // Previous results untouched.
        assert_eq!(g.distance_to(&4).unwrap(), 4.0);
    }

    #[test]
    fn test_bellman_ford_matches_dijkstra() {
        let mut g = make_exercise();
        for s in 1..=7 {
            g.dijkstra_shortest_path(&s).unwrap();
            let expected = dists(&g);
            g.bellman_ford_shortest_path(&s).unwrap();
            assert_eq!(dists(&g), expected, "source {}", s);
        }
    }

    #[test]
    fn test_bellman_ford_negative_weights() {
        let mut g = weighted(
            &[0, 1, 2, 3],
            &[(0, 1, 4.0), (0, 2, 5.0), (2, 1, -3.0), (1, 3, 2.0)],
        );
        g.bellman_ford_shortest_path(&0).unwrap();
        assert_eq!(dists(&g), vec![0.0, 2.0, 5.0, 4.0]);
        assert_eq!(g.path_to(&3).unwrap(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_bellman_ford_negative_cycle_detected() {
        let mut g = weighted(
            &[0, 1, 2],
            &[(0, 1, 1.0), (1, 2, -2.0), (2, 1, 1.0)],
        );
        assert_eq!(g.bellman_ford_shortest_path(&0), Err(GraphError::NegativeCycle));
    }

    #[test]
    fn test_bellman_ford_unreachable_negative_cycle_ignored() {
        let mut g = weighted(
            &[0, 1, 2, 3],
            &[(0, 1, 1.0), (2, 3, -2.0), (3, 2, 1.0)],
        );
        g.bellman_ford_shortest_path(&0).unwrap();
        assert_eq!(g.distance_to(&2).unwrap(), INF);
    }

    #[test]
    fn test_single_vertex_graph() {
        let mut g = weighted(&[0], &[]);
        g.bellman_ford_shortest_path(&0).unwrap();
        assert_eq!(g.path_to(&0).unwrap(), vec![0]);
    }

    #[test]
    fn test_missing_source_and_no_run() {
        let mut g = make_scenario();
        assert_eq!(g.path_to(&4), Err(GraphError::NoShortestPathRun));
        assert!(matches!(
            g.dijkstra_shortest_path(&9),
            Err(GraphError::VertexNotFound(_))
        ));
        assert!(matches!(
            g.unweighted_shortest_path(&9),
            Err(GraphError::VertexNotFound(_))
        ));
        assert!(matches!(
            g.bellman_ford_shortest_path(&9),
            Err(GraphError::VertexNotFound(_))
        ));
    }

    #[test]
    fn test_runs_do_not_leak_state() {
        let mut g = make_scenario();
        g.dijkstra_shortest_path(&1).unwrap();
        g.unweighted_shortest_path(&2).unwrap();
        assert_eq!(g.distance_to(&1).unwrap(), INF);
        assert_eq!(g.predecessor_of(&2), None);
        assert_eq!(g.distance_to(&4).unwrap(), 2.0);
        assert_eq!(g.last_source(), Some(&2));
    }

    #[test]
    fn test_path_after_removing_intermediate_vertex() {
        let mut g = make_scenario();
        g.dijkstra_shortest_path(&1).unwrap();
        g.remove_vertex(&3).unwrap();
        assert!(matches!(g.path_to(&4), Err(GraphError::Unreachable(_))));
        assert_eq!(g.distance_to(&4).unwrap(), INF);
        assert_eq!(g.path_to(&2).unwrap(), vec![1, 2]);
        assert_eq!(g.distance_to(&2).unwrap(), 1.0);
    }

    #[test]
    fn test_removal_resets_whole_downstream_chain() {
        let mut g = weighted(
            &[0, 1, 2, 3, 4],
            &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (0, 4, 1.0)],
        );
        g.dijkstra_shortest_path(&0).unwrap();
        g.remove_vertex(&1).unwrap();

        for v in [2, 3] {
            assert_eq!(g.distance_to(&v).unwrap(), INF);
            assert!(matches!(g.path_to(&v), Err(GraphError::Unreachable(_))));
        }
        assert_eq!(g.distance_to(&4).unwrap(), 1.0);
        assert_eq!(g.path_to(&4).unwrap(), vec![0, 4]);
    }

    #[test]
    fn test_removing_source_clears_results() {
        let mut g = make_scenario();
        g.dijkstra_shortest_path(&1).unwrap();
        g.remove_vertex(&1).unwrap();

        assert_eq!(g.last_source(), None);
        assert!(g.vertices().all(|v| v.dist() == INF && v.predecessor().is_none()));
        assert_eq!(g.path_to(&4), Err(GraphError::NoShortestPathRun));
    }
}
