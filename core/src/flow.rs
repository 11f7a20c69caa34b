use std::collections::VecDeque;
use std::fmt::Debug;

use log::{debug, trace};

use crate::error::{describe, GraphError, Result};
use crate::graph::{EdgeId, Graph, Mark, VertexId};

/// One edge of an augmenting path and the direction it was traversed.
#[derive(Debug, Clone, Copy)]
struct Step {
    edge: EdgeId,
    forward: bool,
}

impl<T> Graph<T>
where
    T: PartialEq + Clone + Debug,
{
    /// Maximum flow from `source` to `sink` (Ford-Fulkerson with BFS path
    /// selection, i.e. Edmonds-Karp).
    ///
    /// Edge weights are capacities. All flows are reset to zero first; on
    /// return each edge's `flow` holds a maximum flow and the value is
    /// returned. A negative or NaN capacity fails with `InvalidCapacity`
    /// and leaves existing flows untouched.
    pub fn edmonds_karp(&mut self, source: &T, sink: &T) -> Result<f64> {
        let s = self.require(source)?;
        let t = self.require(sink)?;
        if s == t {
            return Err(GraphError::SameSourceSink(describe(source)));
        }
        if let Some((_, e)) = self.edges().find(|(_, e)| !(e.capacity() >= 0.0)) {
            return Err(GraphError::InvalidCapacity {
                capacity: e.capacity(),
                flow: e.flow(),
            });
        }

        for e in self.edges_mut() {
            e.flow = 0.0;
        }

        let mut max_flow = 0.0;
        let mut rounds = 0usize;
        while self.find_augmenting_path(s, t) {
            let steps = self.augmenting_steps(s, t);
            let amount = self.bottleneck(&steps);
            self.augment(&steps, amount);
            max_flow += amount;
            rounds += 1;
            trace!(
                "augmenting path {}: {} edges, +{} (total {})",
                rounds,
                steps.len(),
                amount,
                max_flow
            );
        }

        debug!(
            "max flow {:?} -> {:?}: {} after {} augmenting paths",
            source, sink, max_flow, rounds
        );
        Ok(max_flow)
    }

    /// Alias for [`Graph::edmonds_karp`].
    pub fn ford_fulkerson(&mut self, source: &T, sink: &T) -> Result<f64> {
        self.edmonds_karp(source, sink)
    }

    /// BFS over the residual graph from `s`, recording in each reached
    /// vertex the edge used to reach it. Stops once `t` is reached (if
    /// `t` is given). Returns the vertices reached, in BFS order.
    fn residual_bfs(&mut self, s: VertexId, t: Option<VertexId>) -> Vec<VertexId> {
        for v in self.vertices_mut() {
            v.mark = Mark::Unvisited;
            v.via = None;
        }
        self.vertex_mut(s).mark = Mark::Done;

        let mut reached = vec![s];
        let mut queue: VecDeque<VertexId> = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            if Some(v) == t {
                break;
            }
            // Forward along spare capacity, backward along cancelable flow.
            let candidates: Vec<(EdgeId, VertexId, f64)> = self
                .out_edges(v)
                .map(|(id, e)| (id, e.dest(), e.residual()))
                .chain(self.in_edges(v).map(|(id, e)| (id, e.source(), e.flow())))
                .collect();

            for (edge, w, residual) in candidates {
                let vertex = self.vertex_mut(w);
                if !vertex.is_visited() && residual > 0.0 {
                    vertex.mark = Mark::Done;
                    vertex.via = Some(edge);
                    reached.push(w);
                    queue.push_back(w);
                }
            }
        }

        reached
    }

    fn find_augmenting_path(&mut self, s: VertexId, t: VertexId) -> bool {
        self.residual_bfs(s, Some(t));
        self.vertex_at(t).is_some_and(|v| v.is_visited())
    }

    /// Walk `via` links back from `t` to `s`.
    fn augmenting_steps(&self, s: VertexId, t: VertexId) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut v = t;
        while v != s && steps.len() < self.vertex_count() {
            let Some(edge_id) = self.vertex_at(v).and_then(|x| x.via) else {
                break;
            };
            let Some(edge) = self.edge(edge_id) else {
                break;
            };
            let forward = edge.dest() == v;
            steps.push(Step {
                edge: edge_id,
                forward,
            });
            v = if forward { edge.source() } else { edge.dest() };
        }
        steps
    }

    fn bottleneck(&self, steps: &[Step]) -> f64 {
        steps
            .iter()
            .filter_map(|step| {
                self.edge(step.edge)
                    .map(|e| if step.forward { e.residual() } else { e.flow() })
            })
            .fold(f64::INFINITY, f64::min)
    }

    fn augment(&mut self, steps: &[Step], amount: f64) {
        for step in steps {
            if let Some(e) = self.edge_mut(step.edge) {
                if step.forward {
                    e.flow += amount;
                } else {
                    e.flow -= amount;
                }
            }
        }
    }

    /// Source side of a minimum cut: the vertices reachable from `source`
    /// in the residual graph of the current edge flows.
    ///
    /// Meaningful after [`Graph::edmonds_karp`]; returned in store order.
    pub fn min_cut(&mut self, source: &T) -> Result<Vec<T>> {
        let s = self.require(source)?;
        let mut reached = self.residual_bfs(s, None);
        reached.sort();
        Ok(reached
            .into_iter()
            .filter_map(|id| self.value_of(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GraphError;
    use crate::graph::Graph;

    fn network(vertices: &[&'static str], edges: &[(&'static str, &'static str, f64)]) -> Graph<&'static str> {
        let mut g = Graph::new();
        for &v in vertices {
            g.add_vertex(v).unwrap();
        }
        for &(a, b, c) in edges {
            g.add_flow_edge(&a, &b, c, 0.0).unwrap();
        }
        g
    }

    fn make_small() -> Graph<&'static str> {
        network(
            &["S", "A", "B", "T"],
            &[
                ("S", "A", 3.0),
                ("S", "B", 2.0),
                ("A", "T", 2.0),
                ("B", "T", 3.0),
                ("A", "B", 1.0),
            ],
        )
    }

    fn make_textbook() -> Graph<&'static str> {
        network(
            &["s", "v1", "v2", "v3", "v4", "t"],
            &[
                ("s", "v1", 16.0),
                ("s", "v2", 13.0),
                ("v1", "v3", 12.0),
                ("v2", "v1", 4.0),
                ("v2", "v4", 14.0),
                ("v3", "v2", 9.0),
                ("v3", "t", 20.0),
                ("v4", "v3", 7.0),
                ("v4", "t", 4.0),
            ],
        )
    }

    fn assert_valid_flow(g: &Graph<&'static str>, source: &str, sink: &str) {
        for (_, e) in g.edges() {
            assert!(e.flow() >= 0.0 && e.flow() <= e.capacity(), "{:?}", e);
        }
        for id in g.vertex_ids() {
            let value = *g.value_of(id).unwrap();
            if value == source || value == sink {
                continue;
            }
            let inflow: f64 = g.in_edges(id).map(|(_, e)| e.flow()).sum();
            let outflow: f64 = g.out_edges(id).map(|(_, e)| e.flow()).sum();
            assert_eq!(inflow, outflow, "conservation at {}", value);
        }
    }

    fn cut_capacity(g: &Graph<&'static str>, side: &[&'static str]) -> f64 {
        g.edges()
            .filter(|(_, e)| {
                side.contains(g.value_of(e.source()).unwrap())
                    && !side.contains(g.value_of(e.dest()).unwrap())
            })
            .map(|(_, e)| e.capacity())
            .sum()
    }

    #[test]
    fn test_small_network() {
        let mut g = make_small();
        assert_eq!(g.edmonds_karp(&"S", &"T").unwrap(), 5.0);
        assert_valid_flow(&g, "S", "T");

        let cut = g.min_cut(&"S").unwrap();
        assert_eq!(cut, vec!["S"]);
        assert_eq!(cut_capacity(&g, &cut), 5.0);
    }

    #[test]
    fn test_textbook_network() {
        let mut g = make_textbook();
        assert_eq!(g.edmonds_karp(&"s", &"t").unwrap(), 23.0);
        assert_valid_flow(&g, "s", "t");

        let cut = g.min_cut(&"s").unwrap();
        assert!(cut.contains(&"s") && !cut.contains(&"t"));
        assert_eq!(cut_capacity(&g, &cut), 23.0);
    }

    #[test]
    fn test_requires_canceling_flow() {
        // The first (shortest) path s→a→b→t must be partly undone through
        // the backward residual of a→b to reach the maximum.
        let mut g = network(
            &["s", "a", "b", "c", "d", "e", "t"],
            &[
                ("s", "a", 1.0),
                ("s", "c", 1.0),
                ("a", "b", 1.0),
                ("a", "d", 1.0),
                ("c", "b", 1.0),
                ("b", "t", 1.0),
                ("d", "e", 1.0),
                ("e", "t", 1.0),
            ],
        );
        assert_eq!(g.edmonds_karp(&"s", &"t").unwrap(), 2.0);
        assert_valid_flow(&g, "s", "t");
        let a_b = g.edges_from(&"a").unwrap()[0].flow();
        assert_eq!(a_b, 0.0);
    }

    #[test]
    fn test_flows_reset_between_runs() {
        let mut g = make_textbook();
        g.add_flow_edge(&"s", &"t", 5.0, 5.0).unwrap();
        assert_eq!(g.edmonds_karp(&"s", &"t").unwrap(), 28.0);
        assert_eq!(g.edmonds_karp(&"s", &"t").unwrap(), 28.0);
        assert_valid_flow(&g, "s", "t");
    }

    #[test]
    fn test_disconnected_sink() {
        let mut g = network(&["s", "a", "t"], &[("s", "a", 4.0)]);
        assert_eq!(g.ford_fulkerson(&"s", &"t").unwrap(), 0.0);
        assert_eq!(g.min_cut(&"s").unwrap(), vec!["s", "a"]);
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let mut g = network(&["s", "a", "t"], &[("s", "a", 2.0)]);
        g.add_edge(&"a", &"t", -1.0).unwrap();
        assert!(matches!(
            g.edmonds_karp(&"s", &"t"),
            Err(GraphError::InvalidCapacity { capacity, .. }) if capacity == -1.0
        ));

        g.add_edge(&"s", &"t", f64::NAN).unwrap();
        g.remove_edge(&"a", &"t").unwrap();
        assert!(matches!(
            g.edmonds_karp(&"s", &"t"),
            Err(GraphError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn test_invalid_endpoints() {
        let mut g = make_small();
        assert!(matches!(
            g.edmonds_karp(&"S", &"S"),
            Err(GraphError::SameSourceSink(_))
        ));
        assert!(matches!(
            g.edmonds_karp(&"S", &"Z"),
            Err(GraphError::VertexNotFound(_))
        ));
    }
}
