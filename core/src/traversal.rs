use std::collections::VecDeque;
use std::fmt::Debug;

use log::debug;

use crate::error::{describe, GraphError, Result};
use crate::graph::{Graph, Mark, VertexId};

/// Degree information for a single vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeSummary<T> {
    pub value: T,
    pub out_degree: usize,
    pub in_degree: usize,
    pub total_degree: usize,
}

impl<T> Graph<T>
where
    T: PartialEq + Clone + Debug,
{
    fn reset_marks(&mut self) {
        for v in self.vertices_mut() {
            v.mark = Mark::Unvisited;
        }
    }

    fn nth_successor(&self, v: VertexId, i: usize) -> Option<Option<VertexId>> {
        self.vertex_at(v)?
            .outgoing()
            .get(i)
            .map(|&eid| self.edge(eid).map(|e| e.dest()))
    }

    /// Iterative pre-order DFS from `root` using an explicit stack of
    /// (vertex, next edge index) frames, so children are visited in
    /// edge-list order exactly like the recursive formulation.
    ///
    /// Vertices are `InProgress` while on the stack and `Done` once all
    /// their edges are exhausted. Returns true if an edge into an
    /// `InProgress` vertex (a back edge) was seen; with `stop_at_back_edge`
    /// the walk returns as soon as that happens.
    fn depth_first(
        &mut self,
        root: VertexId,
        mut order: Option<&mut Vec<T>>,
        stop_at_back_edge: bool,
    ) -> bool {
        let mut back_edge = false;
        let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
        self.enter(root, order.as_deref_mut());

        while let Some(frame) = stack.last_mut() {
            let (v, i) = *frame;
            frame.1 += 1;

            match self.nth_successor(v, i) {
                Some(Some(w)) => match self.vertex_at(w).map(|x| x.mark) {
                    Some(Mark::Unvisited) => {
                        self.enter(w, order.as_deref_mut());
                        stack.push((w, 0));
                    }
                    Some(Mark::InProgress) => {
                        back_edge = true;
                        if stop_at_back_edge {
                            return true;
                        }
                    }
                    _ => {}
                },
                Some(None) => {}
                None => {
                    self.vertex_mut(v).mark = Mark::Done;
                    stack.pop();
                }
            }
        }

        back_edge
    }

    fn enter(&mut self, v: VertexId, order: Option<&mut Vec<T>>) {
        let vertex = self.vertex_mut(v);
        vertex.mark = Mark::InProgress;
        if let Some(order) = order {
            order.push(vertex.value().clone());
        }
    }

    /// Depth-first search over the whole graph.
    ///
    /// Roots are taken in store order; each unvisited root starts a new
    /// pre-order walk. Returns vertex values in visitation order.
    pub fn dfs(&mut self) -> Vec<T> {
        self.reset_marks();
        let mut order = Vec::with_capacity(self.vertex_count());

        let roots: Vec<VertexId> = self.vertex_ids().collect();
        for root in roots {
            if !self.vertex_at(root).is_some_and(|v| v.is_visited()) {
                self.depth_first(root, Some(&mut order), false);
            }
        }

        debug!("dfs visited {} vertices", order.len());
        order
    }

    /// Breadth-first search from `source`, returning values in visitation order.
    pub fn bfs(&mut self, source: &T) -> Result<Vec<T>> {
        let start = self.require(source)?;
        self.reset_marks();

        let mut order = Vec::new();
        let mut queue: VecDeque<VertexId> = VecDeque::new();
        self.vertex_mut(start).mark = Mark::Done;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            order.extend(self.value_of(current).cloned());
            let targets: Vec<VertexId> = self.out_edges(current).map(|(_, e)| e.dest()).collect();
            for w in targets {
                let vertex = self.vertex_mut(w);
                if !vertex.is_visited() {
                    vertex.mark = Mark::Done;
                    queue.push_back(w);
                }
            }
        }

        debug!("bfs from {:?} visited {} vertices", source, order.len());
        Ok(order)
    }

    /// Kahn's algorithm.
    ///
    /// Returns every vertex such that each edge's source precedes its
    /// destination, or an empty vector if the graph contains a cycle.
    /// An empty graph also yields an empty vector; compare against
    /// [`Graph::vertex_count`] to tell the two apart.
    pub fn topological_sort(&mut self) -> Vec<T> {
        self.compute_indegrees();

        let mut queue: VecDeque<VertexId> = self
            .vertex_ids()
            .filter(|&id| self.vertex_at(id).is_some_and(|v| v.indegree == 0))
            .collect();
        let mut order = Vec::with_capacity(self.vertex_count());

        while let Some(current) = queue.pop_front() {
            order.extend(self.value_of(current).cloned());
            let targets: Vec<VertexId> = self.out_edges(current).map(|(_, e)| e.dest()).collect();
            for w in targets {
                let vertex = self.vertex_mut(w);
                vertex.indegree -= 1;
                if vertex.indegree == 0 {
                    queue.push_back(w);
                }
            }
        }

        if order.len() != self.vertex_count() {
            debug!(
                "topological sort: cycle detected ({} of {} vertices ordered)",
                order.len(),
                self.vertex_count()
            );
            order.clear();
        }
        order
    }

    fn compute_indegrees(&mut self) {
        for v in self.vertices_mut() {
            v.indegree = 0;
        }
        let dests: Vec<VertexId> = self.edges().map(|(_, e)| e.dest()).collect();
        for d in dests {
            self.vertex_mut(d).indegree += 1;
        }
    }

    /// BFS from `source` tracking which vertex discovers the most new
    /// children (out-neighbours not seen before).
    ///
    /// Returns that vertex's value and its count. Ties keep the first
    /// maximum found; if nothing is discovered the source is returned with 0.
    pub fn max_new_children(&mut self, source: &T) -> Result<(T, usize)> {
        let start = self.require(source)?;
        self.reset_marks();

        let mut best = (start, 0usize);
        let mut queue: VecDeque<VertexId> = VecDeque::new();
        self.vertex_mut(start).mark = Mark::Done;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let mut count = 0;
            let targets: Vec<VertexId> = self.out_edges(current).map(|(_, e)| e.dest()).collect();
            for w in targets {
                let vertex = self.vertex_mut(w);
                if !vertex.is_visited() {
                    vertex.mark = Mark::Done;
                    queue.push_back(w);
                    count += 1;
                }
            }
            if count > best.1 {
                best = (current, count);
            }
        }

        let value = self
            .value_of(best.0)
            .cloned()
            .ok_or_else(|| GraphError::VertexNotFound(describe(source)))?;
        Ok((value, best.1))
    }

    /// True iff no cycle is reachable from any vertex.
    ///
    /// Three-colour DFS: an edge into an `InProgress` vertex is a back edge.
    /// Finished vertices are `Done` and never re-explored.
    pub fn is_dag(&mut self) -> bool {
        self.reset_marks();
        let roots: Vec<VertexId> = self.vertex_ids().collect();
        for root in roots {
            let fresh = !self.vertex_at(root).is_some_and(|v| v.is_visited());
            if fresh && self.depth_first(root, None, true) {
                debug!(
                    "is_dag: back edge found while exploring from {:?}",
                    self.value_of(root)
                );
                return false;
            }
        }
        true
    }

    /// Return vertices ranked by degree (incoming + outgoing edges).
    ///
    /// If `top_n` is 0, returns all vertices. Ties keep store order.
    /// Also refreshes each vertex's `indegree`.
    pub fn degrees(&mut self, top_n: usize) -> Vec<DegreeSummary<T>> {
        self.compute_indegrees();

        let mut results: Vec<DegreeSummary<T>> = self
            .vertices()
            .map(|v| {
                let out_degree = v.outgoing().len();
                DegreeSummary {
                    value: v.value().clone(),
                    out_degree,
                    in_degree: v.indegree,
                    total_degree: out_degree + v.indegree,
                }
            })
            .collect();

        results.sort_by(|a, b| b.total_degree.cmp(&a.total_degree));

        if top_n > 0 && top_n < results.len() {
            results.truncate(top_n);
        }
        results
    }
}
