use std::fmt::Debug;

use log::debug;

use crate::all_pairs::AllPairs;
use crate::error::{describe, GraphError, Result};

/// Distance sentinel for vertices no run has reached.
pub const INF: f64 = f64::INFINITY;

/// Position of a vertex in store order.
///
/// Positions are dense: removing a vertex shifts every later vertex down by
/// one, and the store rewrites all internal references accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) usize);

impl VertexId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to an edge. Stable for the edge's lifetime and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

/// Per-vertex traversal colour used by DFS and the DAG check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Unvisited,
    /// On the current DFS stack.
    InProgress,
    Done,
}

/// A vertex: its content value, adjacency, and per-algorithm scratch state.
#[derive(Debug, Clone)]
pub struct Vertex<T> {
    value: T,
    outgoing: Vec<EdgeId>,
    incoming: Vec<EdgeId>,
    pub(crate) mark: Mark,
    pub(crate) indegree: usize,
    pub(crate) dist: f64,
    pub(crate) path: Option<VertexId>,
    /// Edge used to reach this vertex during the last augmenting-path search.
    pub(crate) via: Option<EdgeId>,
}

impl<T> Vertex<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            mark: Mark::Unvisited,
            indegree: 0,
            dist: INF,
            path: None,
            via: None,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Distance computed by the last shortest-path run, or [`INF`].
    pub fn dist(&self) -> f64 {
        self.dist
    }

    /// Predecessor on the best known path from the last shortest-path source.
    pub fn predecessor(&self) -> Option<VertexId> {
        self.path
    }

    /// In-degree as of the last topological sort or degree report.
    pub fn indegree(&self) -> usize {
        self.indegree
    }

    pub fn is_visited(&self) -> bool {
        self.mark != Mark::Unvisited
    }

    pub fn is_processing(&self) -> bool {
        self.mark == Mark::InProgress
    }

    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }
}

/// A directed edge. `weight` doubles as the capacity in flow networks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    source: VertexId,
    dest: VertexId,
    weight: f64,
    pub(crate) flow: f64,
}

impl Edge {
    pub fn source(&self) -> VertexId {
        self.source
    }

    pub fn dest(&self) -> VertexId {
        self.dest
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn capacity(&self) -> f64 {
        self.weight
    }

    pub fn flow(&self) -> f64 {
        self.flow
    }

    /// Remaining forward capacity.
    pub fn residual(&self) -> f64 {
        self.weight - self.flow
    }
}

/// A vertex as seen by a presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSnapshot<T> {
    pub value: T,
    pub out_degree: usize,
    pub in_degree: usize,
}

/// An edge as seen by a presentation layer, endpoints resolved to values.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSnapshot<T> {
    pub from: T,
    pub to: T,
    pub weight: f64,
    pub flow: f64,
}

/// Read-only copy of the whole graph in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot<T> {
    pub vertices: Vec<VertexSnapshot<T>>,
    pub edges: Vec<EdgeSnapshot<T>>,
}

/// In-memory directed graph keyed by vertex content.
///
/// Vertices are kept in insertion order; edges live in an arena and are
/// referenced from both endpoints (`outgoing` on the source, `incoming` on
/// the destination). Algorithms write their results into per-vertex scratch
/// fields, resetting them first, so runs never observe each other's state.
///
/// Not synchronized: callers sharing a graph across threads must lock the
/// whole store.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    vertices: Vec<Vertex<T>>,
    edges: Vec<Option<Edge>>,
    edge_count: usize,
    generation: u64,
    pub(crate) last_source: Option<VertexId>,
    pub(crate) all_pairs: Option<AllPairs>,
}

impl<T> Graph<T>
where
    T: PartialEq + Clone + Debug,
{
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            edge_count: 0,
            generation: 0,
            last_source: None,
            all_pairs: None,
        }
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(vertex_count: usize, edge_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            edges: Vec::with_capacity(edge_count),
            ..Self::new()
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Linear scan for the vertex whose value equals `value`.
    pub fn find_vertex(&self, value: &T) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|v| v.value == *value)
            .map(VertexId)
    }

    pub(crate) fn require(&self, value: &T) -> Result<VertexId> {
        self.find_vertex(value)
            .ok_or_else(|| GraphError::VertexNotFound(describe(value)))
    }

    pub fn contains_vertex(&self, value: &T) -> bool {
        self.find_vertex(value).is_some()
    }

    pub fn vertex(&self, value: &T) -> Option<&Vertex<T>> {
        self.find_vertex(value).map(|id| &self.vertices[id.0])
    }

    pub fn vertex_at(&self, id: VertexId) -> Option<&Vertex<T>> {
        self.vertices.get(id.0)
    }

    pub fn value_of(&self, id: VertexId) -> Option<&T> {
        self.vertices.get(id.0).map(|v| &v.value)
    }

    /// All vertices in store (insertion) order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex<T>> {
        self.vertices.iter()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0).and_then(|e| e.as_ref())
    }

    /// Outgoing edges of a vertex in edge-list order.
    pub fn out_edges(&self, id: VertexId) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.vertices[id.0]
            .outgoing
            .iter()
            .filter_map(move |&eid| self.edge(eid).map(|e| (eid, e)))
    }

    /// Incoming edges of a vertex in insertion order.
    pub fn in_edges(&self, id: VertexId) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.vertices[id.0]
            .incoming
            .iter()
            .filter_map(move |&eid| self.edge(eid).map(|e| (eid, e)))
    }

    /// Outgoing edges of the vertex holding `value`.
    pub fn edges_from(&self, value: &T) -> Result<Vec<&Edge>> {
        let id = self.require(value)?;
        Ok(self.out_edges(id).map(|(_, e)| e).collect())
    }

    /// Value of the predecessor recorded by the last shortest-path run.
    pub fn predecessor_of(&self, value: &T) -> Option<&T> {
        self.vertex(value)
            .and_then(|v| v.path)
            .and_then(|p| self.value_of(p))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Mutation counter. Bumped by every successful add/remove.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex<T> {
        &mut self.vertices[id.0]
    }

    pub(crate) fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex<T>> {
        self.vertices.iter_mut()
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0).and_then(|e| e.as_mut())
    }

    pub(crate) fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.iter_mut().flatten()
    }

    /// Live edges in arena (creation) order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i), e)))
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a vertex. Fails if a vertex with an equal value already exists.
    pub fn add_vertex(&mut self, value: T) -> Result<VertexId> {
        if self.contains_vertex(&value) {
            return Err(GraphError::DuplicateVertex(describe(&value)));
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex::new(value));
        self.generation += 1;
        Ok(id)
    }

    /// Add a weighted edge `src → dst`. Parallel edges are allowed.
    pub fn add_edge(&mut self, src: &T, dst: &T, weight: f64) -> Result<EdgeId> {
        let s = self.require(src)?;
        let d = self.require(dst)?;
        Ok(self.insert_edge(s, d, weight, 0.0))
    }

    /// Add a flow-network edge with an initial flow.
    ///
    /// Rejects negative capacities and flows outside `0..=capacity`.
    pub fn add_flow_edge(&mut self, src: &T, dst: &T, capacity: f64, flow: f64) -> Result<EdgeId> {
        if !(capacity >= 0.0 && flow >= 0.0 && flow <= capacity) {
            return Err(GraphError::InvalidCapacity { capacity, flow });
        }
        let s = self.require(src)?;
        let d = self.require(dst)?;
        Ok(self.insert_edge(s, d, capacity, flow))
    }

    fn insert_edge(&mut self, source: VertexId, dest: VertexId, weight: f64, flow: f64) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge {
            source,
            dest,
            weight,
            flow,
        }));
        self.vertices[source.0].outgoing.push(id);
        self.vertices[dest.0].incoming.push(id);
        self.edge_count += 1;
        self.generation += 1;
        id
    }

    /// Remove the first edge `src → dst` in `src`'s edge-list order.
    pub fn remove_edge(&mut self, src: &T, dst: &T) -> Result<()> {
        let s = self.require(src)?;
        let d = self.require(dst)?;

        let found = self
            .out_edges(s)
            .find(|(_, e)| e.dest == d)
            .map(|(id, _)| id);

        match found {
            Some(id) => {
                self.drop_edge(id);
                self.generation += 1;
                Ok(())
            }
            None => Err(GraphError::EdgeNotFound {
                from: describe(src),
                to: describe(dst),
            }),
        }
    }

    fn drop_edge(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.get_mut(id.0).and_then(|e| e.take()) else {
            return;
        };
        self.vertices[edge.source.0].outgoing.retain(|&e| e != id);
        self.vertices[edge.dest.0].incoming.retain(|&e| e != id);
        self.edge_count -= 1;
    }

    /// Remove a vertex together with every edge that starts or ends at it.
    ///
    /// Shortest-path results routed through the vertex are reset to
    /// unreachable; the rest of the last run stays readable.
    pub fn remove_vertex(&mut self, value: &T) -> Result<()> {
        let removed = self.require(value)?;

        let incident: Vec<EdgeId> = {
            let v = &self.vertices[removed.0];
            v.outgoing.iter().chain(v.incoming.iter()).copied().collect()
        };
        for id in incident {
            self.drop_edge(id);
        }

        self.vertices.remove(removed.0);

        // Later vertices shifted down by one; rewrite every stored position.
        let shift = |id: VertexId| if id > removed { VertexId(id.0 - 1) } else { id };
        for edge in self.edges.iter_mut().flatten() {
            edge.source = shift(edge.source);
            edge.dest = shift(edge.dest);
        }
        for v in &mut self.vertices {
            v.path = v.path.filter(|&p| p != removed).map(shift);
        }
        self.last_source = self.last_source.filter(|&s| s != removed).map(shift);
        self.drop_broken_paths();

        self.generation += 1;
        debug!(
            "removed vertex {:?}: {} vertices, {} edges remain",
            value,
            self.vertices.len(),
            self.edge_count
        );
        Ok(())
    }

    /// Reset `dist` and `path` on every vertex whose predecessor chain no
    /// longer ends at the last shortest-path source, so `distance_to` and
    /// `path_to` agree after a removal cut a chain.
    fn drop_broken_paths(&mut self) {
        let n = self.vertices.len();
        let mut reaches: Vec<Option<bool>> = vec![None; n];
        if let Some(source) = self.last_source {
            reaches[source.0] = Some(true);
        }

        for start in 0..n {
            let mut chain = Vec::new();
            let mut current = start;
            let intact = loop {
                if let Some(known) = reaches[current] {
                    break known;
                }
                if chain.len() > n {
                    break false;
                }
                chain.push(current);
                match self.vertices[current].path {
                    Some(p) => current = p.0,
                    None => break false,
                }
            };
            for c in chain {
                reaches[c] = Some(intact);
            }
        }

        for (v, intact) in self.vertices.iter_mut().zip(reaches) {
            if intact != Some(true) {
                v.dist = INF;
                v.path = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Presentation
    // -----------------------------------------------------------------------

    /// Owned copy of vertices and edges, both in store order.
    ///
    /// Edges are listed per source vertex in edge-list order, so repeated
    /// snapshots of an unmodified graph are identical.
    pub fn snapshot(&self) -> GraphSnapshot<T> {
        let vertices = self
            .vertices
            .iter()
            .map(|v| VertexSnapshot {
                value: v.value.clone(),
                out_degree: v.outgoing.len(),
                in_degree: v.incoming.len(),
            })
            .collect();

        let edges = self
            .vertex_ids()
            .flat_map(|id| self.out_edges(id))
            .map(|(_, e)| EdgeSnapshot {
                from: self.vertices[e.source.0].value.clone(),
                to: self.vertices[e.dest.0].value.clone(),
                weight: e.weight,
                flow: e.flow,
            })
            .collect();

        GraphSnapshot { vertices, edges }
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let vertex_mem = self.vertices.capacity() * size_of::<Vertex<T>>();
        let adjacency: usize = self
            .vertices
            .iter()
            .map(|v| (v.outgoing.capacity() + v.incoming.capacity()) * size_of::<EdgeId>())
            .sum();
        let edge_mem = self.edges.capacity() * size_of::<Option<Edge>>();
        let matrix_mem = self.all_pairs.as_ref().map_or(0, AllPairs::memory_usage);

        vertex_mem + adjacency + edge_mem + matrix_mem
    }
}

impl<T> Default for Graph<T>
where
    T: PartialEq + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
