use std::error::Error;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use digraph_core::{Graph, GraphError, INF};
use log::{info, warn};
use serde::Serialize;

/// Time the digraph-core algorithms on synthetic topologies.
#[derive(Parser, Debug)]
#[command(name = "digraph-bench", version, about)]
struct Cli {
    /// Generator to benchmark.
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Number of vertices per generated graph.
    #[arg(short, long, env = "DIGRAPH_BENCH_NODES", default_value_t = 2000)]
    nodes: u64,

    /// Seed for the generators.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Emit a JSON report instead of the table.
    #[arg(long)]
    json: bool,

    /// Skip Floyd-Warshall (cubic in the vertex count).
    #[arg(long)]
    skip_all_pairs: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    All,
    /// Branching tree (deep paths, acyclic)
    Tree,
    /// Erdos-Renyi uniform random edges
    Random,
    /// Watts-Strogatz ring lattice + shortcuts
    Smallworld,
    /// Two dense clusters joined by a thin bridge
    Barbell,
    /// Layered flow network, source to sink
    Layered,
}

type Generator = fn(u64, u64) -> Graph<u64>;

impl Mode {
    fn generators(self) -> Vec<(&'static str, Generator)> {
        match self {
            Mode::Tree => vec![("Branching tree", gen_tree as Generator)],
            Mode::Random => vec![("Erdos-Renyi random", gen_random)],
            Mode::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
            Mode::Barbell => vec![("Barbell (cluster-bridge-cluster)", gen_barbell)],
            Mode::Layered => vec![("Layered flow network", gen_layered)],
            Mode::All => vec![
                ("Branching tree", gen_tree as Generator),
                ("Erdos-Renyi random", gen_random),
                ("Small-world (Watts-Strogatz)", gen_small_world),
                ("Barbell (cluster-bridge-cluster)", gen_barbell),
                ("Layered flow network", gen_layered),
            ],
        }
    }
}

#[derive(Serialize, Debug)]
struct Report {
    generator: String,
    vertices: usize,
    edges: usize,
    memory_bytes: usize,
    generate_ms: f64,
    timings: Vec<Timing>,
}

#[derive(Serialize, Debug)]
struct Timing {
    algorithm: &'static str,
    millis: f64,
    result: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.nodes < 2 {
        return Err("--nodes must be at least 2".into());
    }

    let mut reports = Vec::new();
    for (name, generator) in cli.mode.generators() {
        info!("generating {} with {} vertices", name, cli.nodes);
        let report = run_benchmark(name, generator, &cli)?;
        if !cli.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn run_benchmark(name: &str, generator: Generator, cli: &Cli) -> Result<Report, GraphError> {
    let t = Instant::now();
    let mut graph = generator(cli.nodes, cli.seed);
    let generate_ms = millis(t);

    let source = 0u64;
    let sink = graph.vertex_count() as u64 - 1;
    let mut timings = Vec::new();

    let t = Instant::now();
    let order = graph.dfs();
    timings.push(timing("dfs", t, format!("{} visited", order.len())));

    let t = Instant::now();
    let order = graph.bfs(&source)?;
    timings.push(timing("bfs", t, format!("{} reached", order.len())));

    let t = Instant::now();
    let order = graph.topological_sort();
    let result = if order.is_empty() {
        "cyclic".to_string()
    } else {
        format!("{} ordered", order.len())
    };
    timings.push(timing("topological_sort", t, result));

    let t = Instant::now();
    let (best, count) = graph.max_new_children(&source)?;
    timings.push(timing("max_new_children", t, format!("{} discovers {}", best, count)));

    let t = Instant::now();
    graph.unweighted_shortest_path(&source)?;
    let hops = graph.distance_to(&sink)?;
    timings.push(timing("unweighted", t, describe_distance(hops)));

    let t = Instant::now();
    graph.dijkstra_shortest_path(&source)?;
    let dist = graph.distance_to(&sink)?;
    timings.push(timing("dijkstra", t, describe_distance(dist)));

    let t = Instant::now();
    let result = match graph.bellman_ford_shortest_path(&source) {
        Ok(()) => describe_distance(graph.distance_to(&sink)?),
        Err(GraphError::NegativeCycle) => "negative cycle".to_string(),
        Err(e) => return Err(e),
    };
    timings.push(timing("bellman_ford", t, result));

    if cli.skip_all_pairs {
        info!("skipping floyd-warshall for {}", name);
    } else {
        if graph.vertex_count() > 5_000 {
            warn!(
                "floyd-warshall on {} vertices allocates {} matrix cells",
                graph.vertex_count(),
                graph.vertex_count() * graph.vertex_count()
            );
        }
        let t = Instant::now();
        graph.floyd_warshall_shortest_path()?;
        let dist = graph.floyd_warshall_distance(&source, &sink)?;
        timings.push(timing("floyd_warshall", t, describe_distance(dist)));
    }

    let t = Instant::now();
    let flow = graph.edmonds_karp(&source, &sink)?;
    timings.push(timing("edmonds_karp", t, format!("max flow {}", flow)));

    Ok(Report {
        generator: name.to_string(),
        vertices: graph.vertex_count(),
        edges: graph.edge_count(),
        memory_bytes: graph.memory_usage(),
        generate_ms,
        timings,
    })
}

fn print_report(report: &Report) {
    println!("--- {} ---", report.generator);
    println!(
        "Generated in {:.1}ms: {} vertices, {} edges, ~{:.1}KB",
        report.generate_ms,
        report.vertices,
        report.edges,
        report.memory_bytes as f64 / 1024.0
    );
    println!();
    println!("{:>18} {:>12} {:>28}", "algorithm", "time", "result");
    println!("{:->18} {:->12} {:->28}", "", "", "");
    for timing in &report.timings {
        println!(
            "{:>18} {:>10.2}ms {:>28}",
            timing.algorithm, timing.millis, timing.result
        );
    }
    println!();
}

fn timing(algorithm: &'static str, started: Instant, result: String) -> Timing {
    Timing {
        algorithm,
        millis: millis(started),
        result,
    }
}

fn millis(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn describe_distance(dist: f64) -> String {
    if dist == INF {
        "sink unreachable".to_string()
    } else {
        format!("distance {}", dist)
    }
}

// ---------------------------------------------------------------------------
// Generators: deterministic for a given seed. Vertex values are 0..n, so
// vertex 0 is the source and n-1 the sink of every benchmark.
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
    /// Integral edge weight in `1..=10`.
    fn weight(&mut self) -> f64 {
        (self.next(10) + 1) as f64
    }
}

fn with_vertices(node_count: u64, edge_hint: u64) -> Graph<u64> {
    let mut graph = Graph::with_capacity(node_count as usize, edge_hint as usize);
    for i in 0..node_count {
        if let Err(e) = graph.add_vertex(i) {
            warn!("generator produced a duplicate vertex: {}", e);
        }
    }
    graph
}

fn link(graph: &mut Graph<u64>, from: u64, to: u64, weight: f64) {
    if let Err(e) = graph.add_edge(&from, &to, weight) {
        warn!("generator produced a dangling edge: {}", e);
    }
}

/// Branching tree: each vertex spawns three children. Acyclic with
/// logarithmic depth, so the sink is a leaf reachable from the root.
fn gen_tree(node_count: u64, seed: u64) -> Graph<u64> {
    let branching = 3u64;
    let mut graph = with_vertices(node_count, node_count);
    let mut rng = FastRng::new(seed);

    for child in 1..node_count {
        let parent = (child - 1) / branching;
        let w = rng.weight();
        link(&mut graph, parent, child, w);
    }
    graph
}

/// Erdos-Renyi: uniform random edges, about ten per vertex.
fn gen_random(node_count: u64, seed: u64) -> Graph<u64> {
    let target_edges = node_count * 10;
    let mut graph = with_vertices(node_count, target_edges);
    let mut rng = FastRng::new(seed);

    for _ in 0..target_edges {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        if from != to {
            let w = rng.weight();
            link(&mut graph, from, to, w);
        }
    }
    graph
}

/// Small-world (Watts-Strogatz): ring lattice with random rewiring.
///
/// Each vertex links forward to its `k` nearest ring neighbours; each link
/// is rewired to a uniform random target with probability `p`.
fn gen_small_world(node_count: u64, seed: u64) -> Graph<u64> {
    let k = 5u64.min(node_count - 1);
    let p = 0.05f64;
    let mut graph = with_vertices(node_count, node_count * k);
    let mut rng = FastRng::new(seed);

    for i in 0..node_count {
        for j in 1..=k {
            let mut target = (i + j) % node_count;
            if rng.next_f64() < p {
                let rewired = rng.next(node_count);
                if rewired != i {
                    target = rewired;
                }
            }
            let w = rng.weight();
            link(&mut graph, i, target, w);
        }
    }
    graph
}

/// Barbell: two dense clusters joined by a single chain of bridge vertices.
///
/// Every path from the first cluster to the second crosses the bridge, so
/// the maximum flow is bounded by its narrowest edge.
fn gen_barbell(node_count: u64, seed: u64) -> Graph<u64> {
    let bridge_len = 10u64.min(node_count / 2);
    let cluster = (node_count - bridge_len) / 2;
    let degree = 10u64.min(cluster.saturating_sub(1));
    let mut graph = with_vertices(node_count, cluster * degree * 2 + bridge_len + 1);
    let mut rng = FastRng::new(seed);

    let mut dense = |graph: &mut Graph<u64>, start: u64, size: u64| {
        for i in 0..size {
            for _ in 0..degree {
                let target = rng.next(size);
                if target != i {
                    let w = rng.weight();
                    link(graph, start + i, start + target, w);
                }
            }
        }
    };

    dense(&mut graph, 0, cluster);
    // Remainder of the split joins the second cluster.
    let b_start = cluster + bridge_len;
    dense(&mut graph, b_start, node_count - b_start);

    // Chain: last of the first cluster, through the bridge, into the second.
    let chain_start = cluster.saturating_sub(1);
    for id in chain_start..b_start {
        link(&mut graph, id, id + 1, 1.0);
    }
    graph
}

/// Layered flow network: source, `layers` ranks of equal width, sink.
///
/// Each vertex feeds three random vertices of the next rank; weights double
/// as capacities for the max-flow benchmark.
fn gen_layered(node_count: u64, seed: u64) -> Graph<u64> {
    let inner = node_count - 2;
    let layers = 8u64.min(inner.max(1));
    let width = (inner / layers).max(1);
    let fanout = 3u64;
    let mut graph = with_vertices(node_count, inner * fanout + 2 * width);
    let mut rng = FastRng::new(seed);

    let sink = node_count - 1;
    let rank_of = |v: u64| (v - 1) / width;

    for v in 1..sink {
        let rank = rank_of(v);
        if rank == 0 {
            let w = rng.weight();
            link(&mut graph, 0, v, w);
        }
        let next_start = 1 + (rank + 1) * width;
        if next_start >= sink {
            let w = rng.weight();
            link(&mut graph, v, sink, w);
            continue;
        }
        let next_width = width.min(sink - next_start);
        for _ in 0..fanout {
            let target = next_start + rng.next(next_width);
            let w = rng.weight();
            link(&mut graph, v, target, w);
        }
    }
    graph
}
