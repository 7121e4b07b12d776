use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Weighted graph the accumulated-cost search can walk.
///
/// Implemented by the irregular landscape graph and by the implicit
/// 8-neighbour grid of the regular baseline, so both share one solver.
pub trait CostGraph {
    /// Number of node slots. Node ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Call `visit(target, weight)` for every edge leaving `node`.
    /// Weights must be non-negative.
    fn for_each_neighbour<F: FnMut(usize, f64)>(&self, node: usize, visit: F);
}

/// Minimum accumulated cost from a source set to every node.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedCost {
    distances: Vec<Option<f64>>,
    predecessors: Vec<Option<usize>>,
    sources: Vec<usize>,
}

impl AccumulatedCost {
    /// Accumulated cost to `node`, or `None` when no path exists.
    pub fn cost(&self, node: usize) -> Option<f64> {
        self.distances.get(node).copied().flatten()
    }

    /// Per-node costs indexed by node id.
    pub fn distances(&self) -> &[Option<f64>] {
        &self.distances
    }

    /// Source nodes the search was seeded with (sorted, de-duplicated).
    pub fn sources(&self) -> &[usize] {
        &self.sources
    }

    /// Number of nodes with a path from the source set.
    pub fn reached_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_some()).count()
    }

    /// Largest finite accumulated cost.
    pub fn max_cost(&self) -> Option<f64> {
        self.distances.iter().flatten().copied().reduce(f64::max)
    }

    /// Least-cost path from the nearest source to `node`, source first.
    pub fn path_to(&self, node: usize) -> Option<Vec<usize>> {
        self.cost(node)?;
        let mut path = vec![node];
        let mut current = node;
        while let Some(previous) = self.predecessors[current] {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        Some(path)
    }
}

/// Run one Dijkstra search seeded with every source at distance zero.
///
/// The source set acts as a single virtual source: each node ends up with the
/// cost from whichever source reaches it most cheaply. Finalised nodes are
/// never relaxed again. Source ids outside the graph are ignored.
pub fn accumulated_cost<G: CostGraph>(graph: &G, sources: &[usize]) -> AccumulatedCost {
    let count = graph.node_count();
    let mut distances = vec![f64::INFINITY; count];
    let mut predecessors: Vec<Option<usize>> = vec![None; count];
    let mut settled = vec![false; count];
    let mut queue = BinaryHeap::new();

    let mut seeds: Vec<usize> = sources.iter().copied().filter(|&s| s < count).collect();
    seeds.sort_unstable();
    seeds.dedup();
    for &source in &seeds {
        distances[source] = 0.0;
        queue.push(QueueEntry::new(source, 0.0));
    }

    while let Some(entry) = queue.pop() {
        let node = entry.node;
        if settled[node] || entry.cost.0 > distances[node] {
            continue;
        }
        settled[node] = true;
        let current = distances[node];

        graph.for_each_neighbour(node, |next, weight| {
            if settled[next] {
                return;
            }
            let next_cost = current + weight;
            if next_cost < distances[next] {
                distances[next] = next_cost;
                predecessors[next] = Some(node);
                queue.push(QueueEntry::new(next, next_cost));
            }
        });
    }

    AccumulatedCost {
        distances: distances
            .into_iter()
            .map(|d| d.is_finite().then_some(d))
            .collect(),
        predecessors,
        sources: seeds,
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: usize,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: usize, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
