use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::grid::{CellIndex, CostGrid, GridHeader};
use crate::landmarks::{select_landmarks, LandmarkParams, LandmarkSet};
use crate::path::CostGraph;
use crate::triangulation::{triangulate, Point};

/// Dense node identifier within a [`Graph`].
pub type NodeId = usize;

/// Graph node anchored on a non-null grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub cell: CellIndex,
    pub row: usize,
    pub col: usize,
    /// Cell centre in map units.
    pub x: f64,
    pub y: f64,
    pub cost: f64,
}

/// Edge within the landscape graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    /// Traversal cost: mean endpoint cost times `length`.
    pub weight: f64,
    /// Euclidean length in map units.
    pub length: f64,
}

#[derive(Debug)]
struct GraphData {
    nrows: usize,
    ncols: usize,
    header: GridHeader,
    nodes: Vec<Node>,
    adjacency: Vec<Vec<Edge>>,
    cell_to_node: HashMap<CellIndex, NodeId>,
    edge_count: usize,
}

/// Irregular landscape graph. Undirected; every edge appears in both
/// endpoint lists. Cloning shares the underlying storage.
#[derive(Debug, Clone)]
pub struct Graph {
    data: Arc<GraphData>,
}

/// Headline numbers for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Connected components; more than one means unreachable islands.
    pub components: usize,
    pub isolated_nodes: usize,
    pub mean_degree: f64,
    /// Share of grid cells carried as nodes.
    pub coverage: f64,
}

impl Graph {
    pub(crate) fn from_parts(
        nrows: usize,
        ncols: usize,
        header: GridHeader,
        nodes: Vec<Node>,
        adjacency: Vec<Vec<Edge>>,
    ) -> Self {
        let cell_to_node = nodes
            .iter()
            .enumerate()
            .map(|(id, node)| (node.cell, id))
            .collect();
        let edge_count = adjacency.iter().map(Vec::len).sum::<usize>() / 2;
        Self {
            data: Arc::new(GraphData {
                nrows,
                ncols,
                header,
                nodes,
                adjacency,
                cell_to_node,
                edge_count,
            }),
        }
    }

    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.data.edge_count
    }

    pub fn nodes(&self) -> &[Node] {
        &self.data.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.data.nodes.get(id)
    }

    /// Return the neighbours for a given node identifier.
    pub fn neighbours(&self, id: NodeId) -> &[Edge] {
        self.data
            .adjacency
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Node anchored on `cell`, if that cell was kept.
    pub fn node_for_cell(&self, cell: CellIndex) -> Option<NodeId> {
        self.data.cell_to_node.get(&cell).copied()
    }

    /// Every undirected edge once, as `(source, edge)` with `source < edge.target`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, &Edge)> + '_ {
        self.data
            .adjacency
            .iter()
            .enumerate()
            .flat_map(|(source, edges)| {
                edges
                    .iter()
                    .filter(move |edge| source < edge.target)
                    .map(move |edge| (source, edge))
            })
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols
    }

    pub fn header(&self) -> &GridHeader {
        &self.data.header
    }

    /// Whether this graph was built over a grid of the same shape.
    pub fn matches_grid(&self, grid: &CostGrid) -> bool {
        self.data.nrows == grid.nrows() && self.data.ncols == grid.ncols()
    }

    pub(crate) fn ensure_matches(&self, grid: &CostGrid) -> Result<()> {
        if self.matches_grid(grid) {
            return Ok(());
        }
        Err(Error::invalid_grid(format!(
            "graph was built for a {}x{} grid but the cost grid is {}x{}",
            self.data.nrows,
            self.data.ncols,
            grid.nrows(),
            grid.ncols()
        )))
    }

    pub fn stats(&self) -> GraphStats {
        let nodes = self.node_count();
        let cells = self.data.nrows * self.data.ncols;
        GraphStats {
            nodes,
            edges: self.edge_count(),
            components: self.component_count(),
            isolated_nodes: self.data.adjacency.iter().filter(|e| e.is_empty()).count(),
            mean_degree: if nodes == 0 {
                0.0
            } else {
                2.0 * self.edge_count() as f64 / nodes as f64
            },
            coverage: if cells == 0 {
                0.0
            } else {
                nodes as f64 / cells as f64
            },
        }
    }

    fn component_count(&self) -> usize {
        let mut seen = vec![false; self.node_count()];
        let mut components = 0;
        let mut stack = Vec::new();
        for root in 0..self.node_count() {
            if seen[root] {
                continue;
            }
            components += 1;
            seen[root] = true;
            stack.push(root);
            while let Some(node) = stack.pop() {
                for edge in self.neighbours(node) {
                    if !seen[edge.target] {
                        seen[edge.target] = true;
                        stack.push(edge.target);
                    }
                }
            }
        }
        components
    }
}

impl CostGraph for Graph {
    fn node_count(&self) -> usize {
        Graph::node_count(self)
    }

    fn for_each_neighbour<F: FnMut(usize, f64)>(&self, node: usize, mut visit: F) {
        for edge in self.neighbours(node) {
            visit(edge.target, edge.weight);
        }
    }
}

/// Select landmarks with `params` and build the irregular graph over them.
pub fn build_irregular_graph_with(grid: &CostGrid, params: &LandmarkParams) -> Result<Graph> {
    let landmarks = select_landmarks(grid, params)?;
    build_irregular_graph(grid, &landmarks)
}

/// Build the irregular landscape graph over a landmark set.
///
/// The mesh is triangulated over every landmark cell, null cells included,
/// and the null nodes are stripped afterwards together with their edges.
/// Stripping can leave disconnected islands.
pub fn build_irregular_graph(grid: &CostGrid, landmarks: &LandmarkSet) -> Result<Graph> {
    let cells = landmarks.coordinate_cells();
    if let Some(&cell) = cells.iter().find(|&&cell| cell >= grid.len()) {
        return Err(Error::InvalidParameter {
            name: "landmarks",
            message: format!(
                "cell {} is outside the {}x{} grid",
                cell,
                grid.nrows(),
                grid.ncols()
            ),
        });
    }

    let points: Vec<Point> = cells.iter().map(|&cell| grid.lattice(cell)).collect();
    let mesh = triangulate(&points)?;
    debug!(
        coordinate_cells = cells.len(),
        mesh_edges = mesh.edges().len(),
        "triangulated landmark cells"
    );

    let mut mesh_to_node: Vec<Option<NodeId>> = vec![None; cells.len()];
    let mut nodes = Vec::new();
    for (slot, &cell) in mesh_to_node.iter_mut().zip(&cells) {
        let Some(cost) = grid.cost(cell) else {
            continue;
        };
        let (row, col) = grid.row_col(cell);
        let (x, y) = grid.cell_centre(cell);
        *slot = Some(nodes.len());
        nodes.push(Node {
            cell,
            row,
            col,
            x,
            y,
            cost,
        });
    }

    let cellsize = grid.header().cellsize;
    let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); nodes.len()];
    let mut stripped_edges = 0usize;
    for &(a, b) in mesh.edges() {
        let (Some(u), Some(v)) = (mesh_to_node[a], mesh_to_node[b]) else {
            stripped_edges += 1;
            continue;
        };
        let (pa, pb) = (points[a], points[b]);
        let (dx, dy) = ((pa.0 - pb.0) as f64, (pa.1 - pb.1) as f64);
        let length = dx.hypot(dy) * cellsize;
        let weight = 0.5 * (nodes[u].cost + nodes[v].cost) * length;
        adjacency[u].push(Edge {
            target: v,
            weight,
            length,
        });
        adjacency[v].push(Edge {
            target: u,
            weight,
            length,
        });
    }
    for edges in &mut adjacency {
        edges.sort_by_key(|edge| edge.target);
    }

    let graph = Graph::from_parts(grid.nrows(), grid.ncols(), *grid.header(), nodes, adjacency);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        stripped_nodes = cells.len() - graph.node_count(),
        stripped_edges,
        "built irregular graph"
    );
    Ok(graph)
}
