//! Graph file format.
//!
//! Building a graph is the expensive step, so a built graph can be written
//! once and solved against many times.
//!
//! # File Format
//!
//! ```text
//! +--------+------------------------------+
//! | Header | 16 bytes                     |
//! +--------+------------------------------+
//! | Body   | zstd(postcard(StoredGraph))  |
//! +--------+------------------------------+
//! | Footer | SHA-256 of the body          |
//! +--------+------------------------------+
//! ```
//!
//! Header layout: magic `IRLG` (4 bytes), version (1), flags (1), node count
//! as little-endian `u32` (4), six reserved bytes.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, Node, NodeId};
use crate::grid::GridHeader;

/// Magic bytes identifying a graph file.
const GRAPH_MAGIC: &[u8; 4] = b"IRLG";

/// Current format version.
const GRAPH_VERSION: u8 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 16;

/// Checksum size in bytes (SHA-256).
const CHECKSUM_SIZE: usize = 32;

/// zstd compression level (balanced speed/ratio).
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct StoredGraph {
    nrows: usize,
    ncols: usize,
    header: GridHeader,
    nodes: Vec<Node>,
    edges: Vec<StoredEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEdge {
    source: NodeId,
    target: NodeId,
    weight: f64,
    length: f64,
}

impl Graph {
    /// Write the graph to `path`, returning the SHA-256 checksum of the body.
    pub fn save(&self, path: &Path) -> Result<[u8; CHECKSUM_SIZE]> {
        info!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "saving graph"
        );

        let stored = StoredGraph {
            nrows: self.nrows(),
            ncols: self.ncols(),
            header: *self.header(),
            nodes: self.nodes().to_vec(),
            edges: self
                .edges()
                .map(|(source, edge)| StoredEdge {
                    source,
                    target: edge.target,
                    weight: edge.weight,
                    length: edge.length,
                })
                .collect(),
        };

        write_stored(path, &stored)
    }

    /// Load a graph written by [`Graph::save`].
    ///
    /// Validates magic, version, checksum and node count, then checks that
    /// nodes sit on distinct cells of the stored grid and that edges join
    /// existing nodes with finite, non-negative weights.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading graph");
        let fail = |message: String| Error::GraphLoad {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| fail(format!("failed to open file: {}", e)))?;
        let mut bytes = Vec::new();
        BufReader::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| fail(format!("failed to read file: {}", e)))?;

        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(fail(format!("file is truncated ({} bytes)", bytes.len())));
        }
        let (header, rest) = bytes.split_at(HEADER_SIZE);
        let (compressed, stored_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);

        if &header[0..4] != GRAPH_MAGIC {
            return Err(fail("invalid magic bytes".to_string()));
        }
        if header[4] != GRAPH_VERSION {
            return Err(fail(format!(
                "unsupported version {} (expected {})",
                header[4], GRAPH_VERSION
            )));
        }
        let node_count = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;

        if Sha256::digest(compressed).as_slice() != stored_checksum {
            return Err(fail("checksum mismatch - file may be corrupted".to_string()));
        }

        let decompressed = zstd::decode_all(compressed)
            .map_err(|e| fail(format!("zstd decompression failed: {}", e)))?;
        let stored: StoredGraph = postcard::from_bytes(&decompressed)
            .map_err(|e| fail(format!("postcard deserialization failed: {}", e)))?;

        if stored.nodes.len() != node_count {
            return Err(fail(format!(
                "header declares {} nodes but body holds {}",
                node_count,
                stored.nodes.len()
            )));
        }

        validate(&stored).map_err(fail)?;

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); stored.nodes.len()];
        for edge in &stored.edges {
            adjacency[edge.source].push(Edge {
                target: edge.target,
                weight: edge.weight,
                length: edge.length,
            });
            adjacency[edge.target].push(Edge {
                target: edge.source,
                weight: edge.weight,
                length: edge.length,
            });
        }
        for edges in &mut adjacency {
            edges.sort_by_key(|edge| edge.target);
        }

        let graph = Graph::from_parts(
            stored.nrows,
            stored.ncols,
            stored.header,
            stored.nodes,
            adjacency,
        );
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded graph"
        );
        Ok(graph)
    }
}

fn write_stored(path: &Path, stored: &StoredGraph) -> Result<[u8; CHECKSUM_SIZE]> {
    let serialized = postcard::to_allocvec(stored).map_err(|e| Error::GraphSerialize {
        message: format!("postcard serialization failed: {}", e),
    })?;
    let compressed =
        zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
            Error::GraphSerialize {
                message: format!("zstd compression failed: {}", e),
            }
        })?;
    let checksum: [u8; CHECKSUM_SIZE] = Sha256::digest(&compressed).into();

    let node_count = u32::try_from(stored.nodes.len()).map_err(|_| Error::GraphSerialize {
        message: format!("{} nodes exceed the format limit", stored.nodes.len()),
    })?;
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(GRAPH_MAGIC);
    header[4] = GRAPH_VERSION;
    header[6..10].copy_from_slice(&node_count.to_le_bytes());

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&header)?;
    writer.write_all(&compressed)?;
    writer.write_all(&checksum)?;
    writer.flush()?;

    info!(
        file_size = HEADER_SIZE + compressed.len() + CHECKSUM_SIZE,
        compressed_size = compressed.len(),
        "graph saved"
    );
    Ok(checksum)
}

/// Check that every node sits on its own cell of the stored grid and that
/// edge weights are usable by the solver.
fn validate(stored: &StoredGraph) -> std::result::Result<(), String> {
    let cells = stored
        .nrows
        .checked_mul(stored.ncols)
        .filter(|&cells| cells > 0)
        .ok_or_else(|| format!("invalid grid shape {}x{}", stored.nrows, stored.ncols))?;

    let mut seen = HashSet::with_capacity(stored.nodes.len());
    for (id, node) in stored.nodes.iter().enumerate() {
        if node.cell >= cells {
            return Err(format!(
                "node {} references cell {} outside the {}x{} grid",
                id, node.cell, stored.nrows, stored.ncols
            ));
        }
        if node.row != node.cell / stored.ncols || node.col != node.cell % stored.ncols {
            return Err(format!(
                "node {} position ({}, {}) does not match cell {}",
                id, node.row, node.col, node.cell
            ));
        }
        if !seen.insert(node.cell) {
            return Err(format!("cell {} holds more than one node", node.cell));
        }
        if !(node.cost.is_finite() && node.cost >= 0.0) {
            return Err(format!("node {} has invalid cost {}", id, node.cost));
        }
    }

    for edge in &stored.edges {
        if edge.source >= stored.nodes.len() || edge.target >= stored.nodes.len() {
            return Err(format!(
                "edge {}-{} references a missing node",
                edge.source, edge.target
            ));
        }
        let usable = |value: f64| value.is_finite() && value >= 0.0;
        if !usable(edge.weight) || !usable(edge.length) {
            return Err(format!(
                "edge {}-{} has invalid weight {} or length {}",
                edge.source, edge.target, edge.weight, edge.length
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_irregular_graph_with;
    use crate::grid::CostGrid;
    use crate::landmarks::LandmarkParams;
    use tempfile::tempdir;

    fn sample_graph() -> Graph {
        let values: Vec<f64> = (0..30).map(|v| (v % 7) as f64 + 1.0).collect();
        let grid = CostGrid::new(5, 6, values, GridHeader::default()).unwrap();
        build_irregular_graph_with(
            &grid,
            &LandmarkParams {
                grain_proportion: 0.5,
                seed: Some(11),
                ..LandmarkParams::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn round_trip_preserves_graph() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let graph = sample_graph();
        graph.save(&path).unwrap();

        let loaded = Graph::load(&path).unwrap();
        assert_eq!(loaded.nodes(), graph.nodes());
        assert_eq!(loaded.edge_count(), graph.edge_count());
        for id in 0..graph.node_count() {
            assert_eq!(loaded.neighbours(id), graph.neighbours(id));
        }
    }

    #[test]
    fn corrupted_body_fails_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        sample_graph().save(&path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[HEADER_SIZE] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let err = Graph::load(&path).expect_err("corrupted file");
        assert!(matches!(err, Error::GraphLoad { .. }));
        assert!(err.to_string().contains("checksum"));
    }

    fn one_by_two(nodes: Vec<Node>) -> StoredGraph {
        StoredGraph {
            nrows: 1,
            ncols: 2,
            header: GridHeader::default(),
            nodes,
            edges: Vec::new(),
        }
    }

    fn node(cell: usize, row: usize, col: usize) -> Node {
        Node {
            cell,
            row,
            col,
            x: col as f64 + 0.5,
            y: 0.5,
            cost: 1.0,
        }
    }

    #[test]
    fn rejects_nodes_off_the_grid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        write_stored(&path, &one_by_two(vec![node(0, 0, 0), node(99, 0, 1)])).unwrap();

        let err = Graph::load(&path).expect_err("cell outside the grid");
        assert!(matches!(err, Error::GraphLoad { .. }));
        assert!(err.to_string().contains("cell 99"));
    }

    #[test]
    fn rejects_inconsistent_nodes_and_edges() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");

        let cases = [
            one_by_two(vec![node(1, 0, 0)]),
            one_by_two(vec![node(0, 0, 0), node(0, 0, 0)]),
            StoredGraph {
                edges: vec![StoredEdge {
                    source: 0,
                    target: 1,
                    weight: f64::NAN,
                    length: 1.0,
                }],
                ..one_by_two(vec![node(0, 0, 0), node(1, 0, 1)])
            },
            StoredGraph {
                edges: vec![StoredEdge {
                    source: 0,
                    target: 1,
                    weight: -2.0,
                    length: 1.0,
                }],
                ..one_by_two(vec![node(0, 0, 0), node(1, 0, 1)])
            },
        ];
        for stored in &cases {
            write_stored(&path, stored).unwrap();
            let err = Graph::load(&path).expect_err("invalid body");
            assert!(matches!(err, Error::GraphLoad { .. }), "{err}");
        }

        let valid = StoredGraph {
            edges: vec![StoredEdge {
                source: 0,
                target: 1,
                weight: 1.0,
                length: 1.0,
            }],
            ..one_by_two(vec![node(0, 0, 0), node(1, 0, 1)])
        };
        write_stored(&path, &valid).unwrap();
        let graph = Graph::load(&path).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn rejects_foreign_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        let err = Graph::load(&path).expect_err("bad magic");
        assert!(err.to_string().contains("magic"));
    }
}
