//! Delaunay triangulation of integer lattice points.
//!
//! The mesh itself comes from the `delaunay` crate, built with its robust
//! kernel. Each mesh vertex carries the index of the input point it came from.
//! Landmark cells sit on the grid lattice, so the post-pass predicates run
//! exactly on integers (`i64` orientation, `i128` in-circle).
//!
//! Lattices are full of cocircular quadruples, and the mesh picks one diagonal
//! of each. Where two adjacent triangles form a cocircular quadrilateral, both
//! diagonals are reported ("cocircular completion"). For four-point
//! cocircularity such as a unit square the edge set is then independent of
//! which diagonal the mesh picked, and a fully selected lattice comes out
//! 8-connected. Larger cocircular sets (five or more points on one circle) are
//! only completed pairwise and may still keep the mesh's choice.

use std::collections::{BTreeSet, HashMap};

use delaunay::core::builder::DelaunayTriangulationBuilder;
use delaunay::core::vertex::{Vertex, VertexBuilder};
use delaunay::geometry::kernel::RobustKernel;
use delaunay::geometry::point::Point as MeshPoint;
use delaunay::geometry::traits::coordinate::Coordinate;
use tracing::debug;

use crate::error::{Error, Result};

/// Integer lattice point `(x, y)`.
pub type Point = (i64, i64);

/// Result of triangulating a point set. Indices refer to the input slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triangulation {
    triangles: Vec<[usize; 3]>,
    edges: Vec<(usize, usize)>,
}

impl Triangulation {
    /// Counter-clockwise triangles, each starting at its lowest index, sorted.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Unique undirected edges `(a, b)` with `a < b`, sorted.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

/// Triangulate a set of distinct lattice points.
///
/// Fewer than two points give an empty triangulation and collinear points a
/// chain. Anything else goes through the mesh builder.
pub fn triangulate(points: &[Point]) -> Result<Triangulation> {
    if points.len() < 2 {
        return Ok(Triangulation::default());
    }
    if is_collinear(points) {
        return Ok(chain(points));
    }

    let triangles = mesh_triangles(points)?;
    let edges = complete(points, &triangles);
    debug!(
        points = points.len(),
        triangles = triangles.len(),
        edges = edges.len(),
        "triangulated landmark set"
    );
    Ok(Triangulation { triangles, edges })
}

fn triangulation_error(message: impl std::fmt::Display) -> Error {
    Error::Triangulation {
        message: message.to_string(),
    }
}

/// Run the mesh builder and read its cells back as input-index triangles.
fn mesh_triangles(points: &[Point]) -> Result<Vec<[usize; 3]>> {
    let vertices = points
        .iter()
        .enumerate()
        .map(|(index, &(x, y))| {
            VertexBuilder::default()
                .point(MeshPoint::new([x as f64, y as f64]))
                .data(index)
                .build()
                .map_err(triangulation_error)
        })
        .collect::<Result<Vec<Vertex<f64, usize, 2>>>>()?;

    let mesh = DelaunayTriangulationBuilder::from_vertices(&vertices)
        .build_with_kernel::<_, ()>(&RobustKernel::new())
        .map_err(triangulation_error)?;
    if mesh.number_of_vertices() != points.len() {
        return Err(triangulation_error(format!(
            "mesh kept {} of {} points",
            mesh.number_of_vertices(),
            points.len()
        )));
    }

    let tds = mesh.tds();
    let mut triangles = Vec::new();
    for key in tds.cell_keys() {
        let Some(cell) = tds.get_cell(key) else {
            continue;
        };
        let corners: Option<Vec<usize>> = cell
            .vertices()
            .iter()
            .map(|&vertex| tds.get_vertex_by_key(vertex).and_then(|v| v.data().copied()))
            .collect();
        match corners.as_deref() {
            Some(&[a, b, c]) => triangles.push(canonical(points, [a, b, c])),
            _ => return Err(triangulation_error("mesh cell without three input corners")),
        }
    }
    triangles.sort_unstable();
    Ok(triangles)
}

/// Counter-clockwise order, rotated to start at the lowest index.
fn canonical(points: &[Point], [a, b, c]: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = if orient(points[a], points[b], points[c]) < 0 {
        [a, c, b]
    } else {
        [a, b, c]
    };
    if a < b && a < c {
        [a, b, c]
    } else if b < c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}

/// Mesh edges plus the second diagonal of every cocircular quadrilateral.
fn complete(points: &[Point], triangles: &[[usize; 3]]) -> Vec<(usize, usize)> {
    let undirected = |a: usize, b: usize| (a.min(b), a.max(b));

    let mut opposite: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for &[a, b, c] in triangles {
        for (u, v, w) in [(a, b, c), (b, c, a), (c, a, b)] {
            opposite.entry(undirected(u, v)).or_default().push(w);
        }
    }

    let mut edges = BTreeSet::new();
    for (&(u, v), across) in &opposite {
        edges.insert((u, v));
        let &[w, z] = across.as_slice() else {
            continue;
        };
        let [a, b, c] = canonical(points, [u, v, w]);
        if in_circle(points[a], points[b], points[c], points[z]) == 0 {
            edges.insert(undirected(w, z));
        }
    }
    edges.into_iter().collect()
}

fn is_collinear(points: &[Point]) -> bool {
    let origin = points[0];
    let Some(&other) = points.iter().find(|&&p| p != origin) else {
        return true;
    };
    points.iter().all(|&p| orient(origin, other, p) == 0)
}

/// Degenerate case: all points on one line.
fn chain(points: &[Point]) -> Triangulation {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| points[i]);
    let mut edges: Vec<(usize, usize)> = order
        .windows(2)
        .map(|pair| (pair[0].min(pair[1]), pair[0].max(pair[1])))
        .collect();
    edges.sort_unstable();
    Triangulation {
        triangles: Vec::new(),
        edges,
    }
}

/// Twice the signed area of `abc`; positive when counter-clockwise.
fn orient(a: Point, b: Point, c: Point) -> i64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Positive when `d` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `abc`, zero when cocircular.
fn in_circle(a: Point, b: Point, c: Point, d: Point) -> i128 {
    let (adx, ady) = ((a.0 - d.0) as i128, (a.1 - d.1) as i128);
    let (bdx, bdy) = ((b.0 - d.0) as i128, (b.1 - d.1) as i128);
    let (cdx, cdy) = ((c.0 - d.0) as i128, (c.1 - d.1) as i128);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    ad * (bdx * cdy - cdx * bdy) + bd * (cdx * ady - adx * cdy) + cd * (adx * bdy - bdx * ady)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(width: i64, height: i64) -> Vec<Point> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .collect()
    }

    fn edge_points(points: &[Point], t: &Triangulation) -> BTreeSet<(Point, Point)> {
        t.edges()
            .iter()
            .map(|&(a, b)| {
                let (pa, pb) = (points[a], points[b]);
                (pa.min(pb), pa.max(pb))
            })
            .collect()
    }

    #[test]
    fn three_points_form_one_triangle() {
        let points = vec![(0, 0), (4, 0), (1, 3)];
        let t = triangulate(&points).unwrap();
        assert_eq!(t.edges(), &[(0, 1), (0, 2), (1, 2)]);
        assert_eq!(t.triangles(), &[[0, 1, 2]]);
    }

    #[test]
    fn unit_square_reports_both_diagonals() {
        let points = lattice(2, 2);
        let t = triangulate(&points).unwrap();
        assert_eq!(t.edges().len(), 6);
        assert_eq!(t.triangles().len(), 2);
    }

    #[test]
    fn full_lattice_is_eight_connected() {
        let points = lattice(3, 3);
        let t = triangulate(&points).unwrap();
        // 12 orthogonal + 8 diagonal edges.
        assert_eq!(t.edges().len(), 20);
        assert!(t.edges().iter().all(|&(a, b)| {
            let (pa, pb) = (points[a], points[b]);
            (pa.0 - pb.0).abs() <= 1 && (pa.1 - pb.1).abs() <= 1
        }));
    }

    #[test]
    fn lattice_edges_do_not_depend_on_insertion_order() {
        let points = lattice(6, 5);
        let mut reversed = points.clone();
        reversed.reverse();
        let forward = triangulate(&points).unwrap();
        let backward = triangulate(&reversed).unwrap();
        assert_eq!(
            edge_points(&points, &forward),
            edge_points(&reversed, &backward)
        );
    }

    #[test]
    fn collinear_points_form_a_chain() {
        let points = vec![(0, 5), (0, 1), (0, 3)];
        let t = triangulate(&points).unwrap();
        assert_eq!(t.edges(), &[(0, 2), (1, 2)]);
    }

    #[test]
    fn diagonal_collinear_points_form_a_chain() {
        let points = vec![(0, 0), (2, 2), (1, 1)];
        let t = triangulate(&points).unwrap();
        assert_eq!(t.edges(), &[(0, 2), (1, 2)]);
        assert!(t.triangles().is_empty());
    }

    #[test]
    fn hull_edges_survive_a_far_bounding_box() {
        // The bounding box corner (0, 0) sits inside the circumcircle of the
        // hull triangle, so nothing outside the input may seed the mesh.
        let points = vec![(0, 3), (3, 0), (2, 2), (10, 10)];
        let t = triangulate(&points).unwrap();
        assert_eq!(t.edges(), &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(t.triangles().len(), 3);
    }

    #[test]
    fn single_point_has_no_edges() {
        assert!(triangulate(&[(2, 2)]).unwrap().edges().is_empty());
    }

    #[test]
    fn scattered_points_satisfy_empty_circumcircle() {
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut points = BTreeSet::from([(0, 0), (40, 0), (0, 30), (40, 30)]);
        while points.len() < 120 {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let x = ((state >> 33) % 41) as i64;
            let y = ((state >> 17) % 31) as i64;
            points.insert((x, y));
        }
        let points: Vec<Point> = points.into_iter().collect();
        let t = triangulate(&points).unwrap();

        // Euler: a triangulation of n points with h hull points has 2n - 2 - h triangles.
        let hull = points
            .iter()
            .filter(|p| p.0 == 0 || p.1 == 0 || p.0 == 40 || p.1 == 30)
            .count();
        assert_eq!(t.triangles().len(), 2 * points.len() - 2 - hull);

        for &[a, b, c] in t.triangles() {
            assert!(orient(points[a], points[b], points[c]) > 0);
            for (i, &p) in points.iter().enumerate() {
                if i == a || i == b || i == c {
                    continue;
                }
                assert!(
                    in_circle(points[a], points[b], points[c], p) <= 0,
                    "point {:?} inside circumcircle of {:?}",
                    p,
                    [points[a], points[b], points[c]]
                );
            }
        }
    }
}
