mod common;

use common::small_grid;
use irlgraph_lib::{
    build_irregular_graph_with, impute_gaps, solve_accumulated_cost, Error, LandmarkParams, Raster,
    RasterCell,
};

fn sparse_solve() -> (irlgraph_lib::CostGrid, irlgraph_lib::Graph, Raster) {
    let grid = small_grid();
    let graph = build_irregular_graph_with(
        &grid,
        &LandmarkParams {
            grain_proportion: 0.1,
            seed: Some(8),
            ..LandmarkParams::default()
        },
    )
    .unwrap();
    let partial = solve_accumulated_cost(&graph, &grid, &[(45.0, 25.0).into()]).unwrap();
    (grid, graph, partial)
}

#[test]
fn solved_cells_are_never_altered() {
    let (grid, graph, partial) = sparse_solve();
    assert!(partial.unset_count() > grid.null_count(), "fixture leaves gaps");

    let filled = impute_gaps(&partial, &grid, &graph).unwrap();
    for cell in 0..grid.len() {
        if partial.get(cell).is_solved() {
            assert_eq!(filled.get(cell), partial.get(cell));
        }
    }
}

#[test]
fn every_gap_is_filled_and_nulls_stay_unset() {
    let (grid, graph, partial) = sparse_solve();
    let filled = impute_gaps(&partial, &grid, &graph).unwrap();
    for cell in 0..grid.len() {
        if grid.is_null(cell) {
            assert_eq!(filled.get(cell), RasterCell::Unset);
        } else {
            assert!(filled.get(cell).is_solved(), "cell {} left unset", cell);
        }
    }
    assert_eq!(filled.unset_count(), grid.null_count());
}

#[test]
fn imputed_values_come_from_solved_cells() {
    let (grid, graph, partial) = sparse_solve();
    let filled = impute_gaps(&partial, &grid, &graph).unwrap();
    let solved: Vec<RasterCell> = partial
        .cells()
        .iter()
        .copied()
        .filter(|cell| cell.is_solved())
        .collect();
    for cell in grid.non_null_cells() {
        assert!(solved.contains(&filled.get(cell)));
    }
}

#[test]
fn imputation_is_idempotent() {
    let (grid, graph, partial) = sparse_solve();
    let once = impute_gaps(&partial, &grid, &graph).unwrap();
    let twice = impute_gaps(&once, &grid, &graph).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn mismatched_raster_is_rejected() {
    let (_, graph, partial) = sparse_solve();
    let other = common::uniform_grid(3, 3, 1.0);
    let err = impute_gaps(&partial, &other, &graph).expect_err("shape mismatch");
    assert!(matches!(err, Error::InvalidGrid { .. }));
}
