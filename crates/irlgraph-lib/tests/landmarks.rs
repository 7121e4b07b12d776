mod common;

use common::{fixtures_dir, small_grid};
use irlgraph_lib::{read_points_of_interest, select_landmarks, Error, LandmarkParams};

#[test]
fn zero_grain_proportion_selects_no_grain_cells() {
    let grid = small_grid();
    let landmarks = select_landmarks(
        &grid,
        &LandmarkParams {
            grain_proportion: 0.0,
            seed: Some(4),
            ..LandmarkParams::default()
        },
    )
    .unwrap();
    assert!(landmarks.grain.is_empty());
    assert_eq!(landmarks.seed, 4);
}

#[test]
fn fixture_subsets_match_layout() {
    let grid = small_grid();
    let landmarks = select_landmarks(
        &grid,
        &LandmarkParams {
            cutoff: 0.5,
            grain_proportion: 0.1,
            seed: Some(4),
            ..LandmarkParams::default()
        },
    )
    .unwrap();

    assert_eq!(landmarks.null, vec![33, 34, 43, 44]);
    assert_eq!(landmarks.grain.len(), 8);
    // Edge ring plus the twelve cells around the 2x2 null lake.
    assert_eq!(landmarks.landscape_limit.len(), 32 + 12);
    assert!(landmarks
        .very_important
        .iter()
        .all(|&cell| !grid.is_edge(cell) && !grid.is_null(cell)));
    // Cells beside the cost step between the 1 and 5 regions are flagged.
    assert!(landmarks.very_important.contains(&grid.index(1, 4)));
    assert!(landmarks.very_important.contains(&grid.index(1, 5)));
}

#[test]
fn grain_sample_depends_only_on_seed() {
    let grid = small_grid();
    let params = |seed| LandmarkParams {
        grain_proportion: 0.3,
        seed: Some(seed),
        ..LandmarkParams::default()
    };
    let a = select_landmarks(&grid, &params(21)).unwrap();
    let b = select_landmarks(&grid, &params(21)).unwrap();
    let c = select_landmarks(&grid, &params(22)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.grain.len(), c.grain.len());
    assert_ne!(a.grain, c.grain);
}

#[test]
fn points_of_interest_load_from_csv() {
    let points = read_points_of_interest(&fixtures_dir().join("poi.csv")).unwrap();
    assert_eq!(points, vec![(15.0, 75.0), (85.0, 15.0)]);

    let grid = small_grid();
    let landmarks = select_landmarks(
        &grid,
        &LandmarkParams {
            seed: Some(1),
            points_of_interest: points,
            ..LandmarkParams::default()
        },
    )
    .unwrap();
    assert_eq!(landmarks.points_of_interest, vec![1, 68]);
}

#[test]
fn out_of_range_parameters_are_rejected() {
    let grid = small_grid();
    for params in [
        LandmarkParams {
            grain_proportion: 1.5,
            ..LandmarkParams::default()
        },
        LandmarkParams {
            cutoff: -1.0,
            ..LandmarkParams::default()
        },
        LandmarkParams {
            points_of_interest: vec![(500.0, 5.0)],
            ..LandmarkParams::default()
        },
    ] {
        let err = select_landmarks(&grid, &params).expect_err("invalid parameters");
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
