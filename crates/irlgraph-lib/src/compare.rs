use serde::Serialize;

use crate::error::{Error, Result};
use crate::raster::Raster;

/// Agreement statistics between two accumulated-cost rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    /// Cells where both rasters hold a cost.
    pub compared_cells: usize,
    /// Cells with a cost only in the candidate.
    pub candidate_only: usize,
    /// Cells with a cost only in the reference.
    pub reference_only: usize,
    pub mean_absolute_error: Option<f64>,
    pub root_mean_square_error: Option<f64>,
    pub max_absolute_error: Option<f64>,
    /// Pearson correlation; `None` when either side has zero variance.
    pub correlation: Option<f64>,
}

/// Compare a candidate raster against a reference of the same shape.
pub fn compare_rasters(candidate: &Raster, reference: &Raster) -> Result<Comparison> {
    if candidate.nrows() != reference.nrows() || candidate.ncols() != reference.ncols() {
        return Err(Error::invalid_grid(format!(
            "cannot compare a {}x{} raster with a {}x{} raster",
            candidate.nrows(),
            candidate.ncols(),
            reference.nrows(),
            reference.ncols()
        )));
    }

    let mut pairs = Vec::new();
    let mut candidate_only = 0;
    let mut reference_only = 0;
    for (a, b) in candidate.cells().iter().zip(reference.cells()) {
        match (a.cost(), b.cost()) {
            (Some(a), Some(b)) => pairs.push((a, b)),
            (Some(_), None) => candidate_only += 1,
            (None, Some(_)) => reference_only += 1,
            (None, None) => {}
        }
    }

    let n = pairs.len() as f64;
    let (mean_absolute_error, root_mean_square_error, max_absolute_error) = if pairs.is_empty() {
        (None, None, None)
    } else {
        let abs: Vec<f64> = pairs.iter().map(|(a, b)| (a - b).abs()).collect();
        (
            Some(abs.iter().sum::<f64>() / n),
            Some((abs.iter().map(|e| e * e).sum::<f64>() / n).sqrt()),
            abs.iter().copied().reduce(f64::max),
        )
    };

    Ok(Comparison {
        compared_cells: pairs.len(),
        candidate_only,
        reference_only,
        mean_absolute_error,
        root_mean_square_error,
        max_absolute_error,
        correlation: pearson(&pairs),
    })
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for &(a, b) in pairs {
        cov += (a - mean_a) * (b - mean_b);
        var_a += (a - mean_a).powi(2);
        var_b += (b - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CostGrid, GridHeader};
    use crate::raster::RasterCell;

    fn raster(values: &[RasterCell]) -> Raster {
        let grid = CostGrid::new(1, values.len(), vec![1.0; values.len()], GridHeader::default())
            .unwrap();
        let mut raster = Raster::unset_like(&grid);
        for (cell, value) in values.iter().enumerate() {
            raster.set(cell, *value);
        }
        raster
    }

    #[test]
    fn identical_rasters_have_zero_error() {
        let cells = [RasterCell::Cost(0.0), RasterCell::Cost(1.0), RasterCell::Cost(3.0)];
        let stats = compare_rasters(&raster(&cells), &raster(&cells)).unwrap();
        assert_eq!(stats.compared_cells, 3);
        assert_eq!(stats.max_absolute_error, Some(0.0));
        assert!((stats.correlation.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn errors_and_one_sided_cells() {
        let candidate = raster(&[
            RasterCell::Cost(1.0),
            RasterCell::Cost(4.0),
            RasterCell::Cost(2.0),
            RasterCell::Unset,
        ]);
        let reference = raster(&[
            RasterCell::Cost(0.0),
            RasterCell::Cost(2.0),
            RasterCell::NoPath,
            RasterCell::Cost(5.0),
        ]);
        let stats = compare_rasters(&candidate, &reference).unwrap();
        assert_eq!(stats.compared_cells, 2);
        assert_eq!(stats.candidate_only, 1);
        assert_eq!(stats.reference_only, 1);
        assert_eq!(stats.mean_absolute_error, Some(1.5));
        assert_eq!(stats.max_absolute_error, Some(2.0));
        assert!((stats.root_mean_square_error.unwrap() - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = compare_rasters(&raster(&[RasterCell::Unset]), &raster(&[RasterCell::Unset; 2]))
            .expect_err("shape mismatch");
        assert!(matches!(err, Error::InvalidGrid { .. }));
    }
}
