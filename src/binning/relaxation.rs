// src/binning/relaxation.rs
//
// Modified-Lloyd algorithm: section 4.1 of Cappellari & Copin (2003), with
// the optional modification of Diehl & Statler (2006) when WVT is active.

use super::classify::{BinScale, classify_pixels};
use crate::config::BinningConfig;
use crate::field::PixelField;
use crate::geometry::weighted_centroid;
use nalgebra::{Point2, distance_squared};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Diagnostics of one relaxation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelaxationStats {
    /// Number of classification/centroid iterations performed. Zero when the
    /// relaxation was skipped (`use_cvt = false`).
    pub iterations: usize,
    /// Whether the displacement sum reached the convergence tolerance.
    pub converged: bool,
    /// Summed squared generator displacement of the last iteration.
    pub final_displacement: f64,
    /// Generators dropped because their Voronoi cell came up empty.
    pub dropped_generators: usize,
}

/// Moves generators to the (density^2-weighted) centroids of their Voronoi
/// cells until the tessellation stops changing.
///
/// Equal-mass mode weighs pixels by (signal^2/noise^2)^2; the squared density
/// is what produces equal-mass rather than equal-count bins. WVT mode uses
/// geometric centroids and instead equalizes the fractional S/N scatter via a
/// per-bin scale of sqrt(area / S/N).
pub struct CvtRelaxation<'a> {
    field: &'a PixelField,
    config: &'a BinningConfig,
}

impl<'a> CvtRelaxation<'a> {
    pub fn new(field: &'a PixelField, config: &'a BinningConfig) -> Self {
        Self { field, config }
    }

    /// Relaxes `generators` in place, shrinking the vector as empty cells are
    /// dropped. Returns the final scale and the run diagnostics.
    pub fn relax(&self, generators: &mut Vec<Point2<f64>>) -> (BinScale, RelaxationStats) {
        let field = self.field;
        let wvt = self.config.use_wvt;

        // Per-pixel density: uniform for WVT, signal^2/noise^2 otherwise.
        // Centroids are weighted by density^2.
        let weights: Vec<f64> = if wvt {
            vec![1.0; field.len()]
        } else {
            (0..field.len())
                .map(|i| {
                    let dens = field.pixel_sn(i) * field.pixel_sn(i);
                    dens * dens
                })
                .collect()
        };

        // Start with the same scale length for all bins.
        let mut scale = if wvt {
            BinScale::PerBin(vec![1.0; generators.len()])
        } else {
            BinScale::Uniform(1.0)
        };

        let initial_count = generators.len();
        let mut stats = RelaxationStats::default();

        for iteration in 0..self.config.max_iterations {
            let clas = classify_pixels(field, generators, &scale);

            // Gather the Voronoi cells of the current generators.
            let mut cells: Vec<Vec<usize>> = vec![Vec::new(); generators.len()];
            for (pixel, &bin) in clas.iter().enumerate() {
                cells[bin].push(pixel);
            }

            // Move surviving generators to their cell centroids; cells that
            // came up empty are discarded permanently.
            let mut displacement = 0.0;
            let mut survivors = Vec::with_capacity(generators.len());
            let mut survivor_scales = Vec::new();
            for (bin, cell) in cells.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let positions: Vec<Point2<f64>> =
                    cell.iter().map(|&i| field.position(i)).collect();
                let cell_weights: Vec<f64> = cell.iter().map(|&i| weights[i]).collect();
                let node = weighted_centroid(&positions, &cell_weights);

                displacement += distance_squared(&node, &generators[bin]);
                if wvt {
                    // eq. 4 of Diehl & Statler (2006)
                    let sn = field.subset_sn(cell);
                    survivor_scales.push((cell.len() as f64 / sn).sqrt());
                }
                survivors.push(node);
            }

            *generators = survivors;
            if wvt {
                scale = BinScale::PerBin(survivor_scales);
            }

            stats.iterations = iteration + 1;
            stats.final_displacement = displacement;
            if !self.config.quiet {
                debug!(
                    iteration = iteration + 1,
                    displacement,
                    generators = generators.len(),
                    "relaxation step"
                );
            }

            if displacement <= self.config.convergence_tolerance {
                stats.converged = true;
                break;
            }
        }

        stats.dropped_generators = initial_count - generators.len();
        (scale, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::reassign::reassign_bad_bins;

    fn grid_field(side: usize) -> PixelField {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for j in 0..side {
            for i in 0..side {
                x.push(i as f64);
                y.push(j as f64);
            }
        }
        let n = side * side;
        PixelField::new(x, y, vec![1.0; n], vec![1.0; n]).unwrap()
    }

    fn config() -> BinningConfig {
        BinningConfig::default()
    }

    #[test]
    fn generator_count_never_grows() {
        let field = grid_field(6);
        // Two of these generators sit far outside the field and lose the
        // classification everywhere.
        let mut generators = vec![
            Point2::new(1.0, 1.0),
            Point2::new(4.0, 4.0),
            Point2::new(100.0, 100.0),
            Point2::new(-100.0, 50.0),
        ];
        let initial = generators.len();

        let cfg = config();
        let (_, stats) = CvtRelaxation::new(&field, &cfg).relax(&mut generators);

        assert!(generators.len() <= initial);
        assert_eq!(stats.dropped_generators, initial - generators.len());
        assert!(generators.len() >= 1);
    }

    #[test]
    fn converged_positions_are_a_fixed_point() {
        let field = grid_field(5);
        let mut clas: Vec<usize> = (0..field.len())
            .map(|i| if i < field.len() / 2 { 1 } else { 2 })
            .collect();
        let mut generators = reassign_bad_bins(&field, &mut clas);

        let cfg = config();
        let (_, stats) = CvtRelaxation::new(&field, &cfg).relax(&mut generators);
        assert!(stats.converged);

        // Re-running on the converged generators must not move anything.
        let mut again = generators.clone();
        let (_, stats2) = CvtRelaxation::new(&field, &cfg).relax(&mut again);
        assert!(stats2.converged);
        assert_eq!(stats2.iterations, 1);
        assert_eq!(stats2.final_displacement, 0.0);
        for (a, b) in generators.iter().zip(&again) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn single_generator_converges_immediately() {
        let field = grid_field(3);
        let mut clas = vec![1; field.len()];
        let mut generators = reassign_bad_bins(&field, &mut clas);

        let cfg = config();
        let (scale, stats) = CvtRelaxation::new(&field, &cfg).relax(&mut generators);

        assert!(stats.converged);
        assert_eq!(stats.iterations, 1);
        assert_eq!(generators.len(), 1);
        assert!(matches!(scale, BinScale::Uniform(s) if s == 1.0));
    }

    #[test]
    fn wvt_mode_returns_one_scale_per_bin() {
        let field = grid_field(6);
        let mut generators = vec![Point2::new(1.0, 2.5), Point2::new(4.0, 2.5)];

        let cfg = config().with_wvt(true);
        let (scale, stats) = CvtRelaxation::new(&field, &cfg).relax(&mut generators);

        match scale {
            BinScale::PerBin(scales) => {
                assert_eq!(scales.len(), generators.len());
                assert!(scales.iter().all(|&s| s > 0.0));
            }
            BinScale::Uniform(_) => panic!("WVT must carry per-bin scales"),
        }
        assert!(stats.iterations >= 1);
    }
}
