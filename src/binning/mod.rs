// src/binning/mod.rs
//
// The binning pipeline: accretion -> bad-bin reassignment -> CVT/WVT
// relaxation -> final tessellation quantities, sequenced by `VoronoiBinner`.

pub mod accretion;
pub mod classify;
pub mod quantities;
pub mod reassign;
pub mod relaxation;

pub use accretion::AccretionEngine;
pub use classify::{BinScale, classify_pixels};
pub use quantities::{BinQuantities, compute_bin_quantities};
pub use reassign::reassign_bad_bins;
pub use relaxation::{CvtRelaxation, RelaxationStats};

use crate::config::BinningConfig;
use crate::error::{BinningError, BinningResult};
use crate::field::PixelField;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of a successful binning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningSolution {
    /// Final bin index (0-based, into the per-bin arrays) of every pixel.
    /// Never "unassigned": every pixel belongs to its nearest generator.
    pub classification: Vec<usize>,
    /// Generator position of every surviving bin.
    pub generators: Vec<Point2<f64>>,
    /// Signal-weighted centroid of every bin.
    pub centroids: Vec<Point2<f64>>,
    /// Aggregate S/N of every bin.
    pub sn: Vec<f64>,
    /// Pixel count of every bin.
    pub area: Vec<usize>,
    /// True for bins that bound at most their own generator pixel
    /// (area <= 1). A genuine single-pixel bin and a tessellation degeneracy
    /// are indistinguishable here, so the flag is reported separately
    /// instead of overloading `area`.
    pub unbinned: Vec<bool>,
    /// Final scale: a scalar in equal-mass mode, one value per bin with WVT.
    pub scale: BinScale,
    /// Fractional S/N scatter over multi-pixel bins, in percent.
    pub sn_scatter: f64,
    /// Relaxation diagnostics (zero iterations when CVT was disabled).
    pub relaxation: RelaxationStats,
}

/// Outcome of a binning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BinningOutcome {
    /// The field was partitioned into bins.
    Binned(BinningSolution),
    /// Every pixel already meets the target S/N on its own; binning is
    /// unnecessary and each pixel stands as its own bin.
    NotNeeded { classification: Vec<usize> },
}

/// Validates the input field and runs the binning pipeline.
pub struct VoronoiBinner {
    config: BinningConfig,
}

impl VoronoiBinner {
    pub fn new(config: BinningConfig) -> BinningResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BinningConfig {
        &self.config
    }

    /// Bins `field` towards `target_sn`.
    ///
    /// Infeasible inputs (aggregate S/N below the target) and fields where
    /// accretion finds no good bin are hard errors; a field where every pixel
    /// already meets the target returns [`BinningOutcome::NotNeeded`].
    pub fn bin(&self, mut field: PixelField, target_sn: f64) -> BinningResult<BinningOutcome> {
        if !(target_sn > 0.0 && target_sn.is_finite()) {
            return Err(BinningError::InvalidConfiguration {
                message: format!("Target S/N must be a positive finite number, got {target_sn}"),
            });
        }
        let quiet = self.config.quiet;

        // 1. Recover zero-noise pixels before any S/N is evaluated.
        field.sanitize_noise()?;

        // 2. Feasibility: even pooled entirely, the data must reach the
        //    target; and if every pixel reaches it alone there is nothing
        //    to do.
        let aggregate_sn = field.aggregate_sn();
        if aggregate_sn < target_sn {
            return Err(BinningError::BelowTarget {
                aggregate_sn,
                target_sn,
            });
        }
        if field.min_pixel_sn() > target_sn {
            if !quiet {
                info!("all pixels have enough S/N; binning is not needed");
            }
            return Ok(BinningOutcome::NotNeeded {
                classification: (0..field.len()).collect(),
            });
        }

        // 3. Pixel scale: caller override or the exact minimum pairwise
        //    distance.
        let pixel_size = match self.config.pixel_size {
            Some(pixel_size) => pixel_size,
            None => field.estimate_pixel_size()?,
        };

        // 4. Greedy bin accretion.
        if !quiet {
            info!("bin accretion...");
        }
        let engine = AccretionEngine::new(target_sn, pixel_size, quiet);
        let mut clas = engine.accrete(&field);
        let initial_bins = clas.iter().copied().max().unwrap_or(0);
        if initial_bins == 0 {
            return Err(BinningError::NoGoodBins { target_sn });
        }
        if !quiet {
            info!(initial_bins, "accretion finished");
        }

        // 5. Attach leftover pixels to the good bins; the recomputed
        //    centroids seed the relaxation.
        let mut generators = reassign_bad_bins(&field, &mut clas);
        if !quiet {
            info!(good_bins = generators.len(), "bad bins reassigned");
        }

        // 6. Relax the generators towards a centroidal tessellation.
        let (scale, relaxation) = if self.config.use_cvt {
            if !quiet {
                info!("modified Lloyd algorithm...");
            }
            let (scale, stats) = CvtRelaxation::new(&field, &self.config).relax(&mut generators);
            if !quiet {
                info!(
                    iterations = stats.iterations,
                    converged = stats.converged,
                    dropped = stats.dropped_generators,
                    "relaxation finished"
                );
            }
            (scale, stats)
        } else {
            (BinScale::Uniform(1.0), RelaxationStats::default())
        };

        // 7. Final tessellation and per-bin quantities.
        if !quiet {
            info!("recomputing bin properties...");
        }
        let q = compute_bin_quantities(&field, &generators, &scale, target_sn);
        if !quiet {
            let unbinned_pixels = q.unbinned.iter().filter(|&&u| u).count();
            info!(
                bins = generators.len(),
                unbinned_pixels,
                sn_scatter_percent = q.sn_scatter,
                "binning finished"
            );
        }

        Ok(BinningOutcome::Binned(BinningSolution {
            classification: q.classification,
            generators,
            centroids: q.centroids,
            sn: q.sn,
            area: q.area,
            unbinned: q.unbinned,
            scale,
            sn_scatter: q.sn_scatter,
            relaxation,
        }))
    }
}
