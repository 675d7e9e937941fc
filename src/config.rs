// src/config.rs
use crate::error::{BinningError, BinningResult};
use serde::{Deserialize, Serialize};

/// Configuration for a binning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Run the Modified-Lloyd relaxation after accretion and reassignment.
    pub use_cvt: bool,
    /// Use the Diehl & Statler (2006) modification: geometric centroids plus
    /// a per-bin scale, equalizing fractional S/N scatter instead of mass.
    pub use_wvt: bool,
    /// Pixel scale of the input data. When `None` it is estimated as the
    /// exact minimum pairwise distance between pixels.
    pub pixel_size: Option<f64>,
    /// Suppress progress output.
    pub quiet: bool,
    /// Relaxation stops once the summed squared generator displacement drops
    /// to this value. The default of 0.0 reproduces the bit-exact fixed-point
    /// test of the reference algorithm; a small positive tolerance is a
    /// documented deviation for inputs that oscillate below float precision.
    pub convergence_tolerance: f64,
    /// Safety cap on relaxation iterations. Never alters a naturally
    /// converged result; it only bounds a non-terminating oscillation.
    pub max_iterations: usize,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            use_cvt: true,
            use_wvt: false,
            pixel_size: None,
            quiet: true,
            convergence_tolerance: 0.0,
            max_iterations: 300,
        }
    }
}

impl BinningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cvt(mut self, use_cvt: bool) -> Self {
        self.use_cvt = use_cvt;
        self
    }

    pub fn with_wvt(mut self, use_wvt: bool) -> Self {
        self.use_wvt = use_wvt;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = Some(pixel_size);
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn validate(&self) -> BinningResult<()> {
        if let Some(pixel_size) = self.pixel_size {
            if !(pixel_size > 0.0 && pixel_size.is_finite()) {
                return Err(BinningError::InvalidConfiguration {
                    message: "Pixel size must be a positive finite number".to_string(),
                });
            }
        }

        if !(self.convergence_tolerance >= 0.0) {
            return Err(BinningError::InvalidConfiguration {
                message: "Convergence tolerance cannot be negative".to_string(),
            });
        }

        if self.max_iterations == 0 {
            return Err(BinningError::InvalidConfiguration {
                message: "Relaxation needs at least one iteration".to_string(),
            });
        }

        Ok(())
    }
}
