// src/lib.rs
//
// Adaptive Voronoi binning of irregularly sampled 2D data: greedy bin
// accretion, bad-bin reassignment, centroidal Voronoi relaxation (Modified
// Lloyd, optional WVT variant) and final tessellation quantities, after
// Cappellari & Copin (2003) and Diehl & Statler (2006).

pub mod binning;
pub mod config;
pub mod error;
pub mod field;
pub mod geometry;

// Re-exports für einfache Verwendung
pub use binning::{BinningOutcome, BinningSolution, VoronoiBinner};
pub use config::BinningConfig;
pub use error::{BinningError, BinningResult};
pub use field::PixelField;

// Öffentliche API
pub mod prelude {
    pub use super::{
        binning::{
            BinScale, BinningOutcome, BinningSolution, RelaxationStats, VoronoiBinner,
        },
        config::BinningConfig,
        error::{BinningError, BinningResult},
        field::PixelField,
        geometry::{geometric_centroid, roundness, weighted_centroid},
    };
}
