// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinningError {
    #[error("Input vectors must have the same length: {field} has {actual}, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Noise cannot be negative: noise[{index}] = {value}")]
    NegativeNoise { index: usize, value: f64 },

    #[error("Insufficient pixels for operation: expected at least {expected}, got {actual}")]
    InsufficientPoints { expected: usize, actual: usize },

    #[error("All noise values are zero; no reference value for the zero-noise substitution")]
    NoPositiveNoise,

    #[error(
        "Not enough S/N in the whole set of pixels: aggregate S/N {aggregate_sn} is below the \
         target {target_sn}. Pixels with noise but virtually no signal should not be included \
         in the set to bin (Cappellari & Copin 2003, Sec. 2.1)"
    )]
    BelowTarget { aggregate_sn: f64, target_sn: f64 },

    #[error("Accretion produced no bin reaching 0.8 x the target S/N of {target_sn}")]
    NoGoodBins { target_sn: f64 },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

pub type BinningResult<T> = Result<T, BinningError>;
