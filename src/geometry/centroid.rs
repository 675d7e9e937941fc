// src/geometry/centroid.rs
use nalgebra::Point2;

/// Weighted centroid of a pixel subset -- eq. 4 of Cappellari & Copin (2003).
///
/// Precondition: `positions` and `weights` have equal length and the weight
/// sum is positive. Callers guarantee at least one pixel with positive weight
/// in every subset passed in; this is not a recoverable error.
pub fn weighted_centroid(positions: &[Point2<f64>], weights: &[f64]) -> Point2<f64> {
    debug_assert_eq!(positions.len(), weights.len());

    let mass: f64 = weights.iter().sum();
    debug_assert!(mass > 0.0, "weighted centroid of a zero-mass subset");

    let mut xbar = 0.0;
    let mut ybar = 0.0;
    for (p, &w) in positions.iter().zip(weights) {
        xbar += p.x * w;
        ybar += p.y * w;
    }
    Point2::new(xbar / mass, ybar / mass)
}

/// Arithmetic-mean centroid, i.e. the weighted centroid with uniform weights.
pub fn geometric_centroid(positions: &[Point2<f64>]) -> Point2<f64> {
    debug_assert!(!positions.is_empty());

    let n = positions.len() as f64;
    let sum_x: f64 = positions.iter().map(|p| p.x).sum();
    let sum_y: f64 = positions.iter().map(|p| p.y).sum();
    Point2::new(sum_x / n, sum_y / n)
}
