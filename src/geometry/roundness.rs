// src/geometry/roundness.rs
use super::centroid::geometric_centroid;
use nalgebra::{Point2, distance};

/// Roundness of a bin -- eq. 5 of Cappellari & Copin (2003).
///
/// Ratio of the maximum distance from the bin's geometric centroid to any
/// member pixel over the equivalent radius of a disk with the same pixel
/// count and area, minus one. A perfectly round bin scores 0; elongated bins
/// score higher. A single-pixel bin scores -1 and is always acceptable.
pub fn roundness(positions: &[Point2<f64>], pixel_size: f64) -> f64 {
    let equivalent_radius =
        (positions.len() as f64 / std::f64::consts::PI).sqrt() * pixel_size;
    let centroid = geometric_centroid(positions);

    let max_distance = positions
        .iter()
        .map(|p| distance(p, &centroid))
        .fold(0.0, f64::max);

    max_distance / equivalent_radius - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_pixel_scores_minus_one() {
        assert_relative_eq!(roundness(&[Point2::new(3.0, -1.0)], 1.0), -1.0);
    }

    #[test]
    fn compact_square_is_rounder_than_a_line() {
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
        ];
        let line = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        assert!(roundness(&square, 1.0) < roundness(&line, 1.0));
    }

    #[test]
    fn scale_invariance() {
        let positions = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 2.0),
        ];
        let k = 7.25;
        let scaled: Vec<_> = positions
            .iter()
            .map(|p| Point2::new(p.x * k, p.y * k))
            .collect();

        assert_relative_eq!(
            roundness(&positions, 1.0),
            roundness(&scaled, k),
            max_relative = 1e-12
        );
    }

    #[test]
    fn unit_square_value() {
        // centroid (0.5, 0.5), max distance sqrt(0.5), equivalent radius
        // sqrt(4/pi): roundness = sqrt(0.5)/sqrt(4/pi) - 1
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
        ];
        let expected = (0.5f64).sqrt() / (4.0 / std::f64::consts::PI).sqrt() - 1.0;
        assert_relative_eq!(roundness(&square, 1.0), expected, max_relative = 1e-12);
    }
}
