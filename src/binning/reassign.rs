// src/binning/reassign.rs
//
// Reassign bad bins: steps vi-vii of section 5.1 of Cappellari & Copin (2003).

use crate::field::PixelField;
use crate::geometry::geometric_centroid;
use nalgebra::{Point2, distance_squared};

/// Attaches every unassigned pixel (classification 0) to the good bin with
/// the nearest centroid, then recomputes all centroids over the complete
/// assignment. The returned centroids seed the Voronoi relaxation.
///
/// Precondition (orchestrator enforced): at least one pixel carries a
/// non-zero classification.
pub fn reassign_bad_bins(field: &PixelField, clas: &mut [usize]) -> Vec<Point2<f64>> {
    let good_ids = nonzero_bin_ids(clas);
    debug_assert!(!good_ids.is_empty());

    let centroids = bin_centroids(field, clas, &good_ids);

    // Pixels of bins with S/N below the target go to the closest good bin.
    for pixel in 0..field.len() {
        if clas[pixel] != 0 {
            continue;
        }
        let p = field.position(pixel);
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (slot, node) in centroids.iter().enumerate() {
            let dist = distance_squared(&p, node);
            if dist < best_dist {
                best_dist = dist;
                best = slot;
            }
        }
        clas[pixel] = good_ids[best];
    }

    // Recompute the centroids of the reassigned bins; these are the starting
    // generators for the CVT.
    bin_centroids(field, clas, &good_ids)
}

/// Distinct non-zero bin ids, ascending.
fn nonzero_bin_ids(clas: &[usize]) -> Vec<usize> {
    let mut ids: Vec<usize> = clas.iter().copied().filter(|&id| id != 0).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn bin_centroids(field: &PixelField, clas: &[usize], ids: &[usize]) -> Vec<Point2<f64>> {
    ids.iter()
        .map(|&id| {
            let members: Vec<Point2<f64>> = (0..field.len())
                .filter(|&i| clas[i] == id)
                .map(|i| field.position(i))
                .collect();
            geometric_centroid(&members)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn attaches_unassigned_pixels_to_nearest_bin() {
        // Two good bins at the ends of a line, two orphans in between.
        let field = PixelField::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![0.0; 6],
            vec![1.0; 6],
            vec![1.0; 6],
        )
        .unwrap();
        let mut clas = vec![1, 1, 0, 0, 4, 4];

        let generators = reassign_bad_bins(&field, &mut clas);

        assert_eq!(clas, vec![1, 1, 1, 4, 4, 4]);
        assert_eq!(generators.len(), 2);
        assert_relative_eq!(generators[0].x, 1.0);
        assert_relative_eq!(generators[1].x, 4.0);
    }

    #[test]
    fn no_orphans_leaves_classification_unchanged() {
        let field = PixelField::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0; 4],
            vec![1.0; 4],
            vec![1.0; 4],
        )
        .unwrap();
        let mut clas = vec![2, 2, 2, 2];

        let generators = reassign_bad_bins(&field, &mut clas);

        assert_eq!(clas, vec![2, 2, 2, 2]);
        assert_eq!(generators.len(), 1);
        assert_relative_eq!(generators[0].x, 1.5);
        assert_relative_eq!(generators[0].y, 0.0);
    }
}
