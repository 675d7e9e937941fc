// src/binning/accretion.rs
//
// Initial binning: steps i-v of section 5.1 of Cappellari & Copin (2003).

use crate::field::PixelField;
use crate::geometry::{geometric_centroid, roundness};
use nalgebra::{Point2, distance_squared};
use tracing::debug;

/// Candidates further than this multiple of the pixel size from every bin
/// member are not connected to the bin.
const CONNECTIVITY_FACTOR: f64 = 1.2;
/// Maximum acceptable roundness of a bin with the candidate added.
const MAX_ROUNDNESS: f64 = 0.3;
/// A bin is good once its S/N exceeds this fraction of the target.
const GOOD_SN_FRACTION: f64 = 0.8;

/// Grows bins pixel-by-pixel from seed points until the S/N and shape
/// constraints force a new bin to start.
///
/// Produces a classification with one entry per pixel: bin numbers count from
/// 1 and 0 marks pixels whose bin never reached a good S/N. Those are handed
/// to the bad-bin reassignment.
pub struct AccretionEngine {
    target_sn: f64,
    pixel_size: f64,
    quiet: bool,
}

impl AccretionEngine {
    pub fn new(target_sn: f64, pixel_size: f64, quiet: bool) -> Self {
        Self {
            target_sn,
            pixel_size,
            quiet,
        }
    }

    pub fn accrete(&self, field: &PixelField) -> Vec<usize> {
        let n = field.len();
        let mut clas = vec![0usize; n];
        let mut good = vec![false; n];

        // Rough estimate of the expected final bin count, only used to give a
        // feeling of the remaining work on very big data sets.
        let expected_bins = if self.quiet {
            0
        } else {
            self.expected_bin_count(field)
        };

        // Start from the pixel with the highest S/N.
        let seed = (0..n)
            .max_by(|&a, &b| {
                field
                    .pixel_sn(a)
                    .partial_cmp(&field.pixel_sn(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let mut current_bin = vec![seed];
        let mut sn = field.pixel_sn(seed);

        let connectivity_sq = (CONNECTIVITY_FACTOR * self.pixel_size).powi(2);

        // With n pixels there are at most n bins.
        for bin_id in 1..=n {
            if !self.quiet {
                debug!(bin = bin_id, expected = expected_bins, "accreting bin");
            }

            // The current bin starts as a single seed pixel.
            clas[current_bin[0]] = bin_id;
            let mut centroid = field.position(current_bin[0]);

            loop {
                let unbinned: Vec<usize> = (0..n).filter(|&i| clas[i] == 0).collect();
                if unbinned.is_empty() {
                    // The pool is exhausted; the bin is good if it already
                    // carries enough S/N.
                    if sn > GOOD_SN_FRACTION * self.target_sn {
                        for &member in &current_bin {
                            good[member] = true;
                        }
                    }
                    break;
                }

                // Unbinned pixel closest to the centroid of the current bin.
                let candidate = unbinned[nearest_index(field, &unbinned, &centroid)];

                // Distance from the candidate to the closest bin member.
                let min_dist_sq = current_bin
                    .iter()
                    .map(|&m| distance_squared(&field.position(m), &field.position(candidate)))
                    .fold(f64::INFINITY, f64::min);

                // Shape and S/N of the bin with the candidate added.
                let mut next_bin = current_bin.clone();
                next_bin.push(candidate);
                let next_positions: Vec<Point2<f64>> =
                    next_bin.iter().map(|&i| field.position(i)).collect();
                let next_roundness = roundness(&next_positions, self.pixel_size);

                let sn_old = sn;
                sn = field.subset_sn(&next_bin);

                // The candidate must be connected to the bin, the possible
                // new bin must stay round enough, and the resulting S/N must
                // not move away from the target.
                if min_dist_sq > connectivity_sq
                    || next_roundness > MAX_ROUNDNESS
                    || (sn - self.target_sn).abs() > (sn_old - self.target_sn).abs()
                {
                    if sn_old > GOOD_SN_FRACTION * self.target_sn {
                        for &member in &current_bin {
                            good[member] = true;
                        }
                    }
                    break;
                }

                // All tests passed: accept the candidate and keep accreting.
                clas[candidate] = bin_id;
                current_bin = next_bin;
                centroid = geometric_centroid(&next_positions);
            }

            let unbinned: Vec<usize> = (0..n).filter(|&i| clas[i] == 0).collect();
            if unbinned.is_empty() {
                break;
            }

            // Seed the next bin from the unbinned pixel closest to the
            // centroid of all pixels binned so far, keeping growth spatially
            // coherent.
            let binned: Vec<Point2<f64>> = (0..n)
                .filter(|&i| clas[i] != 0)
                .map(|i| field.position(i))
                .collect();
            let assigned_centroid = geometric_centroid(&binned);
            let seed = unbinned[nearest_index(field, &unbinned, &assigned_centroid)];
            current_bin = vec![seed];
            sn = field.pixel_sn(seed);
        }

        // Pixels of bins that never reached a good S/N go back to unassigned.
        for i in 0..n {
            if !good[i] {
                clas[i] = 0;
            }
        }

        clas
    }

    /// round(sum of (S/N)^2 over below-target pixels / target^2) plus the
    /// count of pixels already at the target.
    fn expected_bin_count(&self, field: &PixelField) -> usize {
        let mut passing = 0usize;
        let mut below_sum = 0.0;
        for i in 0..field.len() {
            let sn = field.pixel_sn(i);
            if sn >= self.target_sn {
                passing += 1;
            } else {
                below_sum += sn * sn;
            }
        }
        (below_sum / (self.target_sn * self.target_sn)).round() as usize + passing
    }
}

/// Index (into `indices`) of the pixel nearest to `point`.
fn nearest_index(field: &PixelField, indices: &[usize], point: &Point2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (slot, &i) in indices.iter().enumerate() {
        let dist = distance_squared(&field.position(i), point);
        if dist < best_dist {
            best_dist = dist;
            best = slot;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square(signal: f64) -> PixelField {
        PixelField::new(
            vec![0.0, 1.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![signal; 4],
            vec![1.0; 4],
        )
        .unwrap()
    }

    #[test]
    fn absorbs_whole_field_into_one_good_bin() {
        // Aggregate S/N is exactly the target; the bin empties the pool and
        // must still be marked good.
        let field = unit_square(1.0);
        let engine = AccretionEngine::new(2.0, 1.0, true);
        let clas = engine.accrete(&field);
        assert_eq!(clas, vec![1, 1, 1, 1]);
        assert_relative_eq!(field.subset_sn(&[0, 1, 2, 3]), 2.0);
    }

    #[test]
    fn low_target_makes_single_pixel_bins() {
        // Adding any neighbor moves the S/N away from a tiny target, so every
        // pixel closes as its own good bin.
        let field = unit_square(1.0);
        let engine = AccretionEngine::new(0.1, 1.0, true);
        let clas = engine.accrete(&field);

        let mut ids: Vec<usize> = clas.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert!(clas.iter().all(|&id| id != 0));
    }

    #[test]
    fn unreachable_target_leaves_pixels_unassigned() {
        // Roundness and connectivity allow growth but the S/N progress test
        // stops each bin below 0.8 x target; everything is zeroed out.
        let field = PixelField::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![0.0; 6],
            vec![0.1; 6],
            vec![1.0; 6],
        )
        .unwrap();
        let engine = AccretionEngine::new(10.0, 1.0, true);
        let clas = engine.accrete(&field);
        assert!(clas.iter().all(|&id| id == 0));
    }

    #[test]
    fn good_bins_exceed_the_sn_floor() {
        let n = 25;
        let mut x = Vec::new();
        let mut y = Vec::new();
        for j in 0..5 {
            for i in 0..5 {
                x.push(i as f64);
                y.push(j as f64);
            }
        }
        // Signal rises towards the field centre.
        let signal: Vec<f64> = (0..n)
            .map(|i| {
                let dx = x[i] - 2.0;
                let dy = y[i] - 2.0;
                3.0 / (1.0 + dx * dx + dy * dy)
            })
            .collect();
        let field = PixelField::new(x, y, signal, vec![1.0; n]).unwrap();

        let target = 2.0;
        let engine = AccretionEngine::new(target, 1.0, true);
        let clas = engine.accrete(&field);

        let max_id = clas.iter().copied().max().unwrap();
        for id in 1..=max_id {
            let members: Vec<usize> = (0..n).filter(|&i| clas[i] == id).collect();
            if !members.is_empty() {
                assert!(field.subset_sn(&members) > 0.8 * target);
            }
        }
    }
}
