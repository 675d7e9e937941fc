// src/binning/quantities.rs
//
// Final tessellation pass: recompute the classification against the
// surviving generators and derive the per-bin summary quantities.

use super::classify::{BinScale, classify_pixels};
use crate::field::PixelField;
use crate::geometry::weighted_centroid;
use nalgebra::Point2;

/// Authoritative per-bin quantities after relaxation.
#[derive(Debug, Clone)]
pub struct BinQuantities {
    /// Final bin index (0-based, into the generator arrays) of every pixel.
    pub classification: Vec<usize>,
    /// Signal-weighted centroid of every bin.
    pub centroids: Vec<Point2<f64>>,
    /// Aggregate S/N of every bin.
    pub sn: Vec<f64>,
    /// Pixel count of every bin.
    pub area: Vec<usize>,
    /// True for bins carrying only their own generator pixel (area == 1);
    /// those are effectively unbinned for downstream consumers. A generator
    /// stranded by the fresh classification pass (area == 0) is flagged the
    /// same way: it binned nothing at all.
    pub unbinned: Vec<bool>,
    /// Standard deviation of (S/N - target) / target over multi-pixel bins,
    /// in percent.
    pub sn_scatter: f64,
}

/// Recomputes the (weighted) Voronoi tessellation of the pixel grid so that
/// the classification matches the proper generator indices, then evaluates
/// the signal-weighted bin centroids and the final S/N of each bin.
///
/// The fresh classification pass is deliberate: relaxation may have dropped
/// zero-size cells, so the last iteration's assignment cannot be reused.
pub fn compute_bin_quantities(
    field: &PixelField,
    generators: &[Point2<f64>],
    scale: &BinScale,
    target_sn: f64,
) -> BinQuantities {
    let classification = classify_pixels(field, generators, scale);

    let mut cells: Vec<Vec<usize>> = vec![Vec::new(); generators.len()];
    for (pixel, &bin) in classification.iter().enumerate() {
        cells[bin].push(pixel);
    }

    let mut centroids = Vec::with_capacity(generators.len());
    let mut sn = Vec::with_capacity(generators.len());
    let mut area = Vec::with_capacity(generators.len());
    let mut unbinned = Vec::with_capacity(generators.len());
    for (bin, cell) in cells.iter().enumerate() {
        if cell.is_empty() {
            // A generator stranded by the fresh pass keeps its own position
            // and reports an empty bin rather than poisoning the output.
            centroids.push(generators[bin]);
            sn.push(0.0);
            area.push(0);
            unbinned.push(true);
            continue;
        }
        let positions: Vec<Point2<f64>> = cell.iter().map(|&i| field.position(i)).collect();
        let signals: Vec<f64> = cell.iter().map(|&i| field.signal()[i]).collect();
        centroids.push(weighted_centroid(&positions, &signals));
        sn.push(field.subset_sn(cell));
        area.push(cell.len());
        unbinned.push(cell.len() == 1);
    }

    let sn_scatter = fractional_sn_scatter(&sn, &area, target_sn);

    BinQuantities {
        classification,
        centroids,
        sn,
        area,
        unbinned,
        sn_scatter,
    }
}

/// Population standard deviation of the percentage S/N deviation from the
/// target, over bins with more than one pixel.
fn fractional_sn_scatter(sn: &[f64], area: &[usize], target_sn: f64) -> f64 {
    let deviations: Vec<f64> = sn
        .iter()
        .zip(area)
        .filter(|&(_, &a)| a > 1)
        .map(|(&s, _)| (s - target_sn) / target_sn * 100.0)
        .collect();
    if deviations.is_empty() {
        return 0.0;
    }

    let n = deviations.len() as f64;
    let mean = deviations.iter().sum::<f64>() / n;
    let variance = deviations.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;
    variance.sqrt()
}
