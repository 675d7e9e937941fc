// src/field.rs
use crate::error::{BinningError, BinningResult};
use nalgebra::{Point2, distance_squared};
use rayon::prelude::*;

/// Input container for one binning run: pixel positions, signal and noise.
///
/// Construction validates the shape of the input vectors and rejects
/// negative noise. Zero-noise pixels (as can happen with X-ray data, where
/// signal = 0 implies noise = sqrt(signal) = 0) are recovered by
/// [`PixelField::sanitize_noise`] before any S/N is evaluated.
#[derive(Debug, Clone)]
pub struct PixelField {
    x: Vec<f64>,
    y: Vec<f64>,
    signal: Vec<f64>,
    noise: Vec<f64>,
}

impl PixelField {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        signal: Vec<f64>,
        noise: Vec<f64>,
    ) -> BinningResult<Self> {
        let n = x.len();
        if n == 0 {
            return Err(BinningError::InsufficientPoints {
                expected: 1,
                actual: 0,
            });
        }
        for (field, len) in [("y", y.len()), ("signal", signal.len()), ("noise", noise.len())] {
            if len != n {
                return Err(BinningError::ShapeMismatch {
                    field,
                    expected: n,
                    actual: len,
                });
            }
        }
        if let Some((index, &value)) = noise.iter().enumerate().find(|&(_, &v)| v < 0.0) {
            return Err(BinningError::NegativeNoise { index, value });
        }

        Ok(Self { x, y, signal, noise })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn position(&self, index: usize) -> Point2<f64> {
        Point2::new(self.x[index], self.y[index])
    }

    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    pub fn noise(&self) -> &[f64] {
        &self.noise
    }

    /// S/N of a single pixel.
    pub fn pixel_sn(&self, index: usize) -> f64 {
        self.signal[index] / self.noise[index]
    }

    /// S/N of a pixel subset: sum(signal) / sqrt(sum(noise^2)).
    pub fn subset_sn(&self, indices: &[usize]) -> f64 {
        let signal: f64 = indices.iter().map(|&i| self.signal[i]).sum();
        let noise_sq: f64 = indices.iter().map(|&i| self.noise[i] * self.noise[i]).sum();
        signal / noise_sq.sqrt()
    }

    /// S/N of the whole field pooled into a single bin.
    pub fn aggregate_sn(&self) -> f64 {
        let signal: f64 = self.signal.iter().sum();
        let noise_sq: f64 = self.noise.iter().map(|&v| v * v).sum();
        signal / noise_sq.sqrt()
    }

    /// Smallest single-pixel S/N in the field.
    pub fn min_pixel_sn(&self) -> f64 {
        (0..self.len())
            .map(|i| self.pixel_sn(i))
            .fold(f64::INFINITY, f64::min)
    }

    /// Replaces zero noise with the smallest positive noise value times 1e-9,
    /// preventing division by zero while preserving the near-zero-noise
    /// priority of those pixels. Fails only when no positive noise exists.
    pub(crate) fn sanitize_noise(&mut self) -> BinningResult<()> {
        if !self.noise.contains(&0.0) {
            return Ok(());
        }

        let min_positive = self
            .noise
            .iter()
            .copied()
            .filter(|&v| v > 0.0)
            .fold(f64::INFINITY, f64::min);
        if !min_positive.is_finite() {
            return Err(BinningError::NoPositiveNoise);
        }

        let epsilon = min_positive * 1e-9;
        for value in &mut self.noise {
            if *value == 0.0 {
                *value = epsilon;
            }
        }
        Ok(())
    }

    /// Pixel scale of unbinned data: the exact minimum pairwise distance.
    ///
    /// Robust but O(n^2); the scan is parallelized over the outer index and
    /// still returns the exact minimum, not an approximation.
    pub fn estimate_pixel_size(&self) -> BinningResult<f64> {
        let n = self.len();
        if n < 2 {
            return Err(BinningError::InsufficientPoints {
                expected: 2,
                actual: n,
            });
        }

        let min_sq = (0..n - 1)
            .into_par_iter()
            .map(|j| {
                let pj = self.position(j);
                (j + 1..n)
                    .map(|k| distance_squared(&pj, &self.position(k)))
                    .fold(f64::INFINITY, f64::min)
            })
            .reduce(|| f64::INFINITY, f64::min);

        Ok(min_sq.sqrt())
    }
}
