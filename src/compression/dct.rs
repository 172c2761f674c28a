//! Separable two-dimensional discrete cosine transform for square patches.
//!
//! Uses the orthonormal DCT-II for compression and its inverse, the DCT-III,
//! for decompression. A constant patch of value `v` therefore has the
//! single coefficient `v * size` at index zero.

use rustdct::{DctPlanner, Dct2, Dct3};
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, OnceLock};
use crate::error::{Error, Result};
use crate::layer::{STANDARD_PATCH_SIZE, EXTENDED_PATCH_SIZE};

/// Row buffer large enough for the extended patch size without allocating.
type Line = SmallVec<[f32; EXTENDED_PATCH_SIZE]>;


/// Planned one-dimensional transforms for one patch size.
#[derive(Clone)]
pub struct CosineTransform {
    size: usize,
    forward: Arc<dyn Dct2<f32>>,
    inverse: Arc<dyn Dct3<f32>>,

    /// Converts rustdct's unscaled output into the orthonormal transform.
    dc_scale: f32,
    ac_scale: f32,
}

impl fmt::Debug for CosineTransform {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("CosineTransform").field("size", &self.size).finish()
    }
}

impl CosineTransform {

    /// Plan the transforms for the specified size.
    pub fn new(size: usize) -> Self {
        let mut planner = DctPlanner::new();

        CosineTransform {
            size,
            forward: planner.plan_dct2(size),
            inverse: planner.plan_dct3(size),
            dc_scale: (1.0 / size as f64).sqrt() as f32,
            ac_scale: (2.0 / size as f64).sqrt() as f32,
        }
    }

    /// The cached transform for the standard or extended patch size.
    pub fn for_size(size: usize) -> Result<&'static Self> {
        static STANDARD: OnceLock<CosineTransform> = OnceLock::new();
        static EXTENDED: OnceLock<CosineTransform> = OnceLock::new();

        match size {
            STANDARD_PATCH_SIZE => Ok(STANDARD.get_or_init(|| CosineTransform::new(STANDARD_PATCH_SIZE))),
            EXTENDED_PATCH_SIZE => Ok(EXTENDED.get_or_init(|| CosineTransform::new(EXTENDED_PATCH_SIZE))),
            _ => Err(Error::unsupported(format!("patch size {}", size))),
        }
    }

    /// Number of samples along one edge.
    pub fn size(&self) -> usize { self.size }

    /// One dimensional orthonormal DCT-III, from frequencies to positions, in place.
    fn inverse_line(&self, line: &mut [f32]) {
        // rustdct halves the first coefficient
        line[0] *= 2.0 * self.dc_scale;
        for value in &mut line[1 ..] { *value *= self.ac_scale; }

        self.inverse.process_dct3(line);
    }

    /// One dimensional orthonormal DCT-II, from positions to frequencies, in place.
    fn forward_line(&self, line: &mut [f32]) {
        self.forward.process_dct2(line);

        line[0] *= self.dc_scale;
        for value in &mut line[1 ..] { *value *= self.ac_scale; }
    }

    /// Perform the inverse transform on a square block of coefficients.
    /// The coefficients are in row-major order, not in zig-zag order.
    /// First pass on rows, then on columns.
    pub fn inverse(&self, coefficients: &[f32]) -> Vec<f32> {
        self.two_pass(coefficients, CosineTransform::inverse_line)
    }

    /// Perform the forward transform on a square block of samples.
    /// Returns the coefficients in row-major order.
    pub fn forward(&self, samples: &[f32]) -> Vec<f32> {
        self.two_pass(samples, CosineTransform::forward_line)
    }

    fn two_pass(&self, input: &[f32], transform_line: fn(&Self, &mut [f32])) -> Vec<f32> {
        let size = self.size;
        debug_assert_eq!(input.len(), size * size, "block size mismatch");

        let mut transposed = vec![0.0_f32; size * size];

        // first pass: transform rows, store them as columns
        for row in 0 .. size {
            let row_values = &input[row * size .. (row + 1) * size];

            // the transform of a zero row is zero
            if row_values.iter().all(|&value| value == 0.0) {
                continue;
            }

            let mut line: Line = row_values.iter().copied().collect();
            transform_line(self, &mut line);

            for column in 0 .. size {
                transposed[column * size + row] = line[column];
            }
        }

        // second pass: transform columns, which are rows in the transposed block
        let mut result = vec![0.0_f32; size * size];
        for column in 0 .. size {
            let mut line: Line = transposed[column * size .. (column + 1) * size].iter().copied().collect();
            transform_line(self, &mut line);

            for row in 0 .. size {
                result[row * size + column] = line[row];
            }
        }

        result
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dc_only_block() {
        let transform = CosineTransform::for_size(16).unwrap();

        let mut coefficients = vec![0.0_f32; 256];
        coefficients[0] = 16.0 * 42.0;

        for value in transform.inverse(&coefficients) {
            assert!((value - 42.0).abs() < 1e-3, "expected 42, got {}", value);
        }
    }

    #[test]
    fn constant_block_has_single_coefficient() {
        let transform = CosineTransform::for_size(32).unwrap();
        let coefficients = transform.forward(&vec![3.0; 32 * 32]);

        assert!((coefficients[0] - 96.0).abs() < 1e-2);
        assert!(coefficients[1 ..].iter().all(|value| value.abs() < 1e-3));
    }

    #[test]
    fn round_trip() {
        for &size in [16_usize, 32].iter() {
            let transform = CosineTransform::for_size(size).unwrap();
            let samples: Vec<f32> = (0 .. size * size).map(|index| (index as f32 * 0.37).sin() * 10.0).collect();

            let recovered = transform.inverse(&transform.forward(&samples));

            for (index, (expected, actual)) in samples.iter().zip(&recovered).enumerate() {
                assert!((expected - actual).abs() < 1e-3, "size {} index {}: {} -> {}", size, index, expected, actual);
            }
        }
    }

    #[test]
    fn orthonormal_basis() {
        // a single unit coefficient has unit energy in the sample domain
        let transform = CosineTransform::for_size(16).unwrap();

        for &index in [0_usize, 1, 17, 255].iter() {
            let mut coefficients = vec![0.0_f32; 256];
            coefficients[index] = 1.0;

            let energy: f32 = transform.inverse(&coefficients).iter().map(|value| value * value).sum();
            assert!((energy - 1.0).abs() < 1e-4, "index {}: energy {}", index, energy);
        }
    }

    #[test]
    fn horizontal_frequency_varies_along_rows() {
        let transform = CosineTransform::for_size(16).unwrap();

        let mut coefficients = vec![0.0_f32; 256];
        coefficients[1] = 10.0; // first horizontal frequency

        let samples = transform.inverse(&coefficients);
        let first_row = &samples[.. 16];

        assert!(first_row[0] > 0.0 && first_row[15] < 0.0);
        assert!(samples.chunks(16).all(|row| row == first_row), "columns must be constant");
    }

    #[test]
    fn cached_transforms() {
        assert!(std::ptr::eq(CosineTransform::for_size(16).unwrap(), CosineTransform::for_size(16).unwrap()));
        assert!(CosineTransform::for_size(8).is_err());
        assert_eq!(CosineTransform::new(8).size(), 8);
    }
}
