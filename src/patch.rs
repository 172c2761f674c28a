
//! The result of decoding one patch.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::layer::LayerType;
use crate::math::Vec2;
use crate::meta::header::PatchIds;


/// A decoded square of samples, located in the patch grid of its region.
/// The samples are immutable and can be shared without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainPatch {
    layer_type: LayerType,
    patch_ids: PatchIds,
    samples: Arc<[f32]>,
}

impl TerrainPatch {

    /// Wrap row-major samples. The sample count must match the layer type.
    pub fn new(layer_type: LayerType, patch_ids: PatchIds, samples: Vec<f32>) -> Result<Self> {
        if samples.len() != layer_type.sample_count() {
            return Err(Error::invalid(format!(
                "{} layer patch requires {} samples, not {}",
                layer_type, layer_type.sample_count(), samples.len()
            )));
        }

        Ok(TerrainPatch { layer_type, patch_ids, samples: samples.into() })
    }

    /// Wrap row-major samples for the patch at the specified coordinates.
    pub fn from_samples(layer_type: LayerType, x: u8, y: u8, samples: Vec<f32>) -> Result<Self> {
        Self::new(layer_type, PatchIds::new(x, y)?, samples)
    }

    /// The layer this patch belongs to.
    pub fn layer_type(&self) -> LayerType { self.layer_type }

    /// The packed coordinates.
    pub fn patch_ids(&self) -> PatchIds { self.patch_ids }

    /// Column in the patch grid.
    pub fn x(&self) -> u8 { self.patch_ids.x() }

    /// Row in the patch grid.
    pub fn y(&self) -> u8 { self.patch_ids.y() }

    /// Column and row in the patch grid.
    pub fn position(&self) -> Vec2<u8> { self.patch_ids.position() }

    /// Number of samples along one edge.
    pub fn size(&self) -> usize { self.layer_type.patch_size() }

    /// Position of the first sample of this patch within the sample grid of the region.
    pub fn region_offset(&self) -> Vec2<usize> {
        let size = self.size();
        self.position().map(usize::from) * Vec2(size, size)
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> &[f32] { &self.samples }

    /// A shared handle to the samples, which can outlive this patch.
    pub fn shared_samples(&self) -> Arc<[f32]> { Arc::clone(&self.samples) }

    /// The sample at the specified column and row within the patch.
    pub fn sample(&self, x: usize, y: usize) -> Option<f32> {
        let size = self.size();
        if x < size && y < size { Some(self.samples[y * size + x]) } else { None }
    }

    /// Iterate over the rows of samples.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.samples.chunks_exact(self.size())
    }

    /// The smallest and the largest sample.
    pub fn min_max(&self) -> (f32, f32) {
        self.samples.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &sample| (min.min(sample), max.max(sample))
        )
    }
}
