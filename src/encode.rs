
//! Compress sample grids into layer data, for example to re-send a modified region.

use crate::bits::BitWriter;
use crate::compression;
use crate::error::{Error, Result, UnitResult};
use crate::layer::LayerType;
use crate::meta::{GroupHeader, PatchHeader, PatchIds, end_of_patches};
use crate::patch::TerrainPatch;


/// Controls the precision of the written patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {

    /// The quantization step of a patch is `range / 2^quant_w_bits`.
    /// More bits produce more precise and larger patches. At most 24.
    pub quant_w_bits: u8,

    /// Written to the group header. Does not affect the patches.
    pub stride: u16,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { quant_w_bits: 8, stride: 256 }
    }
}

impl EncodeOptions {

    /// Use the specified quantization bit count.
    pub fn with_quant_w_bits(self, quant_w_bits: u8) -> Self { EncodeOptions { quant_w_bits, ..self } }

    /// Write the specified stride to the group header.
    pub fn with_stride(self, stride: u16) -> Self { EncodeOptions { stride, ..self } }
}


/// Collects compressed patches of a single layer.
#[derive(Debug, Clone)]
pub struct LayerEncoder {
    layer_type: LayerType,
    options: EncodeOptions,
    write: BitWriter,
    patch_count: usize,
}

impl LayerEncoder {

    /// Start an empty layer.
    pub fn new(layer_type: LayerType, options: EncodeOptions) -> Self {
        let byte_estimate = layer_type.sample_count() * 4;
        LayerEncoder { layer_type, options, write: BitWriter::with_capacity(byte_estimate), patch_count: 0 }
    }

    /// The layer being written.
    pub fn layer_type(&self) -> LayerType { self.layer_type }

    /// Number of patches written so far.
    pub fn patch_count(&self) -> usize { self.patch_count }

    /// Compress a decoded or modified patch.
    /// The patch must belong to the same layer type.
    pub fn push(&mut self, patch: &TerrainPatch) -> Result<PatchHeader> {
        if patch.layer_type() != self.layer_type {
            return Err(Error::invalid(format!(
                "cannot write {} patch into {} layer",
                patch.layer_type(), self.layer_type
            )));
        }

        self.push_samples(patch.patch_ids(), patch.samples())
    }

    /// Compress row-major samples for the patch at the specified coordinates.
    /// Nothing is written if the samples are rejected.
    pub fn push_samples(&mut self, patch_ids: PatchIds, samples: &[f32]) -> Result<PatchHeader> {
        let header = compression::compress(&mut self.write, self.layer_type, patch_ids, samples, self.options.quant_w_bits)?;
        self.patch_count += 1;
        Ok(header)
    }

    /// Write a patch where every sample has the same value.
    pub fn push_flat(&mut self, patch_ids: PatchIds, value: f32) -> UnitResult {
        compression::compress_flat(&mut self.write, patch_ids, value, self.options.quant_w_bits)?;
        self.patch_count += 1;
        Ok(())
    }

    /// Append the end of patches marker and return the bit stream, without group header.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        end_of_patches::write(&mut self.write)?;
        Ok(self.write.into_bytes())
    }

    /// Append the end of patches marker and return a complete layer payload.
    pub fn finish_with_group_header(self) -> Result<Vec<u8>> {
        let group = GroupHeader::for_layer(self.layer_type, self.options.stride);

        let mut payload = Vec::with_capacity(GroupHeader::BYTE_SIZE + self.write.as_bytes().len() + 1);
        group.write(&mut payload)?;
        payload.extend(self.finish()?);
        Ok(payload)
    }
}
