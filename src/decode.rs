
//! Decode the patches of a layer payload.
//! Each patch is decoded on demand by iterating the `PatchDecoder`.

use crate::bits::BitReader;
use crate::compression;
use crate::error::{Error, Result};
use crate::layer::LayerType;
use crate::meta::{GroupHeader, PatchHeader};
use crate::patch::TerrainPatch;


/// Controls how strictly layer data is decoded, and whether multiple regions may be decoded in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {

    /// Report an error if the data ends without the end of patches marker,
    /// and reject group headers whose patch size disagrees with the layer type.
    /// Otherwise, such data is accepted.
    pub pedantic: bool,

    /// Decode buffers of different regions on a thread pool,
    /// if the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { pedantic: false, parallel: true }
    }
}

impl DecodeOptions {

    /// Strict decoding.
    pub fn pedantic(self) -> Self { DecodeOptions { pedantic: true, ..self } }

    /// Never use a thread pool.
    pub fn non_parallel(self) -> Self { DecodeOptions { parallel: false, ..self } }
}


/// Decode the patch bit stream of a layer, without a group header.
/// The layer type code is classified leniently: unknown codes are decoded as land.
pub fn decode_patches(layer_type_code: u8, bit_stream: &[u8], options: DecodeOptions) -> PatchDecoder<'_> {
    PatchDecoder::new(LayerType::classify(layer_type_code), bit_stream, options)
}

/// Decode a complete layer payload, starting with its group header.
pub fn decode_layer_data(payload: &[u8], options: DecodeOptions) -> Result<PatchDecoder<'_>> {
    let mut read = payload;
    let group = GroupHeader::read(&mut read)?;

    if options.pedantic {
        group.validate()?;
    }

    Ok(PatchDecoder::new(group.layer_type, &payload[GroupHeader::BYTE_SIZE ..], options))
}


/// Iterates over the patches of a bit stream, decoding each when requested.
/// A patch that fails to decode is returned as an error.
/// Decoding continues after it if the bit stream is still aligned to the next patch.
/// Iteration ends at the end of patches marker.
#[derive(Debug, Clone)]
pub struct PatchDecoder<'b> {
    read: BitReader<'b>,
    layer_type: LayerType,
    pedantic: bool,
    finished: bool,
    patch_index: usize,
}

impl<'b> PatchDecoder<'b> {

    /// Start decoding at the first bit.
    pub fn new(layer_type: LayerType, bit_stream: &'b [u8], options: DecodeOptions) -> Self {
        PatchDecoder {
            read: BitReader::new(bit_stream),
            layer_type,
            pedantic: options.pedantic,
            finished: false,
            patch_index: 0,
        }
    }

    /// The layer type that determines the patch size.
    pub fn layer_type(&self) -> LayerType { self.layer_type }

    /// Number of patches attempted so far, including failed ones.
    pub fn patch_index(&self) -> usize { self.patch_index }

    /// Decode the next patch, or return `None` after the last one.
    pub fn decode_next_patch(&mut self) -> Option<Result<TerrainPatch>> {
        if self.finished {
            return None;
        }

        if self.read.remaining_bits() == 0 || self.read.only_padding_left() {
            self.finished = true;

            if self.pedantic {
                return Some(Err(Error::invalid("layer data ends without end of patches marker")));
            }

            log::debug!("{} layer data ended without end of patches marker", self.layer_type);
            return None;
        }

        let header = match PatchHeader::read(&mut self.read) {
            Ok(Some(header)) => header,

            Ok(None) => {
                log::debug!("end of {} patches after {} patches", self.layer_type, self.patch_index);
                self.finished = true;
                return None;
            },

            Err(error) => {
                self.finished = true;
                return Some(Err(error));
            },
        };

        self.patch_index += 1;

        let result = compression::decompress(&header, &mut self.read, self.layer_type)
            .and_then(|samples| TerrainPatch::new(self.layer_type, header.patch_ids(), samples));

        match &result {
            Ok(patch) => log::trace!("decoded {} patch ({}, {})", self.layer_type, patch.x(), patch.y()),
            Err(error) if !error.is_recoverable() => self.finished = true,
            Err(_) => {},
        }

        Some(result)
    }

    /// Decode all remaining patches, aborting at the first error.
    pub fn decode_all(self) -> Result<Vec<TerrainPatch>> {
        self.collect()
    }
}

impl Iterator for PatchDecoder<'_> {
    type Item = Result<TerrainPatch>;
    fn next(&mut self) -> Option<Self::Item> { self.decode_next_patch() }
}
