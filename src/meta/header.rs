//! The header in front of each compressed patch.
//! Describes how to dequantize the coefficients and where the patch lies within its region.

use bit_field::BitField;
use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result, UnitResult, u32_to_u16, u32_to_u8};
use crate::math::Vec2;


/// Number of bits of each coordinate inside the packed patch ids.
pub const PATCH_COORDINATE_BITS: usize = 5;

/// The largest patch coordinate that can be transmitted.
pub const MAX_PATCH_COORDINATE: u8 = (1 << PATCH_COORDINATE_BITS) - 1;

/// Number of bits used for the coefficient magnitude width.
pub const WORD_BITS_FIELD_BITS: u32 = 5;

/// The largest coefficient magnitude width that can be transmitted.
pub const MAX_WORD_BITS: u8 = (1 << WORD_BITS_FIELD_BITS) - 1;


/// The quantization byte that ends the list of patches in a layer.
pub mod end_of_patches {
    use super::*;

    /// Stored in place of `quant_w_bits` after the last patch.
    pub const VALUE: u8 = 97;

    /// Without validation, write the end marker to the bit stream.
    pub fn write(write: &mut BitWriter) -> UnitResult {
        write.write_bits(VALUE as u32, 8)
    }
}


/// The position of a patch inside the patch grid of its region,
/// packed into ten bits: five bits x, followed by five bits y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PatchIds(u16);

impl PatchIds {

    /// Pack the coordinates. Returns an error if a coordinate exceeds 31.
    pub fn new(x: u8, y: u8) -> Result<Self> {
        if x > MAX_PATCH_COORDINATE || y > MAX_PATCH_COORDINATE {
            return Err(Error::invalid("patch coordinate exceeds 31"));
        }

        let mut packed = 0_u16;
        packed.set_bits(PATCH_COORDINATE_BITS .. 2 * PATCH_COORDINATE_BITS, x as u16);
        packed.set_bits(0 .. PATCH_COORDINATE_BITS, y as u16);
        Ok(PatchIds(packed))
    }

    /// Interpret the lowest ten bits as packed coordinates. Higher bits are ignored.
    pub fn from_packed(packed: u16) -> Self {
        PatchIds(packed.get_bits(0 .. 2 * PATCH_COORDINATE_BITS))
    }

    /// The ten bit wire representation.
    pub fn packed(self) -> u16 { self.0 }

    /// Column of the patch, `0 ..= 31`.
    pub fn x(self) -> u8 {
        self.0.get_bits(PATCH_COORDINATE_BITS .. 2 * PATCH_COORDINATE_BITS) as u8
    }

    /// Row of the patch, `0 ..= 31`.
    pub fn y(self) -> u8 {
        self.0.get_bits(0 .. PATCH_COORDINATE_BITS) as u8
    }

    /// Both coordinates.
    pub fn position(self) -> Vec2<u8> {
        Vec2(self.x(), self.y())
    }
}


/// Quantization and placement of one compressed patch.
/// Constructed with all fields at once, so no field can be forgotten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchHeader {
    quant_w_bits: u8,
    dc_offset: f32,
    range: u16,
    patch_ids: PatchIds,
    word_bits: u8,
}

impl PatchHeader {

    /// Create a header. Fails if a value cannot be represented on the wire:
    /// `quant_w_bits` must not be the end marker,
    /// `range` must be at least one, and `word_bits` must fit into five bits.
    pub fn new(quant_w_bits: u8, dc_offset: f32, range: u16, patch_ids: PatchIds, word_bits: u8) -> Result<Self> {
        let header = PatchHeader { quant_w_bits, dc_offset, range, patch_ids, word_bits };
        header.validate()?;
        Ok(header)
    }

    /// Start building a header for the patch at the specified coordinates.
    pub fn builder(x: u8, y: u8) -> Result<PatchHeaderBuilder> {
        Ok(PatchHeaderBuilder {
            patch_ids: PatchIds::new(x, y)?,
            .. PatchHeaderBuilder::default()
        })
    }

    /// Check the invariants of the wire format.
    pub fn validate(&self) -> UnitResult {
        if self.quant_w_bits == end_of_patches::VALUE {
            return Err(Error::invalid("quantization bits collide with end of patches marker"));
        }

        if self.range == 0 {
            return Err(Error::invalid("patch range must be at least one"));
        }

        if self.word_bits > MAX_WORD_BITS {
            return Err(Error::invalid("coefficient word bits exceed 31"));
        }

        Ok(())
    }

    /// Number of bits the quantization step was derived from.
    pub fn quant_w_bits(&self) -> u8 { self.quant_w_bits }

    /// Added to every reconstructed sample.
    pub fn dc_offset(&self) -> f32 { self.dc_offset }

    /// Scale of the dequantized coefficients.
    pub fn range(&self) -> u16 { self.range }

    /// Packed patch coordinates.
    pub fn patch_ids(&self) -> PatchIds { self.patch_ids }

    /// Column of the patch.
    pub fn x(&self) -> u8 { self.patch_ids.x() }

    /// Row of the patch.
    pub fn y(&self) -> u8 { self.patch_ids.y() }

    /// Number of magnitude bits of each non-zero coefficient.
    pub fn word_bits(&self) -> u8 { self.word_bits }

    /// The factor that converts a quantized coefficient back to its value:
    /// `range / 2^quant_w_bits`.
    pub fn dequantization_factor(&self) -> f32 {
        (self.range as f64 / 2_f64.powi(self.quant_w_bits as i32)) as f32
    }

    /// Read the next header.
    /// Returns `None` if the end of patches marker is found in place of a header,
    /// without consuming anything after the marker.
    ///
    /// The decoded header is not validated,
    /// because the coefficients must still be skipped even if the header is invalid.
    pub fn read(read: &mut BitReader<'_>) -> Result<Option<Self>> {
        let quant_w_bits = u32_to_u8(read.read_bits(8)?, "quantization bits")?;
        if quant_w_bits == end_of_patches::VALUE {
            return Ok(None);
        }

        let dc_offset = read.read_f32()?;
        let range = u32_to_u16(read.read_bits(16)?, "patch range")?;
        let patch_ids = PatchIds::from_packed(u32_to_u16(read.read_bits(10)?, "patch ids")?);
        let word_bits = u32_to_u8(read.read_bits(WORD_BITS_FIELD_BITS)?, "word bits")?;

        Ok(Some(PatchHeader { quant_w_bits, dc_offset, range, patch_ids, word_bits }))
    }

    /// Write this header to the bit stream. Validates the header first.
    pub fn write(&self, write: &mut BitWriter) -> UnitResult {
        self.validate()?;

        write.write_bits(self.quant_w_bits as u32, 8)?;
        write.write_f32(self.dc_offset)?;
        write.write_bits(self.range as u32, 16)?;
        write.write_bits(self.patch_ids.packed() as u32, 10)?;
        write.write_bits(self.word_bits as u32, WORD_BITS_FIELD_BITS)?;
        Ok(())
    }
}


/// Collects header fields before creating a `PatchHeader`.
/// Starts with a quantization of 8 bits, no offset, a range of one, and zero word bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchHeaderBuilder {
    quant_w_bits: u8,
    dc_offset: f32,
    range: u16,
    patch_ids: PatchIds,
    word_bits: u8,
}

impl Default for PatchHeaderBuilder {
    fn default() -> Self {
        PatchHeaderBuilder {
            quant_w_bits: 8,
            dc_offset: 0.0,
            range: 1,
            patch_ids: PatchIds::default(),
            word_bits: 0,
        }
    }
}

impl PatchHeaderBuilder {

    /// Set the quantization bits.
    pub fn with_quant_w_bits(self, quant_w_bits: u8) -> Self { Self { quant_w_bits, ..self } }

    /// Set the value added to all samples.
    pub fn with_dc_offset(self, dc_offset: f32) -> Self { Self { dc_offset, ..self } }

    /// Set the range.
    pub fn with_range(self, range: u16) -> Self { Self { range, ..self } }

    /// Set the coefficient word bits.
    pub fn with_word_bits(self, word_bits: u8) -> Self { Self { word_bits, ..self } }

    /// Validate and create the header.
    pub fn build(self) -> Result<PatchHeader> {
        PatchHeader::new(self.quant_w_bits, self.dc_offset, self.range, self.patch_ids, self.word_bits)
    }
}
