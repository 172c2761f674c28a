
//! Describes the layout of a layer payload.
//! A payload starts with a byte-aligned group header,
//! followed by a bit stream of patch headers and coefficients.

pub mod header;

use crate::io::*;
use crate::error::{Error, Result, UnitResult};
use crate::layer::LayerType;

pub use self::header::{PatchHeader, PatchHeaderBuilder, PatchIds, end_of_patches};


/// The byte-aligned prefix of a complete layer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupHeader {

    /// Number of samples in one row of the layer in the region.
    /// Informational, decoding does not depend on it.
    pub stride: u16,

    /// Number of samples along one patch edge, as claimed by the sender.
    pub patch_size: u8,

    /// The layer type code. Unknown codes are classified as land.
    pub layer_type: LayerType,
}

impl GroupHeader {

    /// Number of bytes the group header occupies.
    pub const BYTE_SIZE: usize = u16::BYTE_SIZE + 2 * u8::BYTE_SIZE;

    /// Create a group header that agrees with the specified layer type.
    pub fn for_layer(layer_type: LayerType, stride: u16) -> Self {
        GroupHeader { stride, patch_size: layer_type.patch_size() as u8, layer_type }
    }

    /// Read the group header from the start of a payload.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        let stride = u16::read(read)?;
        let patch_size = u8::read(read)?;
        let layer_type = LayerType::classify(u8::read(read)?);
        Ok(GroupHeader { stride, patch_size, layer_type })
    }

    /// Without validation, write this instance to the byte stream.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        self.stride.write(write)?;
        self.patch_size.write(write)?;
        self.layer_type.value().write(write)
    }

    /// Check that the claimed patch size matches the layer type.
    pub fn validate(&self) -> UnitResult {
        if self.patch_size as usize != self.layer_type.patch_size() {
            return Err(Error::invalid(format!(
                "group header claims patch size {} for {} layer",
                self.patch_size, self.layer_type
            )));
        }

        Ok(())
    }
}
