
//! The kinds of layer a region streams, and their wire codes.

use std::fmt;


/// Which physical quantity a patch encodes, and at which resolution.
/// Extended layers are used by regions larger than the default size
/// and carry patches of 32 by 32 samples instead of 16 by 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {

    /// Terrain elevation in meters.
    Land,

    /// Terrain elevation of a large region.
    LandExtended,

    /// Water elevation.
    Water,

    /// Water elevation of a large region.
    WaterExtended,

    /// One component of the wind vector.
    Wind,

    /// One component of the wind vector of a large region.
    WindExtended,

    /// Cloud density.
    Cloud,

    /// Cloud density of a large region.
    CloudExtended,
}

/// The physical quantity of a layer, ignoring its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum LayerKind { Land, Water, Wind, Cloud }


/// Number of samples along one edge of a standard patch.
pub const STANDARD_PATCH_SIZE: usize = 16;

/// Number of samples along one edge of an extended patch.
pub const EXTENDED_PATCH_SIZE: usize = 32;


impl LayerType {

    /// All layer types, each standard variant followed by its extended variant.
    pub const ALL: [LayerType; 8] = [
        LayerType::Land, LayerType::LandExtended,
        LayerType::Water, LayerType::WaterExtended,
        LayerType::Wind, LayerType::WindExtended,
        LayerType::Cloud, LayerType::CloudExtended,
    ];

    /// Classify a wire byte. Never fails:
    /// unrecognized codes are treated as land.
    pub fn classify(code: u8) -> Self {
        match code {
            b'L' => LayerType::Land,
            b'M' => LayerType::LandExtended,
            b'W' => LayerType::Water,
            b'X' => LayerType::WaterExtended,
            b'7' => LayerType::Wind,
            b'9' => LayerType::WindExtended,
            b'8' => LayerType::Cloud,
            b':' => LayerType::CloudExtended,
            _ => LayerType::Land,
        }
    }

    /// The wire byte of this layer type.
    pub fn value(self) -> u8 {
        match self {
            LayerType::Land => b'L',
            LayerType::LandExtended => b'M',
            LayerType::Water => b'W',
            LayerType::WaterExtended => b'X',
            LayerType::Wind => b'7',
            LayerType::WindExtended => b'9',
            LayerType::Cloud => b'8',
            LayerType::CloudExtended => b':',
        }
    }

    /// Whether the patches of this layer are 32 samples wide.
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            LayerType::LandExtended | LayerType::WaterExtended
            | LayerType::WindExtended | LayerType::CloudExtended
        )
    }

    /// Number of samples along one edge of a patch of this layer.
    pub fn patch_size(self) -> usize {
        if self.is_extended() { EXTENDED_PATCH_SIZE } else { STANDARD_PATCH_SIZE }
    }

    /// Number of samples in a patch of this layer.
    pub fn sample_count(self) -> usize {
        self.patch_size() * self.patch_size()
    }

    /// The physical quantity, without resolution.
    pub fn kind(self) -> LayerKind {
        match self {
            LayerType::Land | LayerType::LandExtended => LayerKind::Land,
            LayerType::Water | LayerType::WaterExtended => LayerKind::Water,
            LayerType::Wind | LayerType::WindExtended => LayerKind::Wind,
            LayerType::Cloud | LayerType::CloudExtended => LayerKind::Cloud,
        }
    }
}

impl Default for LayerType {
    fn default() -> Self { LayerType::Land }
}

impl From<u8> for LayerType {
    fn from(code: u8) -> Self { LayerType::classify(code) }
}

impl From<LayerType> for u8 {
    fn from(layer: LayerType) -> Self { layer.value() }
}

impl fmt::Display for LayerType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerType::Land => "land",
            LayerType::LandExtended => "extended land",
            LayerType::Water => "water",
            LayerType::WaterExtended => "extended water",
            LayerType::Wind => "wind",
            LayerType::WindExtended => "extended wind",
            LayerType::Cloud => "cloud",
            LayerType::CloudExtended => "extended cloud",
        };

        formatter.write_str(name)
    }
}
