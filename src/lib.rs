
//! Decode and encode the terrain layers a virtual world region streams to its viewers.
//!
//! A layer payload carries patches of terrain elevation, water elevation, wind or cloud density.
//! Each patch is a square grid of samples, compressed with a two-dimensional cosine transform,
//! quantization, zig-zag ordering and a variable-length code.
//! Decoded patches are fanned out to any number of subscribers.
//!
//! ```
//! use terrain_codec::prelude::*;
//!
//! let publisher = PatchPublisher::new();
//! let subscription = publisher.subscribe(SubscriptionFilter::all_regions(), QueueCapacity::Unbounded);
//!
//! let patch = TerrainPatch::from_samples(LayerType::Land, 3, 5, vec![20.0; 256]).unwrap();
//! let mut encoder = LayerEncoder::new(LayerType::Land, EncodeOptions::default());
//! encoder.push(&patch).unwrap();
//! let bytes = encoder.finish().unwrap();
//!
//! let summary = LayerIngest::new(&publisher, DecodeOptions::default())
//!     .ingest(RegionHandle(1), b'L', &bytes);
//!
//! assert_eq!(summary.decoded, 1);
//! assert_eq!(subscription.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused_extern_crates,
    missing_debug_implementations,
    missing_docs,
)]


pub mod io;
pub mod math;
pub mod bits;
pub mod layer;
pub mod meta;
pub mod compression;
pub mod patch;
pub mod decode;
pub mod encode;
pub mod delivery;
pub mod ingest;
pub mod error;


/// Re-exports of all the types commonly required to decode, encode and deliver patches.
pub mod prelude {

    // main exports
    pub use crate::decode::{decode_patches, decode_layer_data, DecodeOptions, PatchDecoder};
    pub use crate::encode::{EncodeOptions, LayerEncoder};
    pub use crate::ingest::{IngestSummary, LayerIngest};

    #[cfg(feature = "rayon")]
    pub use crate::ingest::ParallelIngest;

    // core data types
    pub use crate::layer::{LayerType, LayerKind};
    pub use crate::patch::TerrainPatch;
    pub use crate::meta::{GroupHeader, PatchHeader, PatchIds};
    pub use crate::delivery::{
        PatchPublisher, Subscription, SubscriptionFilter, QueueCapacity,
        PatchEvent, PatchReceived, PatchFailed, RegionHandle,
    };

    // secondary data types
    pub use crate::meta;
    pub use crate::error::{self, Error, Result};
    pub use crate::math::Vec2;
}
