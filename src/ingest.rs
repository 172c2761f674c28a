
//! Decode layer buffers of regions and publish every patch.
//! Buffers of different regions can be decoded in parallel,
//! while the patches of one buffer are always published in buffer order.

use std::ops::AddAssign;
#[cfg(feature = "rayon")]
use std::sync::Arc;
use crate::decode::{DecodeOptions, PatchDecoder, decode_patches, decode_layer_data};
use crate::delivery::{PatchPublisher, RegionHandle};
use crate::error::Result;
#[cfg(feature = "rayon")]
use crate::layer::LayerType;


/// Counts the outcomes of ingesting buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {

    /// Number of patches published as received.
    pub decoded: usize,

    /// Number of patches published as failed.
    pub failed: usize,
}

impl AddAssign for IngestSummary {
    fn add_assign(&mut self, other: Self) {
        self.decoded += other.decoded;
        self.failed += other.failed;
    }
}


/// Decodes buffers on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct LayerIngest<'p> {
    publisher: &'p PatchPublisher,
    options: DecodeOptions,
}

impl<'p> LayerIngest<'p> {

    /// Publish to the specified publisher.
    pub fn new(publisher: &'p PatchPublisher, options: DecodeOptions) -> Self {
        LayerIngest { publisher, options }
    }

    /// Decode a patch bit stream without group header and publish each patch.
    pub fn ingest(&self, region: RegionHandle, layer_type_code: u8, bit_stream: &[u8]) -> IngestSummary {
        publish_all(self.publisher, region, decode_patches(layer_type_code, bit_stream, self.options))
    }

    /// Decode a layer payload including its group header and publish each patch.
    /// Fails without publishing anything if the group header cannot be read.
    pub fn ingest_layer_data(&self, region: RegionHandle, payload: &[u8]) -> Result<IngestSummary> {
        let decoder = decode_layer_data(payload, self.options)?;
        Ok(publish_all(self.publisher, region, decoder))
    }
}

fn publish_all(publisher: &PatchPublisher, region: RegionHandle, mut decoder: PatchDecoder<'_>) -> IngestSummary {
    let mut summary = IngestSummary::default();
    let layer_type = decoder.layer_type();

    loop {
        let patch_index = decoder.patch_index();

        match decoder.next() {
            None => break,

            Some(Ok(patch)) => {
                publisher.publish_patch(region, patch);
                summary.decoded += 1;
            },

            Some(Err(error)) => {
                log::warn!("dropping {} patch #{} of {}: {}", layer_type, patch_index, region, error);
                publisher.publish_failure(region, layer_type, patch_index, error);
                summary.failed += 1;
            },
        }
    }

    summary
}


#[cfg(feature = "rayon")]
#[derive(Debug)]
enum Buffer {
    Patches { layer_type_code: u8, bit_stream: Vec<u8> },
    LayerData { payload: Vec<u8> },
}

#[cfg(feature = "rayon")]
fn ingest_buffer(publisher: &PatchPublisher, region: RegionHandle, buffer: &Buffer, options: DecodeOptions) -> IngestSummary {
    let ingest = LayerIngest::new(publisher, options);

    match buffer {
        Buffer::Patches { layer_type_code, bit_stream } => ingest.ingest(region, *layer_type_code, bit_stream),

        Buffer::LayerData { payload } => ingest.ingest_layer_data(region, payload)
            .unwrap_or_else(|error| {
                log::warn!("dropping layer data of {}: {}", region, error);
                publisher.publish_failure(region, LayerType::default(), 0, error);
                IngestSummary { decoded: 0, failed: 1 }
            }),
    }
}


/// Decodes the buffers of many regions on a thread pool.
/// Falls back to decoding on the calling thread
/// if parallel decoding is disabled or no thread pool can be created.
#[cfg(feature = "rayon")]
#[derive(Debug)]
pub struct ParallelIngest {
    publisher: Arc<PatchPublisher>,
    options: DecodeOptions,
    pool: Option<rayon_core::ThreadPool>,

    sender: flume::Sender<IngestSummary>,
    receiver: flume::Receiver<IngestSummary>,
    currently_decoding_count: usize,

    /// Outcomes of buffers decoded without the pool.
    sequential_summary: IngestSummary,
}

#[cfg(feature = "rayon")]
impl ParallelIngest {

    /// Create the thread pool, unless parallel decoding is disabled in the options.
    pub fn new(publisher: Arc<PatchPublisher>, options: DecodeOptions) -> Self {
        let pool = if options.parallel {
            let maybe_pool = rayon_core::ThreadPoolBuilder::new()
                .thread_name(|index| format!("Terrain Layer Decoder Thread #{}", index))
                .build();

            // in case thread pool creation fails (for example on WASM currently),
            // we revert to sequential decoding
            match maybe_pool {
                Ok(pool) => Some(pool),
                Err(error) => {
                    log::warn!("decoding regions sequentially, thread pool unavailable: {}", error);
                    None
                },
            }
        }
        else {
            None
        };

        let (sender, receiver) = flume::unbounded();

        ParallelIngest {
            publisher, options, pool, sender, receiver,
            currently_decoding_count: 0,
            sequential_summary: IngestSummary::default(),
        }
    }

    /// Whether buffers are decoded on a thread pool.
    pub fn is_parallel(&self) -> bool { self.pool.is_some() }

    /// Queue a patch bit stream without group header.
    pub fn submit(&mut self, region: RegionHandle, layer_type_code: u8, bit_stream: Vec<u8>) {
        self.submit_buffer(region, Buffer::Patches { layer_type_code, bit_stream })
    }

    /// Queue a layer payload including its group header.
    pub fn submit_layer_data(&mut self, region: RegionHandle, payload: Vec<u8>) {
        self.submit_buffer(region, Buffer::LayerData { payload })
    }

    fn submit_buffer(&mut self, region: RegionHandle, buffer: Buffer) {
        let options = self.options;

        match &self.pool {
            None => {
                self.sequential_summary += ingest_buffer(&self.publisher, region, &buffer, options);
            },

            Some(pool) => {
                let publisher = Arc::clone(&self.publisher);
                let sender = self.sender.clone();
                self.currently_decoding_count += 1;

                pool.spawn_fifo(move || {
                    let summary = ingest_buffer(&publisher, region, &buffer, options);

                    // the ingest may have been dropped without waiting
                    let _ = sender.send(summary);
                });
            },
        }
    }

    /// Wait until all submitted buffers are decoded and published.
    pub fn finish(mut self) -> IngestSummary {
        let mut summary = self.sequential_summary;

        while self.currently_decoding_count > 0 {
            match self.receiver.recv() {
                Ok(buffer_summary) => summary += buffer_summary,
                Err(_) => break, // cannot happen, this ingest holds a sender
            }

            self.currently_decoding_count -= 1;
        }

        summary
    }
}
