#[macro_use]
extern crate bencher;

extern crate terrain_codec;
use terrain_codec::prelude::*;

use bencher::Bencher;


/// A full region of rolling hills, 16 by 16 patches.
fn region_layer(layer_type: LayerType, quant_w_bits: u8) -> Vec<u8> {
    let size = layer_type.patch_size();
    let mut encoder = LayerEncoder::new(layer_type, EncodeOptions::default().with_quant_w_bits(quant_w_bits));

    for patch_y in 0 .. 16_u8 {
        for patch_x in 0 .. 16_u8 {
            let samples = (0 .. size * size)
                .map(|index| {
                    let x = (patch_x as usize * size + index % size) as f32;
                    let y = (patch_y as usize * size + index / size) as f32;
                    25.0 + (x * 0.05).sin() * 8.0 + (y * 0.03).cos() * 5.0
                })
                .collect();

            let patch = TerrainPatch::from_samples(layer_type, patch_x, patch_y, samples).unwrap();
            encoder.push(&patch).unwrap();
        }
    }

    encoder.finish_with_group_header().unwrap()
}

/// Decode a standard region on the current thread
fn decode_land_region(bench: &mut Bencher) {
    let payload = region_layer(LayerType::Land, 8);

    bench.iter(||{
        let patches = decode_layer_data(&payload, DecodeOptions::default()).unwrap()
            .decode_all().unwrap();

        bencher::black_box(patches);
    })
}

/// Decode an extended region on the current thread
fn decode_extended_land_region(bench: &mut Bencher) {
    let payload = region_layer(LayerType::LandExtended, 12);

    bench.iter(||{
        let patches = decode_layer_data(&payload, DecodeOptions::default()).unwrap()
            .decode_all().unwrap();

        bencher::black_box(patches);
    })
}

/// Decode and deliver eight regions on the thread pool
#[cfg(feature = "rayon")]
fn ingest_regions_parallel(bench: &mut Bencher) {
    use std::sync::Arc;

    let payload = region_layer(LayerType::Land, 8);
    let publisher = Arc::new(PatchPublisher::new());
    let subscription = publisher.subscribe(SubscriptionFilter::all_regions(), QueueCapacity::Unbounded);

    bench.iter(||{
        let mut ingest = ParallelIngest::new(Arc::clone(&publisher), DecodeOptions::default());

        for region in 0 .. 8 {
            ingest.submit_layer_data(RegionHandle(region), payload.clone());
        }

        bencher::black_box(ingest.finish());
        bencher::black_box(subscription.drain());
    })
}

/// Decode and deliver eight regions on the current thread
fn ingest_regions_sequential(bench: &mut Bencher) {
    let payload = region_layer(LayerType::Land, 8);
    let publisher = PatchPublisher::new();
    let subscription = publisher.subscribe(SubscriptionFilter::all_regions(), QueueCapacity::Unbounded);

    bench.iter(||{
        let ingest = LayerIngest::new(&publisher, DecodeOptions::default());

        for region in 0 .. 8 {
            bencher::black_box(ingest.ingest_layer_data(RegionHandle(region), &payload).unwrap());
        }

        bencher::black_box(subscription.drain());
    })
}

/// Compress a standard region
fn encode_land_region(bench: &mut Bencher) {
    bench.iter(||{
        bencher::black_box(region_layer(LayerType::Land, 8));
    })
}

#[cfg(feature = "rayon")]
benchmark_group!(decode,
    decode_land_region,
    decode_extended_land_region,
    ingest_regions_parallel,
    ingest_regions_sequential,
    encode_land_region
);

#[cfg(not(feature = "rayon"))]
benchmark_group!(decode,
    decode_land_region,
    decode_extended_land_region,
    ingest_regions_sequential,
    encode_land_region
);

benchmark_main!(decode);
