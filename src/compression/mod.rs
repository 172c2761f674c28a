
//! Converts between sample grids and compressed patch bit streams.
//! A patch is transformed with a two-dimensional cosine transform,
//! quantized, and stored in zig-zag order with a variable-length code.

pub mod dct;
pub mod zigzag;
pub mod coefficients;

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result, UnitResult};
use crate::layer::LayerType;
use crate::meta::header::{PatchHeader, PatchIds};
use self::dct::CosineTransform;


/// The largest quantization bit count the encoder accepts.
/// Larger values would overflow the coefficient words.
pub const MAX_ENCODER_QUANT_W_BITS: u8 = 24;

/// Largest magnitude a coefficient word can hold.
const MAX_COEFFICIENT: i32 = i32::MAX;


/// Decode the coefficients following `header` and reconstruct the samples of the patch.
/// Returns the row-major samples, `size * size` of them, where `size` depends on the layer type.
///
/// The coefficients are consumed before the header is validated,
/// so an invalid header leaves the reader at the start of the next patch.
pub fn decompress(header: &PatchHeader, read: &mut BitReader<'_>, layer_type: LayerType) -> Result<Vec<f32>> {
    let size = layer_type.patch_size();
    let scan_order = zigzag::scan_order(size)?;
    let cosines = CosineTransform::for_size(size)?;

    let mut quantized = vec![0_i32; size * size];
    let used_length = coefficients::read(read, header.word_bits(), &mut quantized)?;

    header.validate()?;

    let dc_offset = header.dc_offset();

    // without any frequencies, the patch is flat
    if used_length == 0 {
        return Ok(vec![dc_offset; size * size]);
    }

    let factor = header.dequantization_factor();
    let mut frequencies = vec![0.0_f32; size * size];

    for (&raster_index, &value) in scan_order.iter().zip(&quantized[.. used_length]) {
        frequencies[raster_index] = value as f32 * factor;
    }

    let mut samples = cosines.inverse(&frequencies);
    for sample in &mut samples { *sample += dc_offset; }

    Ok(samples)
}

/// Compress the row-major samples of one patch, writing its header and coefficients.
/// The number of samples must match the layer type.
/// Returns the header that was written.
pub fn compress(
    write: &mut BitWriter, layer_type: LayerType, patch_ids: PatchIds,
    samples: &[f32], quant_w_bits: u8,
) -> Result<PatchHeader>
{
    let size = layer_type.patch_size();

    if samples.len() != size * size {
        return Err(Error::invalid(format!(
            "{} layer patch requires {} samples, not {}",
            layer_type, size * size, samples.len()
        )));
    }

    if quant_w_bits > MAX_ENCODER_QUANT_W_BITS {
        return Err(Error::unsupported("quantization bits above 24"));
    }

    if samples.iter().any(|sample| !sample.is_finite()) {
        return Err(Error::invalid("patch contains non-finite samples"));
    }

    let (min, max) = samples.iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY),
        |(min, max), &sample| (min.min(sample), max.max(sample))
    );

    let range = ((max - min).ceil() as f64).clamp(1.0, u16::MAX as f64) as u16;

    let scan_order = zigzag::scan_order(size)?;
    let cosines = CosineTransform::for_size(size)?;

    let residuals: Vec<f32> = samples.iter().map(|sample| sample - min).collect();
    let frequencies = cosines.forward(&residuals);

    // validates everything but the word bits, which depend on the quantized values
    let factor = PatchHeader::new(quant_w_bits, min, range, patch_ids, 0)?.dequantization_factor();

    let mut quantized = Vec::with_capacity(size * size);
    for &raster_index in scan_order.iter() {
        let value = (frequencies[raster_index] as f64 / factor as f64).round();

        // the range saturates at u16::MAX, so wider spans need fewer quantization bits
        if value.abs() > MAX_COEFFICIENT as f64 {
            return Err(Error::unsupported(format!(
                "sample span of {} is too wide for {} quantization bits",
                max - min, quant_w_bits
            )));
        }

        quantized.push(value as i32);
    }

    let word_bits = coefficients::required_word_bits(&quantized);
    let header = PatchHeader::new(quant_w_bits, min, range, patch_ids, word_bits)?;

    header.write(write)?;
    coefficients::write(write, word_bits, &quantized)?;
    Ok(header)
}

/// Write a patch whose residuals are all zero, such that every sample decodes to `value`.
pub fn compress_flat(write: &mut BitWriter, patch_ids: PatchIds, value: f32, quant_w_bits: u8) -> UnitResult {
    let header = PatchHeader::new(quant_w_bits, value, 1, patch_ids, 0)?;
    header.write(write)?;
    coefficients::write(write, 0, &[0])
}


#[cfg(test)]
mod test {
    use super::*;

    fn header(x: u8, y: u8) -> PatchHeader {
        PatchHeader::builder(x, y).unwrap()
            .with_quant_w_bits(8).with_dc_offset(20.0)
            .with_range(128).with_word_bits(4)
            .build().unwrap()
    }

    #[test]
    fn zero_residuals_are_flat() {
        for &layer_type in LayerType::ALL.iter() {
            let mut writer = BitWriter::new();
            coefficients::write(&mut writer, 4, &vec![0; layer_type.sample_count()]).unwrap();

            let bytes = writer.into_bytes();
            let samples = decompress(&header(3, 5), &mut BitReader::new(&bytes), layer_type).unwrap();

            assert_eq!(samples.len(), layer_type.sample_count());
            assert!(samples.iter().all(|&sample| sample == 20.0));
        }
    }

    #[test]
    fn dequantization() {
        // a single dc coefficient of 15, scaled by 128 / 256, spread over 16 * 16 samples
        let mut quantized = vec![0_i32; 256];
        quantized[0] = 15;

        let mut writer = BitWriter::new();
        coefficients::write(&mut writer, 4, &quantized).unwrap();
        let bytes = writer.into_bytes();

        let samples = decompress(&header(0, 0), &mut BitReader::new(&bytes), LayerType::Land).unwrap();
        let expected = 20.0 + 15.0 * 0.5 / 16.0;
        assert!(samples.iter().all(|&sample| (sample - expected).abs() < 1e-4));
    }

    #[test]
    fn invalid_range_consumes_coefficients() {
        let mut writer = BitWriter::new();
        // a header with zero range can only be produced by a broken sender
        writer.write_bits(8, 8).unwrap();
        writer.write_f32(1.0).unwrap();
        writer.write_bits(0, 16).unwrap();
        writer.write_bits(0, 10).unwrap();
        writer.write_bits(2, 5).unwrap();
        coefficients::write(&mut writer, 2, &[1, -2, 0]).unwrap();
        let header_and_block_bits = writer.bit_length();

        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        let broken = PatchHeader::read(&mut reader).unwrap().unwrap();

        let result = decompress(&broken, &mut reader, LayerType::Land);
        assert!(matches!(result, Err(Error::Invalid(_))));
        assert_eq!(reader.bit_position(), header_and_block_bits);
    }

    #[test]
    fn compression_round_trip() {
        for &layer_type in [LayerType::Land, LayerType::CloudExtended].iter() {
            let size = layer_type.patch_size();
            let samples: Vec<f32> = (0 .. size * size)
                .map(|index| {
                    let (x, y) = ((index % size) as f32, (index / size) as f32);
                    21.0 + (x * 0.3).sin() * 4.0 + y * 0.25
                })
                .collect();

            let mut writer = BitWriter::new();
            let ids = PatchIds::new(7, 9).unwrap();
            let written = compress(&mut writer, layer_type, ids, &samples, 10).unwrap();

            let bytes = writer.into_bytes();
            let mut reader = BitReader::new(&bytes);
            let header = PatchHeader::read(&mut reader).unwrap().unwrap();
            assert_eq!(header, written);
            assert_eq!((header.x(), header.y()), (7, 9));

            let decoded = decompress(&header, &mut reader, layer_type).unwrap();
            let tolerance = header.dequantization_factor() * size as f32 + 1e-3;

            for (expected, actual) in samples.iter().zip(&decoded) {
                assert!((expected - actual).abs() <= tolerance, "{} vs {}", expected, actual);
            }
        }
    }

    #[test]
    fn reject_bad_input() {
        let ids = PatchIds::default();
        let mut writer = BitWriter::new();

        assert!(compress(&mut writer, LayerType::Land, ids, &[0.0; 100], 8).is_err());
        assert!(compress(&mut writer, LayerType::Land, ids, &[0.0; 256], 25).is_err());
        assert!(compress(&mut writer, LayerType::Land, ids, &[f32::NAN; 256], 8).is_err());
        assert_eq!(writer.bit_length(), 0);
    }

    #[test]
    fn overflowing_coefficients_are_rejected() {
        let ids = PatchIds::new(2, 2).unwrap();
        let cliffs: Vec<f32> = (0 .. 256).map(|index| if index % 2 == 0 { 0.0 } else { 4_000_000.0 }).collect();

        let mut writer = BitWriter::new();
        let result = compress(&mut writer, LayerType::Land, ids, &cliffs, 24);
        assert!(matches!(result, Err(Error::NotSupported(_))), "{:?}", result);
        assert_eq!(writer.bit_length(), 0);

        // the coarser quantization fits, at the precision the saturated range allows
        let written = compress(&mut writer, LayerType::Land, ids, &cliffs, 8).unwrap();
        assert_eq!(written.range(), u16::MAX);

        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        let header = PatchHeader::read(&mut reader).unwrap().unwrap();
        let decoded = decompress(&header, &mut reader, LayerType::Land).unwrap();

        let tolerance = header.dequantization_factor() * 16.0 + 1e-3;
        for (expected, actual) in cliffs.iter().zip(&decoded) {
            assert!((expected - actual).abs() <= tolerance, "{} vs {}", expected, actual);
        }
    }

    #[test]
    fn flat_patch() {
        let mut writer = BitWriter::new();
        compress_flat(&mut writer, PatchIds::new(1, 1).unwrap(), -3.5, 8).unwrap();

        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        let header = PatchHeader::read(&mut reader).unwrap().unwrap();
        let samples = decompress(&header, &mut reader, LayerType::WaterExtended).unwrap();
        assert_eq!(samples, vec![-3.5; 32 * 32]);
    }
}
