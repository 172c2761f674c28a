//! Variable-length coding of quantized coefficients.
//!
//! Each coefficient starts with a prefix:
//! `0` is a zero coefficient, `10` ends the block with all remaining coefficients zero,
//! and `11` is followed by a sign bit and `word_bits` magnitude bits.

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result, UnitResult};


/// Read up to `coefficients.len()` coefficients in transmission order.
/// Coefficients after an end-of-block marker are set to zero.
/// Returns the number of coefficients until and including the last non-zero one.
///
/// Running out of bits before the block is complete is reported as `Error::TruncatedPatch`.
pub fn read(read: &mut BitReader<'_>, word_bits: u8, coefficients: &mut [i32]) -> Result<usize> {
    let expected = coefficients.len();
    let truncated = |coefficients_read| Error::TruncatedPatch { coefficients_read, coefficients_expected: expected };

    let mut used_length = 0;

    for index in 0 .. expected {
        let is_zero = !read.read_bit().map_err(|_| truncated(index))?;
        if is_zero {
            coefficients[index] = 0;
            continue;
        }

        let is_value = read.read_bit().map_err(|_| truncated(index))?;
        if !is_value {
            for coefficient in &mut coefficients[index ..] { *coefficient = 0; }
            break;
        }

        let value = read.read_signed(word_bits as u32 + 1).map_err(|_| truncated(index))?;
        coefficients[index] = value as i32;

        if value != 0 { used_length = index + 1; }
    }

    Ok(used_length)
}

/// Write coefficients in transmission order.
/// Emits an end-of-block marker after the last non-zero coefficient,
/// unless that coefficient is the last of the block.
pub fn write(write: &mut BitWriter, word_bits: u8, coefficients: &[i32]) -> UnitResult {
    let used_length = coefficients.iter().rposition(|&value| value != 0).map_or(0, |index| index + 1);

    for &coefficient in &coefficients[.. used_length] {
        if coefficient == 0 {
            write.write_bit(false)?;
        }
        else {
            write.write_bits(0b11, 2)?;
            write.write_signed(coefficient as i64, word_bits as u32 + 1)?;
        }
    }

    if used_length < coefficients.len() {
        write.write_bits(0b10, 2)?;
    }

    Ok(())
}

/// Number of magnitude bits needed to store all coefficients.
pub fn required_word_bits(coefficients: &[i32]) -> u8 {
    let largest = coefficients.iter().map(|value| value.unsigned_abs()).max().unwrap_or(0);
    crate::math::bit_count(largest as u64) as u8
}
