
//! Bit-granular reading and writing.
//! All fields are stored most significant bit first, within each byte and across bytes.

use crate::error::{Error, Result, UnitResult};

/// The largest number of bits a single field may occupy.
pub const MAX_FIELD_BITS: u32 = 32;


/// Reads fields of arbitrary bit width from a byte slice.
/// Never allocates. Failed reads do not move the cursor.
#[derive(Debug, Clone)]
pub struct BitReader<'b> {
    bytes: &'b [u8],

    /// Index of the next bit to read, counted from the first bit of the first byte.
    bit_position: usize,
}

impl<'b> BitReader<'b> {

    /// Start reading at the first bit of the slice.
    pub fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, bit_position: 0 }
    }

    /// Number of bits consumed so far.
    #[inline]
    pub fn bit_position(&self) -> usize { self.bit_position }

    /// Number of bits that can still be read.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.bytes.len() * 8 - self.bit_position
    }

    /// Whether every remaining bit is in the last, partially consumed byte and is zero.
    /// This is how a writer pads its final byte.
    pub fn only_padding_left(&self) -> bool {
        self.remaining_bits() < 8 && self.clone().read_bits(self.remaining_bits() as u32)
            .map(|padding| padding == 0).unwrap_or(false)
    }

    /// Read `count` bits as an unsigned integer, the first bit being the most significant.
    /// Reading zero bits yields zero.
    /// Returns `Error::OutOfData` if fewer than `count` bits remain.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        if count > MAX_FIELD_BITS {
            return Err(Error::invalid("bit field wider than 32 bits"));
        }

        if count as usize > self.remaining_bits() {
            return Err(Error::OutOfData);
        }

        let mut value: u64 = 0;
        let mut bits_left = count;

        while bits_left > 0 {
            let byte = self.bytes[self.bit_position / 8];
            let bit_offset = (self.bit_position % 8) as u32;
            let available = 8 - bit_offset;
            let take = available.min(bits_left);

            // bits of this byte that have not been read yet, aligned to the right
            let unread = (byte as u32) & (0xFF >> bit_offset);
            let chunk = unread >> (available - take);

            value = (value << take) | chunk as u64;
            bits_left -= take;
            self.bit_position += take as usize;
        }

        Ok(value as u32)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        self.read_bits(1).map(|bit| bit != 0)
    }

    /// Read a sign-magnitude integer of `count` bits.
    /// The first bit is the sign, set for negative numbers,
    /// the remaining `count - 1` bits are the magnitude.
    pub fn read_signed(&mut self, count: u32) -> Result<i64> {
        if count == 0 || count > MAX_FIELD_BITS {
            return Err(Error::invalid("signed field width"));
        }

        if count as usize > self.remaining_bits() {
            return Err(Error::OutOfData);
        }

        let negative = self.read_bit()?;
        let magnitude = self.read_bits(count - 1)? as i64;
        Ok(if negative { -magnitude } else { magnitude })
    }

    /// Read the 32 raw bits of an IEEE 754 single precision float.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bits(32).map(f32::from_bits)
    }
}


/// Appends fields of arbitrary bit width to a growing byte vector.
/// The last byte is padded with zero bits.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,

    /// Number of bits written so far.
    bit_length: usize,
}

impl BitWriter {

    /// Create an empty writer.
    pub fn new() -> Self { Self::default() }

    /// Create an empty writer with room for `byte_capacity` bytes.
    pub fn with_capacity(byte_capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(byte_capacity), bit_length: 0 }
    }

    /// Number of bits written so far.
    #[inline]
    pub fn bit_length(&self) -> usize { self.bit_length }

    /// The bytes written so far, including the padding of the last byte.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// Consume the writer, returning the padded bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> { self.bytes }

    /// Write the lowest `count` bits of `value`, most significant bit first.
    /// Returns an error if the value does not fit into `count` bits.
    pub fn write_bits(&mut self, value: u32, count: u32) -> UnitResult {
        if count > MAX_FIELD_BITS {
            return Err(Error::invalid("bit field wider than 32 bits"));
        }

        if count < 32 && (value >> count) != 0 {
            return Err(Error::invalid("value does not fit into bit field"));
        }

        let mut bits_left = count;

        while bits_left > 0 {
            let bit_offset = (self.bit_length % 8) as u32;
            if bit_offset == 0 { self.bytes.push(0); }

            let available = 8 - bit_offset;
            let take = available.min(bits_left);

            // the next `take` bits of the value, aligned to the right
            let chunk = ((value as u64 >> (bits_left - take)) & ((1 << take) - 1)) as u8;

            let last = self.bytes.len() - 1; // cannot underflow, a byte was pushed above
            self.bytes[last] |= chunk << (available - take);

            bits_left -= take;
            self.bit_length += take as usize;
        }

        Ok(())
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> UnitResult {
        self.write_bits(bit as u32, 1)
    }

    /// Write a sign-magnitude integer of `count` bits, matching `BitReader::read_signed`.
    pub fn write_signed(&mut self, value: i64, count: u32) -> UnitResult {
        if count == 0 || count > MAX_FIELD_BITS {
            return Err(Error::invalid("signed field width"));
        }

        let magnitude = value.unsigned_abs();
        if magnitude >> (count - 1) != 0 {
            return Err(Error::invalid("value does not fit into signed bit field"));
        }

        self.write_bit(value < 0)?;
        self.write_bits(magnitude as u32, count - 1)
    }

    /// Write the 32 raw bits of an IEEE 754 single precision float.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> UnitResult {
        self.write_bits(value.to_bits(), 32)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn most_significant_bit_first() {
        let bytes = [0b1011_0010, 0b0111_1111];
        let mut reader = BitReader::new(&bytes);

        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
        assert_eq!(reader.read_bits(6).unwrap(), 0b0010_01);
        assert_eq!(reader.read_bits(0).unwrap(), 0);
        assert_eq!(reader.remaining_bits(), 6);
        assert_eq!(reader.read_bits(6).unwrap(), 0b11_1111);
        assert_eq!(reader.remaining_bits(), 0);
    }

    #[test]
    fn out_of_data_does_not_advance() {
        let bytes = [0xFF];
        let mut reader = BitReader::new(&bytes);
        reader.read_bits(5).unwrap();

        assert!(matches!(reader.read_bits(4), Err(Error::OutOfData)));
        assert_eq!(reader.bit_position(), 5);
        assert_eq!(reader.read_bits(3).unwrap(), 0b111);
    }

    #[test]
    fn full_width_fields() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(u32::MAX, 32).unwrap();
        writer.write_bits(0xDEAD_BEEF, 32).unwrap();

        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 9);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(32).unwrap(), u32::MAX);
        assert_eq!(reader.read_bits(32).unwrap(), 0xDEAD_BEEF);
        assert!(reader.only_padding_left());
    }

    #[test]
    fn writer_layout_matches_reader() {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1).unwrap();
        writer.write_bits(0b011, 3).unwrap();
        writer.write_bits(0b0010, 4).unwrap();
        writer.write_bits(0b0111, 4).unwrap();

        assert_eq!(writer.bit_length(), 12);
        assert_eq!(writer.as_bytes(), &[0b1011_0010, 0b0111_0000]);
    }

    #[test]
    fn sign_magnitude() {
        let mut writer = BitWriter::new();
        writer.write_signed(-5, 4).unwrap();
        writer.write_signed(7, 4).unwrap();
        writer.write_signed(0, 1).unwrap();
        assert!(writer.write_signed(8, 4).is_err());
        assert!(writer.write_signed(-8, 4).is_err());

        let bytes = writer.into_bytes();
        assert_eq!(bytes[0], 0b1101_0111);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_signed(4).unwrap(), -5);
        assert_eq!(reader.read_signed(4).unwrap(), 7);
        assert_eq!(reader.read_signed(1).unwrap(), 0);
    }

    #[test]
    fn floats_are_raw_bits() {
        let mut writer = BitWriter::new();
        writer.write_bit(true).unwrap();
        writer.write_f32(-20.25).unwrap();

        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_f32().unwrap(), -20.25);
    }

    #[test]
    fn reject_oversized_values() {
        let mut writer = BitWriter::new();
        assert!(writer.write_bits(4, 2).is_err());
        assert!(writer.write_bits(0, 33).is_err());
        assert_eq!(writer.bit_length(), 0);

        assert!(BitReader::new(&[0; 8]).read_bits(33).is_err());
    }

    #[test]
    fn padding_detection() {
        let mut reader = BitReader::new(&[0b1010_0000]);
        reader.read_bits(3).unwrap();
        assert!(reader.only_padding_left());

        let mut reader = BitReader::new(&[0b1010_0001]);
        reader.read_bits(3).unwrap();
        assert!(!reader.only_padding_left());
    }
}
