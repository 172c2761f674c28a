
//! Specialized binary input and output.
//! Uses the error handling for this crate.

pub use ::std::io::{Read, Write};
use lebe::prelude::*;
use crate::error::{Result, UnitResult};


/// Generic trait that defines common binary operations such as reading and writing for this type.
/// Byte-aligned values are stored in little endian order.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this value occupies.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    /// If the reader ends too early, returns `Error::OutOfData`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Write this value to the writer.
    fn write(self, write: &mut impl Write) -> UnitResult;
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            #[inline]
            fn write(self, write: &mut impl Write) -> Result<()> {
                write.write_as_little_endian(&self)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
