
//! Error type definitions.

use std::borrow::Cow;
use std::io::ErrorKind;
pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;
use std::convert::TryFrom;
use std::error;
use std::fmt;
use std::num::TryFromIntError;


// Export types

/// A result that may contain a terrain codec error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains a terrain codec error.
pub type UnitResult = Result<()>;


/// An error that may happen while decoding or encoding a terrain layer.
///
/// Unknown layer type codes are not an error.
/// They are classified as land instead.
#[derive(Debug)]
pub enum Error {

    /// The bit stream ended in the middle of a field.
    OutOfData,

    /// The coefficient stream of a patch ended before all coefficients
    /// were read and before an end-of-block marker was found.
    TruncatedPatch {

        /// The number of coefficients that could be read.
        coefficients_read: usize,

        /// The number of coefficients a complete patch contains.
        coefficients_expected: usize,
    },

    /// The contents of the data are not supported by this
    /// implementation, but the data may still be valid.
    NotSupported(Cow<'static, str>),

    /// The contents of the data are not valid.
    Invalid(Cow<'static, str>),

    /// The underlying byte stream could not be read or written.
    Io(IoError),
}


impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `NotSupported`.
    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotSupported(message.into())
    }

    /// Whether the bit cursor may still be aligned to the start of the next patch.
    /// Running out of bits leaves nothing to resume from.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::OutOfData | Error::TruncatedPatch { .. } | Error::Io(_) => false,
            Error::Invalid(_) | Error::NotSupported(_) => true,
        }
    }
}

/// Enable using the `?` operator on `std::io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            Error::OutOfData
        }
        else {
            Error::Io(error)
        }
    }
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Self {
        Error::invalid("invalid size")
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfData => formatter.write_str("not enough bits left in layer data"),

            Error::TruncatedPatch { coefficients_read, coefficients_expected } => write!(
                formatter, "truncated patch: read {} of {} coefficients",
                coefficients_read, coefficients_expected
            ),

            Error::Io(err) => fmt::Display::fmt(err, formatter),
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Invalid(message) => write!(formatter, "invalid: {}", message),
        }
    }
}


/// Return error on invalid range.
#[inline]
pub(crate) fn u32_to_u16(value: u32, error_message: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Return error on invalid range.
#[inline]
pub(crate) fn u32_to_u8(value: u32, error_message: &'static str) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::invalid(error_message))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unexpected_eof_becomes_out_of_data() {
        let io = IoError::new(ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(Error::from(io), Error::OutOfData));

        let io = IoError::new(ErrorKind::PermissionDenied, "denied");
        assert!(matches!(Error::from(io), Error::Io(_)));
    }

    #[test]
    fn display_mentions_counts() {
        let error = Error::TruncatedPatch { coefficients_read: 12, coefficients_expected: 256 };
        assert_eq!(error.to_string(), "truncated patch: read 12 of 256 coefficients");
    }

    #[test]
    fn recoverable_errors() {
        assert!(!Error::OutOfData.is_recoverable());
        assert!(Error::invalid("range").is_recoverable());
    }
}
