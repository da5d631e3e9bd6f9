use std::error;
use std::fmt;
use std::io;

/// Errors found while decoding the contents of a BASIC file.  Unlike
/// `DiskError`, these usually describe one line or one variable and are
/// kept alongside the successfully decoded items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// A number was not exactly five bytes
    NumberLength,
    /// The sign byte of an integer was neither 0x00 nor 0xFF
    BadSign,
    /// The final byte of an integer was not zero
    BadTerminator,
    /// An array declared no dimensions
    ZeroDimensions,
    /// The type bits of a string/array record were invalid
    BadArrayType,
    /// The data ended in the middle of an item
    Truncated,
    /// An offset pointed outside its block
    BadOffset,
    /// A variable chain refers back to itself
    ChainLoop,
}

impl error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<DecodeError> for io::Error {
    fn from(error: DecodeError) -> io::Error {
        let kind = match error {
            DecodeError::Truncated => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, error)
    }
}

impl DecodeError {
    /// If the provided `io::Error` contains a `DecodeError`, return it.
    pub fn from_io_error(error: &io::Error) -> Option<DecodeError> {
        error
            .get_ref()
            .and_then(|e| e.downcast_ref::<DecodeError>())
            .cloned()
    }

    fn message(&self) -> &str {
        use self::DecodeError::*;
        match *self {
            NumberLength => "number must be exactly 5 bytes",
            BadSign => "bad integer sign byte",
            BadTerminator => "bad integer terminator byte",
            ZeroDimensions => "array has zero dimensions",
            BadArrayType => "invalid array type",
            Truncated => "data ends unexpectedly",
            BadOffset => "offset outside of block",
            ChainLoop => "variable chain loop detected",
        }
    }
}
