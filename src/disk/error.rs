use std::error;
use std::fmt;
use std::io;

/// Errors that can be returned from disk image operations.  These are
/// generally converted into `io::Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiskError {
    /// Bad side, track, or sector
    InvalidLocation,
    /// Sector data of the wrong size
    InvalidSectorSize,
    /// Directory record of the wrong size
    InvalidRecordSize,
    /// File not found
    NotFound,
    /// Attempt to enter something that is not a directory
    NotADirectory,
    /// Chain loop detected
    ChainLoop,
    /// The sector chain ended before the declared file length
    TruncatedChain,
    /// Unknown container format
    UnknownFormat,
}

impl error::Error for DiskError {}

impl fmt::Display for DiskError {
    /// Provide human-readable descriptions of the errors
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.message())
    }
}

impl From<DiskError> for io::Error {
    fn from(error: DiskError) -> io::Error {
        let kind = match error {
            DiskError::InvalidLocation => io::ErrorKind::InvalidInput,
            DiskError::InvalidSectorSize => io::ErrorKind::InvalidInput,
            DiskError::InvalidRecordSize => io::ErrorKind::InvalidData,
            DiskError::NotFound => io::ErrorKind::NotFound,
            DiskError::NotADirectory => io::ErrorKind::InvalidInput,
            DiskError::ChainLoop => io::ErrorKind::InvalidData,
            DiskError::TruncatedChain => io::ErrorKind::UnexpectedEof,
            DiskError::UnknownFormat => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, error)
    }
}

impl DiskError {
    /// If the provided `io::Error` contains a `DiskError`, return the
    /// underlying `DiskError`.  If not, return None.
    pub fn from_io_error(error: &io::Error) -> Option<DiskError> {
        error
            .get_ref()
            .and_then(|e| e.downcast_ref::<DiskError>())
            .cloned()
    }

    /// Provide terse descriptions of the errors.
    fn message(&self) -> &str {
        use self::DiskError::*;
        match *self {
            InvalidLocation => "bad side, track, or sector",
            InvalidSectorSize => "sector data must be exactly 512 bytes",
            InvalidRecordSize => "wrong sized directory record",
            NotFound => "file not found",
            NotADirectory => "not a directory",
            ChainLoop => "chain loop detected",
            TruncatedChain => "sector chain is shorter than the declared file length",
            UnknownFormat => "unknown format",
        }
    }
}

impl PartialEq<io::Error> for DiskError {
    fn eq(&self, other: &io::Error) -> bool {
        match DiskError::from_io_error(other) {
            Some(ref e) if e == self => true,
            _ => false,
        }
    }
}

impl PartialEq<DiskError> for io::Error {
    fn eq(&self, other: &DiskError) -> bool {
        match DiskError::from_io_error(self) {
            Some(ref e) if e == other => true,
            _ => false,
        }
    }
}
