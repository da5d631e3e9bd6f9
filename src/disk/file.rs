//! Files extracted from a disk image

use std::fmt;
use std::io::{self, Read, Write};

use log::debug;

use crate::disk::block::SectorStore;
use crate::disk::chain::ChainReader;
use crate::disk::directory::{DirectoryEntry, PAGE_SIZE};
use crate::disk::error::DiskError;
use crate::util;

pub const FILE_HEADER_SIZE: usize = 9;

/// The nine-byte header stored in front of every file's data.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FileHeader(pub [u8; FILE_HEADER_SIZE]);

impl FileHeader {
    const TYPE_OFFSET: usize = 0;
    const LENGTH_OFFSET: usize = 1;
    const START_OFFSET: usize = 3;
    const PAGES_OFFSET: usize = 7;
    const START_PAGE_OFFSET: usize = 8;

    pub fn from_bytes(bytes: &[u8]) -> FileHeader {
        let mut header = [0u8; FILE_HEADER_SIZE];
        header.copy_from_slice(&bytes[..FILE_HEADER_SIZE]);
        FileHeader(header)
    }

    pub fn file_type(&self) -> u8 {
        self.0[Self::TYPE_OFFSET]
    }

    /// The data length recorded in the header, as pages and a remainder.
    pub fn length(&self) -> usize {
        self.0[Self::PAGES_OFFSET] as usize * PAGE_SIZE + self.word(Self::LENGTH_OFFSET)
    }

    /// The load address as a (page, offset) pair.
    pub fn start(&self) -> (u8, u16) {
        (
            self.0[Self::START_PAGE_OFFSET],
            self.word(Self::START_OFFSET) as u16,
        )
    }

    #[inline]
    fn word(&self, offset: usize) -> usize {
        self.0[offset] as usize | (self.0[offset + 1] as usize) << 8
    }
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (page, offset) = self.start();
        write!(
            f,
            "type {} length {} start {:02x}:{:04x}",
            self.file_type(),
            self.length(),
            page,
            offset
        )
    }
}

impl fmt::Debug for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FileHeader({})", self)
    }
}

/// A file reconstructed from its sector chain.
#[derive(Clone)]
pub struct File {
    pub entry: DirectoryEntry,
    pub header: FileHeader,
    /// The file contents, truncated to the length declared in the directory.
    pub data: Vec<u8>,
}

impl File {
    /// Follow the sector chain of a directory entry and collect its
    /// contents.  Deleted entries and chains shorter than the declared length
    /// are errors.
    pub fn extract(store: &SectorStore, entry: &DirectoryEntry) -> io::Result<File> {
        if entry.is_deleted() {
            return Err(DiskError::NotFound.into());
        }
        // A (0, 0) start link is an empty chain, with no room for the header.
        if entry.first_track == 0 && entry.first_sector == 0 {
            return Err(DiskError::TruncatedChain.into());
        }
        let mut data = Vec::new();
        ChainReader::new(store, entry.first_location()).read_to_end(&mut data)?;
        debug!(
            "slot {}: read {} chained bytes for a {} byte file",
            entry.slot,
            data.len(),
            entry.length
        );
        if data.len() < FILE_HEADER_SIZE + entry.length {
            return Err(DiskError::TruncatedChain.into());
        }
        let header = FileHeader::from_bytes(&data[..FILE_HEADER_SIZE]);
        data.truncate(FILE_HEADER_SIZE + entry.length);
        data.drain(..FILE_HEADER_SIZE);
        Ok(File {
            entry: entry.clone(),
            header,
            data,
        })
    }

    /// Hex-dump the file contents to the provided writer.
    pub fn dump(&self, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "Filename: \"{}\"", self.entry.filename.trimmed())?;
        writeln!(writer, "Header: {}", self.header)?;
        writeln!(writer, "{}", util::hex(&self.data))?;
        Ok(())
    }
}
