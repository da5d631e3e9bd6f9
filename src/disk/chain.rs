use std::collections::HashSet;
use std::io;

use log::debug;

use crate::disk::block::{Location, SectorStore, BLOCK_SIZE};
use crate::disk::error::DiskError;

/// Each sector of a file carries this many data bytes, followed by the
/// two-byte link to the next sector.
pub const DATA_BYTES_PER_SECTOR: usize = BLOCK_SIZE - 2;

#[derive(Debug, PartialEq, Eq)]
pub enum ChainLink {
    Next(Location),
    Tail,
}

impl ChainLink {
    /// Decode the link stored in the final two bytes of a sector.  A
    /// track/sector pair of (0,0) ends the chain.
    #[inline]
    pub fn new(block: &[u8]) -> ChainLink {
        let track = block[DATA_BYTES_PER_SECTOR];
        let sector = block[DATA_BYTES_PER_SECTOR + 1];
        if track == 0 && sector == 0 {
            ChainLink::Tail
        } else {
            ChainLink::Next(Location::from_link(track, sector))
        }
    }
}

/// A ChainSector is the result of a chain iteration, and provides the data
/// bytes of a block (without the link) and the location from which it was
/// read.
pub struct ChainSector {
    pub data: Vec<u8>,
    pub location: Location,
}

/// Walks a chain of sectors starting at a given location.
pub struct ChainIterator<'a> {
    store: &'a SectorStore,
    next_sector: Option<Location>,
    visited_sectors: HashSet<Location>,
}

impl<'a> ChainIterator<'a> {
    /// Create a new chain iterator starting at the specified location.
    pub fn new(store: &'a SectorStore, starting_sector: Location) -> ChainIterator<'a> {
        ChainIterator {
            store,
            next_sector: Some(starting_sector),
            visited_sectors: HashSet::new(),
        }
    }

    /// Read the entire chain and return a list of locations.
    pub fn locations(self) -> io::Result<Vec<Location>> {
        self.map(|r| r.map(|cs| cs.location)).collect()
    }
}

impl<'a> Iterator for ChainIterator<'a> {
    type Item = io::Result<ChainSector>;

    fn next(&mut self) -> Option<io::Result<ChainSector>> {
        let location = self.next_sector.take()?;

        // Loop detection.
        if !self.visited_sectors.insert(location) {
            return Some(Err(DiskError::ChainLoop.into()));
        }

        let block = match self.store.read(location) {
            Ok(b) => b,
            Err(e) => return Some(Err(e)),
        };
        if let ChainLink::Next(next) = ChainLink::new(block) {
            self.next_sector = Some(next);
        }
        debug!("chain sector {} -> {:?}", location, self.next_sector);

        Some(Ok(ChainSector {
            data: block[..DATA_BYTES_PER_SECTOR].to_vec(),
            location,
        }))
    }
}

/// ChainReader objects implement the Read trait and are used to read the byte
/// stream stored in a series of chained sectors.
pub struct ChainReader<'a> {
    chain: ChainIterator<'a>,
    block: Vec<u8>,
    eof: bool,
}

impl<'a> ChainReader<'a> {
    pub fn new(store: &'a SectorStore, start: Location) -> ChainReader<'a> {
        ChainReader {
            chain: ChainIterator::new(store, start),
            block: Vec::new(),
            eof: false,
        }
    }
}

impl<'a> io::Read for ChainReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.block.is_empty() && !self.eof {
            match self.chain.next() {
                Some(Ok(sector)) => self.block = sector.data,
                Some(Err(e)) => {
                    self.eof = true;
                    return Err(e);
                }
                None => self.eof = true,
            }
        }
        // Copy as much of this block as possible into the caller-provided buffer.
        let nbytes = self.block.len().min(buf.len());
        buf[..nbytes].copy_from_slice(&self.block[..nbytes]);
        self.block.drain(..nbytes);
        Ok(nbytes)
    }
}
