use std::fmt;
use std::io::{self, Write};

use log::{debug, warn};

use crate::disk::error::DiskError;
use crate::util;

pub const BLOCK_SIZE: usize = 512;

/// A `Geometry` specifies the side, track, and sector layout of a disk image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub sides: u8,
    pub tracks: u8,
    pub sectors: u8,
    /// Sector numbers on disk start at this value.
    pub first_sector: u8,
}

impl Geometry {
    /// Return the total number of bytes used to represent a disk image in
    /// this geometry.
    pub const fn size(&self) -> usize {
        self.sides as usize * self.tracks as usize * self.sectors as usize * BLOCK_SIZE
    }

    #[inline]
    fn contains(&self, location: Location) -> bool {
        location.side < self.sides
            && location.track < self.tracks
            && location.sector >= self.first_sector
            && location.sector < self.first_sector + self.sectors
    }

    #[inline]
    fn index(&self, location: Location) -> usize {
        // Track-major, side-minor, sector-minor: the order of a flat MGT image.
        let track_span = self.sides as usize * self.sectors as usize;
        let side_span = self.sectors as usize;
        location.track as usize * track_span
            + location.side as usize * side_span
            + (location.sector - self.first_sector) as usize
    }
}

/// The standard MGT geometry: 2 sides of 80 tracks, 10 sectors of 512 bytes.
pub static MGT_GEOMETRY: Geometry = Geometry {
    sides: 2,
    tracks: 80,
    sectors: 10,
    first_sector: 1,
};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct Location {
    pub side: u8,
    pub track: u8,
    pub sector: u8,
}

impl Location {
    #[inline]
    pub fn new(side: u8, track: u8, sector: u8) -> Location {
        Location {
            side,
            track,
            sector,
        }
    }

    /// Decode an on-disk track/sector pair.  Bit 7 of the track byte selects
    /// the second side.
    #[inline]
    pub fn from_link(track: u8, sector: u8) -> Location {
        Location {
            side: (track & 0x80) >> 7,
            track: track & 0x7f,
            sector,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{},{})", self.side, self.track, self.sector)
    }
}

/// In-memory storage for every sector of a disk.  Sectors are written while
/// loading and only read afterwards.
#[derive(Clone)]
pub struct SectorStore {
    geometry: Geometry,
    data: Box<[u8]>,
}

impl SectorStore {
    /// Allocate a zero-filled store for the provided geometry.
    pub fn new(geometry: Geometry) -> SectorStore {
        SectorStore {
            geometry,
            data: vec![0u8; geometry.size()].into_boxed_slice(),
        }
    }

    /// Build an MGT store from a flat (already decompressed) image buffer.
    ///
    /// A buffer shorter than the geometry leaves the remaining sectors
    /// zero-filled rather than failing.  Truncated images are common and
    /// their leading sectors, which hold the directory, are still usable.
    pub fn load(buffer: &[u8]) -> SectorStore {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        store.fill(buffer);
        store
    }

    /// Stream a flat buffer into this store, track-major, side-minor,
    /// sector-minor.
    pub fn fill(&mut self, buffer: &[u8]) {
        let size = self.geometry.size();
        if buffer.len() < size {
            warn!(
                "image is {} bytes, expected {}; remaining sectors left empty",
                buffer.len(),
                size
            );
        } else if buffer.len() > size {
            warn!(
                "image is {} bytes, expected {}; ignoring trailing data",
                buffer.len(),
                size
            );
        }
        let locations = LocationIterator::new(self.geometry);
        for (location, chunk) in locations.zip(buffer.chunks(BLOCK_SIZE)) {
            let index = self.geometry.index(location) * BLOCK_SIZE;
            self.data[index..index + chunk.len()].copy_from_slice(chunk);
        }
        debug!("loaded {} bytes into sector store", buffer.len().min(size));
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn get_offset(&self, location: Location) -> io::Result<usize> {
        if !self.geometry.contains(location) {
            return Err(DiskError::InvalidLocation.into());
        }
        Ok(self.geometry.index(location) * BLOCK_SIZE)
    }

    /// Return the contents of one sector.
    pub fn read(&self, location: Location) -> io::Result<&[u8]> {
        let offset = self.get_offset(location)?;
        Ok(&self.data[offset..offset + BLOCK_SIZE])
    }

    /// Replace the contents of one sector.
    pub fn write(&mut self, location: Location, data: &[u8]) -> io::Result<()> {
        if data.len() != BLOCK_SIZE {
            return Err(DiskError::InvalidSectorSize.into());
        }
        let offset = self.get_offset(location)?;
        self.data[offset..offset + BLOCK_SIZE].copy_from_slice(data);
        Ok(())
    }

    /// Iterate over every sector location in image order.
    pub fn locations(&self) -> LocationIterator {
        LocationIterator::new(self.geometry)
    }

    /// Write a hex dump of every sector to the provided writer.
    pub fn dump(&self, writer: &mut dyn Write) -> io::Result<()> {
        for location in self.locations() {
            writeln!(writer)?;
            writeln!(
                writer,
                "side {} track {:02} sector {:02}",
                location.side, location.track, location.sector
            )?;
            writeln!(writer, "{}", util::hex(self.read(location)?))?;
        }
        Ok(())
    }
}

/// Iterates locations in the order sectors appear in a flat image file.
pub struct LocationIterator {
    geometry: Geometry,
    next: Option<Location>,
}

impl LocationIterator {
    fn new(geometry: Geometry) -> LocationIterator {
        let next = if geometry.size() == 0 {
            None
        } else {
            Some(Location::new(0, 0, geometry.first_sector))
        };
        LocationIterator { geometry, next }
    }
}

impl Iterator for LocationIterator {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let location = self.next?;

        let mut next_location = location;
        next_location.sector += 1;
        if next_location.sector >= self.geometry.first_sector + self.geometry.sectors {
            next_location.sector = self.geometry.first_sector;
            next_location.side += 1;
            if next_location.side >= self.geometry.sides {
                next_location.side = 0;
                next_location.track += 1;
            }
        }
        self.next = if next_location.track < self.geometry.tracks {
            Some(next_location)
        } else {
            None
        };
        Some(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_size() {
        assert_eq!(MGT_GEOMETRY.size(), 819200);
        assert_eq!(SectorStore::new(MGT_GEOMETRY).locations().count(), 1600);
    }

    #[test]
    fn test_new_store_is_zero_filled() {
        let store = SectorStore::new(MGT_GEOMETRY);
        for location in store.locations() {
            assert!(store.read(location).unwrap().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_read_write() {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        let location = Location::new(1, 79, 10);
        store.write(location, &[0x5a; BLOCK_SIZE]).unwrap();
        assert_eq!(store.read(location).unwrap(), &[0x5a; BLOCK_SIZE][..]);
        assert!(store
            .read(Location::new(0, 79, 10))
            .unwrap()
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_location() {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        for location in [
            Location::new(2, 0, 1),
            Location::new(0, 80, 1),
            Location::new(0, 0, 0),
            Location::new(0, 0, 11),
        ] {
            let e = store.read(location).unwrap_err();
            assert!(e == DiskError::InvalidLocation);
            let e = store.write(location, &[0; BLOCK_SIZE]).unwrap_err();
            assert!(e == DiskError::InvalidLocation);
        }
    }

    #[test]
    fn test_write_wrong_size() {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        let e = store.write(Location::new(0, 0, 1), &[0; 256]).unwrap_err();
        assert!(e == DiskError::InvalidSectorSize);
    }

    #[test]
    fn test_load_order() {
        // Tag each sector of a flat image with its position in the file.
        let mut image = vec![0u8; MGT_GEOMETRY.size()];
        for (i, chunk) in image.chunks_mut(BLOCK_SIZE).enumerate() {
            chunk[0] = (i % 256) as u8;
            chunk[1] = (i / 256) as u8;
        }
        let store = SectorStore::load(&image);
        let tag = |l: Location| {
            let block = store.read(l).unwrap();
            block[0] as usize | (block[1] as usize) << 8
        };
        assert_eq!(tag(Location::new(0, 0, 1)), 0);
        assert_eq!(tag(Location::new(0, 0, 10)), 9);
        assert_eq!(tag(Location::new(1, 0, 1)), 10);
        assert_eq!(tag(Location::new(0, 1, 1)), 20);
        assert_eq!(tag(Location::new(1, 79, 10)), 1599);
    }

    #[test]
    fn test_load_short_buffer_leaves_zero_fill() {
        // One full sector and half of the next.
        let image = vec![0xeeu8; BLOCK_SIZE + BLOCK_SIZE / 2];
        let store = SectorStore::load(&image);
        assert!(store
            .read(Location::new(0, 0, 1))
            .unwrap()
            .iter()
            .all(|&b| b == 0xee));
        let second = store.read(Location::new(0, 0, 2)).unwrap();
        assert!(second[..BLOCK_SIZE / 2].iter().all(|&b| b == 0xee));
        assert!(second[BLOCK_SIZE / 2..].iter().all(|&b| b == 0));
        assert!(store
            .read(Location::new(1, 79, 10))
            .unwrap()
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_load_long_buffer_ignores_excess() {
        let image = vec![0x11u8; MGT_GEOMETRY.size() + 100];
        let store = SectorStore::load(&image);
        assert!(store
            .read(Location::new(1, 79, 10))
            .unwrap()
            .iter()
            .all(|&b| b == 0x11));
    }

    #[test]
    fn test_location_from_link() {
        assert_eq!(Location::from_link(0x04, 3), Location::new(0, 4, 3));
        assert_eq!(Location::from_link(0x84, 3), Location::new(1, 4, 3));
        assert_eq!(Location::from_link(0xcf, 10), Location::new(1, 79, 10));
    }
}
