//! Traits, structs, and functions relating to disk images.

mod block;
mod chain;
mod error;
mod image;
mod masterdos;
mod samdos;

pub mod directory;
pub mod file;

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use log::info;

use crate::disk::directory::{Directory, DirectoryEntry, DirectoryIterator, Variant};
use crate::disk::file::File;

pub use self::block::{Geometry, Location, LocationIterator, SectorStore, BLOCK_SIZE, MGT_GEOMETRY};
pub use self::chain::{ChainIterator, ChainLink, ChainReader, ChainSector, DATA_BYTES_PER_SECTOR};
pub use self::error::DiskError;
pub use self::image::{read_container, unpack, Container};
pub use self::masterdos::MasterDos;
pub use self::samdos::SamDos;

/// Read a disk image file (raw, zipped, or gzipped) into a sector store.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<SectorStore> {
    let buffer = read_container(path)?;
    Ok(SectorStore::load(&buffer))
}

/// Open a disk image and impose a SAMDOS or MasterDOS file system on it.
pub fn open_dos<P: AsRef<Path>>(path: P, variant: Variant) -> io::Result<Box<dyn Dos>> {
    let store = open(path)?;
    info!("reading directory as {:?}", variant);
    Ok(match variant {
        Variant::SamDos => Box::new(SamDos::new(store)?),
        Variant::MasterDos => Box::new(MasterDos::new(store)?),
    })
}

/// Both DOS variants implement the `Dos` trait, and most operations can be
/// performed polymorphically using `Dos` as a trait object.
pub trait Dos {
    fn variant(&self) -> Variant;
    fn store(&self) -> &SectorStore;
    fn directory(&self) -> &Directory;
    /// Return the name of this disk.
    fn name(&self) -> &str;

    /// Return an iterator of the visible directory entries.  Each call starts
    /// again from the first slot.
    fn iter(&self) -> DirectoryIterator<'_> {
        self.directory().iter()
    }

    /// Return a list of the visible directory entries.
    fn entries(&self) -> Vec<&DirectoryEntry> {
        self.iter().collect()
    }

    /// Look up a slot, whether or not it is in use.
    fn entry(&self, slot: u16) -> io::Result<&DirectoryEntry> {
        self.directory()
            .get(slot)
            .ok_or_else(|| DiskError::NotFound.into())
    }

    /// Locate a visible directory entry based on its filename.
    fn find_directory_entry(&self, filename: &str) -> io::Result<&DirectoryEntry> {
        self.iter()
            .find(|entry| entry.filename.matches(filename))
            .ok_or_else(|| DiskError::NotFound.into())
    }

    /// Resolve a user-supplied file reference: a slot number or a filename.
    fn resolve(&self, file: &str) -> io::Result<&DirectoryEntry> {
        match file.trim().parse::<u16>() {
            Ok(slot) => self.entry(slot),
            Err(_) => self.find_directory_entry(file),
        }
    }

    /// Reconstruct the file stored in a slot.
    fn extract_file(&self, slot: u16) -> io::Result<File> {
        File::extract(self.store(), self.entry(slot)?)
    }

    /// Reconstruct the file described by a directory entry.
    fn open_file_from_entry(&self, entry: &DirectoryEntry) -> io::Result<File> {
        File::extract(self.store(), entry)
    }

    /// Read a specific sector from the disk.
    fn read_sector(&self, location: Location) -> io::Result<&[u8]> {
        self.store().read(location)
    }

    /// Write a hex dump of the disk image to the provided writer.
    fn dump(&self, writer: &mut dyn Write) -> io::Result<()> {
        self.store().dump(writer)
    }
}

impl<'a> fmt::Display for dyn Dos + 'a {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.name())
    }
}

impl<'a> IntoIterator for &'a (dyn Dos + 'a) {
    type Item = &'a DirectoryEntry;
    type IntoIter = DirectoryIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
