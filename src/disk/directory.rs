//! SAMDOS and MasterDOS directories

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::io;

use log::debug;

use crate::disk::block::{Location, SectorStore, BLOCK_SIZE};
use crate::disk::DiskError;
use crate::util;

pub const ENTRY_SIZE: usize = 256;
pub const FILENAME_LENGTH: usize = 10;
pub const SECTOR_MAP_LENGTH: usize = 195;
pub const TYPE_INFO_LENGTH: usize = 11;

const ENTRY_ATTRIBUTE_OFFSET: usize = 0;
const ENTRY_FILENAME_OFFSET: usize = 1;
const ENTRY_SECTOR_COUNT_OFFSET: usize = 11;
const ENTRY_FIRST_TRACK_OFFSET: usize = 13;
const ENTRY_FIRST_SECTOR_OFFSET: usize = 14;
const ENTRY_SECTOR_MAP_OFFSET: usize = 15;
const ENTRY_TYPE_INFO_OFFSET: usize = 221;
const ENTRY_LENGTH_OFFSET: usize = 239;
const ENTRY_DIR_TAG_OFFSET: usize = 250;
const ENTRY_IN_DIR_OFFSET: usize = 254;

const ATTRIB_HIDDEN_MASK: u8 = 0x80;
const ATTRIB_PROTECTED_MASK: u8 = 0x40;
const ATTRIB_FILE_TYPE_MASK: u8 = 0x3f;

pub const FILE_TYPE_BASIC: u8 = 16;
pub const FILE_TYPE_DIRECTORY: u8 = 21;

/// Bytes per page of SAM memory, the unit of the high byte of a paged length.
pub const PAGE_SIZE: usize = 16384;

/// Decode a three-byte paged length: a page count followed by a little-endian
/// remainder.
#[inline]
pub fn paged_length(bytes: &[u8]) -> usize {
    bytes[0] as usize * PAGE_SIZE + (bytes[1] as usize | (bytes[2] as usize) << 8)
}

/// A description of one file type code.
#[derive(Debug)]
pub struct FileTypeInfo {
    pub code: u8,
    pub description: &'static str,
    pub label: &'static str,
}

/// The file type codes understood by one DOS variant.
#[derive(Debug)]
pub struct FileTypeTable(&'static [FileTypeInfo]);

impl FileTypeTable {
    pub fn lookup(&self, code: u8) -> Option<&'static FileTypeInfo> {
        self.0.iter().find(|info| info.code == code)
    }

    /// Return the short label for a type code, or "???" if unknown.
    pub fn label(&self, code: u8) -> &'static str {
        self.lookup(code).map(|info| info.label).unwrap_or("???")
    }
}

macro_rules! file_type {
    ($code:expr, $description:expr, $label:expr) => {
        FileTypeInfo {
            code: $code,
            description: $description,
            label: $label,
        }
    };
}

pub static SAMDOS_FILE_TYPES: FileTypeTable = FileTypeTable(&[
    file_type!(5, "ZX Snapshot file", "SNP 48k"),
    file_type!(FILE_TYPE_BASIC, "SAM BASIC program", "BASIC"),
    file_type!(17, "Numeric array", "D ARRAY"),
    file_type!(18, "String array", "$ ARRAY"),
    file_type!(19, "Code file", "CODE"),
    file_type!(20, "Screen file", "SCREEN$"),
]);

pub static MASTERDOS_FILE_TYPES: FileTypeTable = FileTypeTable(&[
    file_type!(5, "ZX Snapshot file", "SNP 48k"),
    file_type!(FILE_TYPE_BASIC, "SAM BASIC program", "BASIC"),
    file_type!(17, "Numeric array", "D ARRAY"),
    file_type!(18, "String array", "$ ARRAY"),
    file_type!(19, "Code file", "CODE"),
    file_type!(20, "Screen file", "SCREEN$"),
    file_type!(FILE_TYPE_DIRECTORY, "Sub Directory", "DIR"),
]);

/// The DOS flavour a directory was decoded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    SamDos,
    MasterDos,
}

impl Variant {
    pub fn file_types(&self) -> &'static FileTypeTable {
        match self {
            Variant::SamDos => &SAMDOS_FILE_TYPES,
            Variant::MasterDos => &MASTERDOS_FILE_TYPES,
        }
    }
}

/// The full 8-bit attribute byte: the file type plus two flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileAttributes {
    /// Bits 0-5 indicate the file type.  Zero marks an empty slot.
    pub file_type: u8,
    /// Bit 6 is the "protected" flag.
    pub protected: bool,
    /// Bit 7 is the "hidden" flag.
    pub hidden: bool,
}

impl FileAttributes {
    pub fn from_byte(byte: u8) -> FileAttributes {
        FileAttributes {
            file_type: byte & ATTRIB_FILE_TYPE_MASK,
            protected: byte & ATTRIB_PROTECTED_MASK != 0,
            hidden: byte & ATTRIB_HIDDEN_MASK != 0,
        }
    }

    pub fn to_byte(&self) -> u8 {
        let mut byte = self.file_type & ATTRIB_FILE_TYPE_MASK;
        if self.protected {
            byte |= ATTRIB_PROTECTED_MASK;
        }
        if self.hidden {
            byte |= ATTRIB_HIDDEN_MASK;
        }
        byte
    }
}

/// The space-padded filename field.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Filename(pub [u8; FILENAME_LENGTH]);

impl Filename {
    pub fn from_bytes(bytes: &[u8]) -> Filename {
        let mut name = [b' '; FILENAME_LENGTH];
        let n = bytes.len().min(FILENAME_LENGTH);
        name[..n].copy_from_slice(&bytes[..n]);
        Filename(name)
    }

    /// The name with padding spaces (and any trailing NULs) removed.
    pub fn trimmed(&self) -> String {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |p| p + 1);
        util::escape(&self.0[..end])
    }

    /// Compare against a user-supplied name, ignoring case and padding.
    pub fn matches(&self, name: &str) -> bool {
        self.trimmed().eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&util::escape(&self.0))
    }
}

impl fmt::Debug for Filename {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self.trimmed())
    }
}

/// The subdirectory fields that MasterDOS adds to a directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectoryExtension {
    pub is_directory: bool,
    /// The tag that entries inside this directory refer to.
    pub dir_tag: u8,
    /// The tag of the directory containing this entry (0 for the root).
    pub in_dir: u8,
}

/// A SAMDOS directory entry, optionally carrying MasterDOS extensions.
#[derive(Clone)]
pub struct DirectoryEntry {
    pub slot: u16,
    pub variant: Variant,
    pub attributes: FileAttributes,
    pub filename: Filename,
    /// Number of sectors occupied by the file.
    pub sectors: u16,
    /// Raw first track byte (bit 7 selects the side) and sector.
    pub first_track: u8,
    pub first_sector: u8,
    pub sector_map: Vec<u8>,
    /// Type-specific information, such as the BASIC program layout.
    pub type_info: [u8; TYPE_INFO_LENGTH],
    /// The declared file length in bytes, excluding the 9-byte file header.
    pub length: usize,
    pub extension: Option<DirectoryExtension>,
}

impl DirectoryEntry {
    /// Decode a 256-byte directory record using the variant's type table.
    pub fn from_bytes(slot: u16, variant: Variant, bytes: &[u8]) -> io::Result<DirectoryEntry> {
        if bytes.len() != ENTRY_SIZE {
            return Err(DiskError::InvalidRecordSize.into());
        }
        let attributes = FileAttributes::from_byte(bytes[ENTRY_ATTRIBUTE_OFFSET]);
        let extension = match variant {
            Variant::SamDos => None,
            Variant::MasterDos => Some(DirectoryExtension {
                is_directory: attributes.file_type == FILE_TYPE_DIRECTORY,
                dir_tag: bytes[ENTRY_DIR_TAG_OFFSET],
                in_dir: bytes[ENTRY_IN_DIR_OFFSET],
            }),
        };
        let mut type_info = [0u8; TYPE_INFO_LENGTH];
        type_info.copy_from_slice(
            &bytes[ENTRY_TYPE_INFO_OFFSET..ENTRY_TYPE_INFO_OFFSET + TYPE_INFO_LENGTH],
        );
        Ok(DirectoryEntry {
            slot,
            variant,
            attributes,
            filename: Filename::from_bytes(
                &bytes[ENTRY_FILENAME_OFFSET..ENTRY_FILENAME_OFFSET + FILENAME_LENGTH],
            ),
            sectors: (bytes[ENTRY_SECTOR_COUNT_OFFSET] as u16) << 8
                | bytes[ENTRY_SECTOR_COUNT_OFFSET + 1] as u16,
            first_track: bytes[ENTRY_FIRST_TRACK_OFFSET],
            first_sector: bytes[ENTRY_FIRST_SECTOR_OFFSET],
            sector_map: bytes
                [ENTRY_SECTOR_MAP_OFFSET..ENTRY_SECTOR_MAP_OFFSET + SECTOR_MAP_LENGTH]
                .to_vec(),
            type_info,
            length: paged_length(&bytes[ENTRY_LENGTH_OFFSET..ENTRY_LENGTH_OFFSET + 3]),
            extension,
        })
    }

    /// Empty and deleted slots have a file type of zero.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.attributes.file_type == 0
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        self.extension.map_or(false, |e| e.is_directory)
    }

    /// The tag of the containing directory; SAMDOS entries are all at the root.
    #[inline]
    pub fn in_dir(&self) -> u8 {
        self.extension.map_or(0, |e| e.in_dir)
    }

    pub fn first_location(&self) -> Location {
        Location::from_link(self.first_track, self.first_sector)
    }

    pub fn type_label(&self) -> &'static str {
        self.variant.file_types().label(self.attributes.file_type)
    }
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:3}: {:10} {:8} {}",
            self.slot,
            self.filename.to_string(),
            self.length,
            self.type_label()
        )?;
        if f.alternate() {
            // verbose
            write!(
                f,
                " {}{}@{} {} sectors",
                if self.attributes.hidden { "H" } else { "-" },
                if self.attributes.protected { "P" } else { "-" },
                self.first_location(),
                self.sectors
            )?;
            if let Some(extension) = self.extension {
                write!(f, " tag={} in={}", extension.dir_tag, extension.in_dir)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{:?},{},{:?} @ {}",
            self.slot,
            self.filename,
            self.length,
            self.attributes,
            self.first_location()
        )
    }
}

/// Where a directory slot is stored: two records per sector, twenty per
/// track, starting at track 0 sector 1 on side 0.  `skip` shifts the layout
/// past reserved records.
fn slot_position(index: usize, skip: usize) -> (Location, usize) {
    let n = index + skip;
    let track = (n / 20) as u8;
    let sector = 1 + ((n % 20) / 2) as u8;
    let half = if index & 1 == 0 { 0 } else { ENTRY_SIZE };
    (Location::new(0, track, sector), half)
}

/// All directory slots of a disk, keyed by slot number.
#[derive(Clone)]
pub struct Directory {
    entries: BTreeMap<u16, DirectoryEntry>,
}

impl Directory {
    /// Number of slots in the base SAMDOS directory.
    pub const BASE_SLOTS: usize = 80;
    /// Records reserved at the start of the first extra directory track.
    const EXTRA_SKIP: usize = 2;

    /// Decode `BASE_SLOTS` entries, plus `extra_slots` more from the tracks
    /// following the base directory.
    pub fn read(
        store: &SectorStore,
        variant: Variant,
        extra_slots: usize,
    ) -> io::Result<Directory> {
        let mut entries = BTreeMap::new();
        for index in 0..Self::BASE_SLOTS + extra_slots {
            let skip = if index < Self::BASE_SLOTS {
                0
            } else {
                Self::EXTRA_SKIP
            };
            let (location, offset) = slot_position(index, skip);
            let block = store.read(location)?;
            debug_assert!(offset + ENTRY_SIZE <= BLOCK_SIZE);
            let slot = (index + 1) as u16;
            let entry =
                DirectoryEntry::from_bytes(slot, variant, &block[offset..offset + ENTRY_SIZE])?;
            entries.insert(slot, entry);
        }
        debug!("decoded {} directory slots", entries.len());
        Ok(Directory { entries })
    }

    pub fn get(&self, slot: u16) -> Option<&DirectoryEntry> {
        self.entries.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over every used slot in slot order.
    pub fn iter(&self) -> DirectoryIterator {
        DirectoryIterator::new(self, None)
    }

    /// Iterate over used slots contained in the directory with the given tag.
    pub fn iter_in(&self, dir_tag: u8) -> DirectoryIterator {
        DirectoryIterator::new(self, Some(dir_tag))
    }

    /// Find the directory entry that owns a tag.
    pub fn find_tag(&self, dir_tag: u8) -> Option<&DirectoryEntry> {
        self.entries.values().find(|e| {
            e.extension
                .map_or(false, |x| x.is_directory && x.dir_tag == dir_tag)
        })
    }
}

/// Lazily walks directory slots in order, skipping empty slots and, if a tag
/// filter is set, entries outside that directory.  Obtain a fresh iterator to
/// restart from the first slot.
pub struct DirectoryIterator<'a> {
    entries: btree_map::Values<'a, u16, DirectoryEntry>,
    dir_tag: Option<u8>,
}

impl<'a> DirectoryIterator<'a> {
    fn new(directory: &'a Directory, dir_tag: Option<u8>) -> DirectoryIterator<'a> {
        DirectoryIterator {
            entries: directory.entries.values(),
            dir_tag,
        }
    }
}

impl<'a> Iterator for DirectoryIterator<'a> {
    type Item = &'a DirectoryEntry;

    fn next(&mut self) -> Option<&'a DirectoryEntry> {
        let dir_tag = self.dir_tag;
        self.entries.find(|entry| {
            !entry.is_deleted() && dir_tag.map_or(true, |tag| entry.in_dir() == tag)
        })
    }
}
