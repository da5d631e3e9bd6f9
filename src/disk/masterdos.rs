use std::io;

use log::debug;

use crate::disk::directory::{Directory, DirectoryIterator, Variant};
use crate::disk::{DiskError, Dos, Location, SectorStore};

const DEFAULT_DISK_NAME: &str = "MASTER DOS";
const DISK_NAME_OFFSET: usize = 210;
const DISK_NAME_LENGTH: usize = 10;
const EXTRA_TRACKS_OFFSET: usize = 255;
/// Slots contributed by each extra directory track, less the two records
/// reserved on the first one.
const SLOTS_PER_TRACK: usize = 20;
const RESERVED_SLOTS: usize = 2;

/// The slot number standing for the root directory.
pub const ROOT: u16 = 0;
const ROOT_TAG: u8 = 0;

/// Separates directory names in `pwd()`.
const PATH_DELIMITER: &str = "\\";
const ROOT_PATH: &str = ":";

/// A disk with a MasterDOS directory: the SAMDOS layout, optional extra
/// directory tracks, and one level of directory tags tying entries to
/// subdirectories.
pub struct MasterDos {
    store: SectorStore,
    directory: Directory,
    name: String,
    current: u16,
}

impl MasterDos {
    pub fn new(store: SectorStore) -> io::Result<MasterDos> {
        let (extra_tracks, name) = {
            let first = store.read(Location::new(0, 0, 1))?;
            let name = if first[DISK_NAME_OFFSET] != 0 {
                String::from_utf8_lossy(&first[DISK_NAME_OFFSET..DISK_NAME_OFFSET + DISK_NAME_LENGTH])
                    .trim()
                    .to_string()
            } else {
                DEFAULT_DISK_NAME.to_string()
            };
            (first[EXTRA_TRACKS_OFFSET] as usize, name)
        };
        let extra_slots = if extra_tracks > 0 {
            SLOTS_PER_TRACK * extra_tracks - RESERVED_SLOTS
        } else {
            0
        };
        debug!(
            "MasterDOS disk \"{}\" with {} extra directory tracks",
            name, extra_tracks
        );
        let directory = Directory::read(&store, Variant::MasterDos, extra_slots)?;
        Ok(MasterDos {
            store,
            directory,
            name,
            current: ROOT,
        })
    }

    /// The slot of the working directory (`ROOT` for the root).
    pub fn current_dir(&self) -> u16 {
        self.current
    }

    /// The tag identifying the contents of a directory slot.
    fn tag_of(&self, slot: u16) -> io::Result<u8> {
        if slot == ROOT {
            return Ok(ROOT_TAG);
        }
        let entry = self.entry(slot)?;
        match entry.extension {
            Some(extension) if extension.is_directory => Ok(extension.dir_tag),
            _ => Err(DiskError::NotADirectory.into()),
        }
    }

    /// Change the working directory.  `ROOT` returns to the root.
    pub fn cd(&mut self, slot: u16) -> io::Result<()> {
        if slot != ROOT && self.entry(slot)?.is_deleted() {
            return Err(DiskError::NotFound.into());
        }
        self.tag_of(slot)?;
        self.current = slot;
        Ok(())
    }

    /// Change to the directory containing the working directory.
    pub fn cd_up(&mut self) -> io::Result<()> {
        let parent = self.parent_dir(self.current)?;
        self.current = self.slot_of_tag(parent);
        Ok(())
    }

    /// Return the tag of the directory containing `slot`, or the root tag
    /// when `slot` is the root.
    pub fn parent_dir(&self, slot: u16) -> io::Result<u8> {
        if slot == ROOT {
            return Ok(ROOT_TAG);
        }
        Ok(self.entry(slot)?.in_dir())
    }

    fn slot_of_tag(&self, tag: u8) -> u16 {
        if tag == ROOT_TAG {
            return ROOT;
        }
        self.directory.find_tag(tag).map_or(ROOT, |e| e.slot)
    }

    /// The path of the working directory.
    pub fn pwd(&self) -> String {
        self.path_of(self.current)
    }

    /// The path of a directory slot, built from the names of its ancestors.
    pub fn path_of(&self, slot: u16) -> String {
        let mut names = Vec::new();
        let mut slot = slot;
        // Malformed tags could form a cycle; no path is deeper than the
        // directory itself.
        for _ in 0..self.directory.len() {
            if slot == ROOT {
                break;
            }
            let entry = match self.directory.get(slot) {
                Some(entry) => entry,
                None => break,
            };
            names.push(entry.filename.trimmed());
            slot = self.slot_of_tag(entry.in_dir());
        }
        let mut path = ROOT_PATH.to_string();
        for name in names.iter().rev() {
            path.push_str(PATH_DELIMITER);
            path.push_str(name);
        }
        path
    }
}

impl Dos for MasterDos {
    fn variant(&self) -> Variant {
        Variant::MasterDos
    }

    fn store(&self) -> &SectorStore {
        &self.store
    }

    fn directory(&self) -> &Directory {
        &self.directory
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Only entries inside the working directory are visible.
    fn iter(&self) -> DirectoryIterator<'_> {
        let tag = self.tag_of(self.current).unwrap_or(ROOT_TAG);
        self.directory.iter_in(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::directory::FILE_TYPE_DIRECTORY;
    use crate::disk::{BLOCK_SIZE, MGT_GEOMETRY};

    const ENTRY_SIZE: usize = 256;

    fn put_record(
        store: &mut SectorStore,
        location: Location,
        second_half: bool,
        file_type: u8,
        name: &[u8],
        dir_tag: u8,
        in_dir: u8,
    ) {
        let mut sector = store.read(location).unwrap().to_vec();
        let base = if second_half { ENTRY_SIZE } else { 0 };
        sector[base] = file_type;
        sector[base + 1..base + 11].copy_from_slice(b"          ");
        sector[base + 1..base + 1 + name.len()].copy_from_slice(name);
        sector[base + 250] = dir_tag;
        sector[base + 254] = in_dir;
        store.write(location, &sector).unwrap();
    }

    /// Slot 1: "games" directory (tag 1); slot 2: "tools" directory inside
    /// games (tag 2); slot 3: a root file; slot 4: a file in games; slot 5:
    /// a file in tools.
    fn sample_store() -> SectorStore {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        let t0s1 = Location::new(0, 0, 1);
        let t0s2 = Location::new(0, 0, 2);
        let t0s3 = Location::new(0, 0, 3);
        put_record(&mut store, t0s1, false, FILE_TYPE_DIRECTORY, b"games", 1, 0);
        put_record(&mut store, t0s1, true, FILE_TYPE_DIRECTORY, b"tools", 2, 1);
        put_record(&mut store, t0s2, false, 16, b"root", 0, 0);
        put_record(&mut store, t0s2, true, 19, b"inside", 0, 1);
        put_record(&mut store, t0s3, false, 19, b"deeper", 0, 2);
        store
    }

    fn visible(dos: &MasterDos) -> Vec<u16> {
        dos.iter().map(|e| e.slot).collect()
    }

    #[test]
    fn test_default_name_and_size() {
        let dos = MasterDos::new(SectorStore::new(MGT_GEOMETRY)).unwrap();
        assert_eq!(dos.name(), "MASTER DOS");
        assert_eq!(dos.directory().len(), 80);
        assert!(visible(&dos).is_empty());
    }

    #[test]
    fn test_disk_name_and_extra_tracks() {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        let mut first = [0u8; BLOCK_SIZE];
        first[DISK_NAME_OFFSET..DISK_NAME_OFFSET + 10].copy_from_slice(b"MY DISK   ");
        first[EXTRA_TRACKS_OFFSET] = 2;
        store.write(Location::new(0, 0, 1), &first).unwrap();
        // The first extra slot (81) lives on track 4, sector 2.
        put_record(&mut store, Location::new(0, 4, 2), false, 19, b"extra", 0, 0);

        let dos = MasterDos::new(store).unwrap();
        assert_eq!(dos.name(), "MY DISK");
        assert_eq!(dos.directory().len(), 80 + 38);
        assert_eq!(dos.entry(81).unwrap().filename.trimmed(), "extra");
        assert_eq!(visible(&dos), vec![81]);
    }

    #[test]
    fn test_working_directory_filtering() {
        let mut dos = MasterDos::new(sample_store()).unwrap();
        assert_eq!(visible(&dos), vec![1, 3]);
        assert_eq!(dos.pwd(), ":");

        dos.cd(1).unwrap();
        assert_eq!(visible(&dos), vec![2, 4]);
        assert_eq!(dos.pwd(), ":\\games");

        dos.cd(2).unwrap();
        assert_eq!(visible(&dos), vec![5]);
        assert_eq!(dos.pwd(), ":\\games\\tools");
        assert_eq!(dos.parent_dir(2).unwrap(), 1);

        dos.cd_up().unwrap();
        assert_eq!(dos.current_dir(), 1);
        dos.cd_up().unwrap();
        assert_eq!(dos.current_dir(), ROOT);
        assert_eq!(dos.parent_dir(ROOT).unwrap(), 0);
        assert_eq!(visible(&dos), vec![1, 3]);
    }

    #[test]
    fn test_cd_errors() {
        let mut dos = MasterDos::new(sample_store()).unwrap();
        let e = dos.cd(3).unwrap_err();
        assert!(e == DiskError::NotADirectory);
        let e = dos.cd(60).unwrap_err();
        assert!(e == DiskError::NotFound);
        let e = dos.cd(200).unwrap_err();
        assert!(e == DiskError::NotFound);
        assert_eq!(dos.current_dir(), ROOT);
    }

    #[test]
    fn test_pwd_survives_tag_cycle() {
        let mut store = SectorStore::new(MGT_GEOMETRY);
        let t0s1 = Location::new(0, 0, 1);
        put_record(&mut store, t0s1, false, FILE_TYPE_DIRECTORY, b"a", 1, 2);
        put_record(&mut store, t0s1, true, FILE_TYPE_DIRECTORY, b"b", 2, 1);
        let dos = MasterDos::new(store).unwrap();
        assert!(dos.path_of(1).starts_with(":\\"));
    }
}
