use std::io;

use crate::disk::directory::{Directory, Variant};
use crate::disk::{Dos, SectorStore};

const DISK_NAME: &str = "SAM DOS";

/// A disk with a flat, 80-slot SAMDOS directory.
pub struct SamDos {
    store: SectorStore,
    directory: Directory,
}

impl SamDos {
    pub fn new(store: SectorStore) -> io::Result<SamDos> {
        let directory = Directory::read(&store, Variant::SamDos, 0)?;
        Ok(SamDos { store, directory })
    }
}

impl Dos for SamDos {
    fn variant(&self) -> Variant {
        Variant::SamDos
    }

    fn store(&self) -> &SectorStore {
        &self.store
    }

    fn directory(&self) -> &Directory {
        &self.directory
    }

    fn name(&self) -> &str {
        DISK_NAME
    }
}
