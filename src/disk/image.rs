use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use log::{debug, info};
use memmap::{Mmap, MmapOptions};
use zip::ZipArchive;

use crate::disk::error::DiskError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// The container wrapped around a disk image file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Raw,
    Zip,
    Gzip,
}

impl Container {
    /// Identify the container from the leading bytes of a file.
    pub fn detect(bytes: &[u8]) -> Container {
        if bytes.starts_with(ZIP_MAGIC) {
            Container::Zip
        } else if bytes.starts_with(GZIP_MAGIC) {
            Container::Gzip
        } else {
            Container::Raw
        }
    }
}

/// Map a container file read-only and return the flat disk image it holds.
pub fn read_container<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        // Zero-length files cannot be mapped.
        return Ok(Vec::new());
    }
    let mmap: Mmap = unsafe { MmapOptions::new().map(&file)? };
    unpack(&mmap[..])
}

/// Strip any zip or gzip wrapping from an in-memory container.  Zip archives
/// yield their first member.
pub fn unpack(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let container = Container::detect(bytes);
    info!("container format: {:?}", container);
    let mut data = Vec::new();
    match container {
        Container::Raw => data.extend_from_slice(bytes),
        Container::Zip => {
            let mut archive = ZipArchive::new(Cursor::new(bytes))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            if archive.len() == 0 {
                return Err(DiskError::UnknownFormat.into());
            }
            let mut member = archive
                .by_index(0)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            debug!("reading zip member \"{}\"", member.name());
            member.read_to_end(&mut data)?;
        }
        Container::Gzip => {
            GzDecoder::new(bytes).read_to_end(&mut data)?;
        }
    }
    Ok(data)
}
