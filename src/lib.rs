//! This is a Rust library for reading SAM Coupé floppy disk images and
//! listing the SAM BASIC programs stored on them.
//!
//! Features:
//!
//! * Load MGT disk images (819200 bytes), raw or inside a zip or gzip
//! container.
//! * Iterate SAMDOS directories, and MasterDOS directories with extra
//! directory tracks and subdirectories.
//! * Extract files by following their sector chains.
//! * Detokenize SAM BASIC programs, including cached numbers.
//! * Decode the numeric, string and array variables saved with a program.
//! * A sample `samdisk` program for inspecting disk images from the command
//! line.
//!
//! # Example
//!
//! The following example opens a disk image and lists every BASIC program on
//! it:
//!
//! ```
//! use std::io;
//! use samdisk::basic::Program;
//! use samdisk::disk::{self, Dos};
//! use samdisk::disk::directory::{Variant, FILE_TYPE_BASIC};
//! # fn list_programs(disk_image_filename: &str) -> io::Result<()> {
//! # let disk_image_filename = "/tmp/disk.mgt";
//!
//! let dos = disk::open_dos(disk_image_filename, Variant::SamDos)?;
//! for entry in dos.iter() {
//!     if entry.attributes.file_type == FILE_TYPE_BASIC {
//!         let file = dos.open_file_from_entry(entry)?;
//!         println!("{}", Program::decode(&file));
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design of disk image access
//!
//! Support for disk images is built in layers:
//!
//! 1. `disk::image` turns a container file into a flat byte buffer.
//! 2. `SectorStore` divides the buffer into sides, tracks and sectors
//!    according to a `Geometry`.
//! 3. `Directory` decodes the 256-byte directory records of a SAMDOS or
//!    MasterDOS disk.
//! 4. The `Dos` trait exposes the high level operations, such as resolving a
//!    name and extracting a `File`.
//! 5. `basic::Program` decodes the contents of a BASIC file.
//!
//! Disk access is read-only.  Sector numbers start at 1, tracks and sides at
//! 0.

pub mod basic;
pub mod disk;

mod util;
