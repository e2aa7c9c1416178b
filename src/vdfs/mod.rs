//! VDFS packed file systems.
//!
//! A `.vdf` file is a 296-byte [`header::VdfHeader`], a flat catalog of
//! 80-byte [`catalog::VdfEntry`] records describing a directory tree, and the
//! file payloads.  [`FileIndex`] stacks several archives and resolves file
//! names across them; archives mounted later override earlier ones.
//!
//! # Endianness
//! All integers are little-endian; structures are unpadded.

pub mod archive;
pub mod catalog;
pub mod header;
pub mod index;

use std::io;
use thiserror::Error;

pub use archive::VdfArchive;
pub use catalog::{Catalog, CatalogFile, VdfEntry};
pub use header::{ArchiveVersion, VdfHeader, VdfTime};
pub use index::{ArchiveId, FileIndex, FileRecord};

pub const SIGNATURE_G1: &[u8; 16] = b"PSVDSC_V2.00\n\r\n\r";
pub const SIGNATURE_G2: &[u8; 16] = b"PSVDSC_V2.00\r\n\r\n";

pub const HEADER_SIZE: usize = 296;
pub const ENTRY_SIZE:  usize = 80;

/// Entry is a directory; `jump_to` is the index of its first child.
pub const ENTRY_DIR:  u32 = 0x8000_0000;
/// Entry is the last one of its directory level.
pub const ENTRY_LAST: u32 = 0x4000_0000;

#[derive(Error, Debug)]
pub enum VdfsError {
    #[error("Invalid VDFS signature")]
    InvalidSignature,
    #[error("VDFS data truncated at offset {offset:#x} (need {need} bytes, have {have})")]
    Truncated { offset: u64, need: u64, have: u64 },
    #[error("Corrupt VDFS catalog: {0}")]
    IndexCorruption(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type VdfsResult<T> = Result<T, VdfsError>;

/// Lookup key for a file name: directories dropped, surrounding blanks
/// trimmed, upper-cased.  `_work\\Data\\Worlds\\world.zen` → `WORLD.ZEN`.
pub fn normalize_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .to_uppercase()
}
