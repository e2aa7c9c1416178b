use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

use crate::vdfs::catalog::{Catalog, CatalogFile};
use crate::vdfs::header::{ArchiveVersion, VdfHeader};
use crate::vdfs::{VdfsError, VdfsResult, ENTRY_SIZE, HEADER_SIZE};

/// One opened `.vdf` file: header, catalog and the file list derived from it.
#[derive(Debug)]
pub struct VdfArchive<R = File> {
    label:   String,
    header:  VdfHeader,
    catalog: Catalog,
    files:   Vec<CatalogFile>,
    reader:  R,
    len:     u64,
}

impl VdfArchive<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> VdfsResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(file, path.display().to_string())
    }
}

impl<R: Read + Seek> VdfArchive<R> {
    pub fn from_reader(mut reader: R, label: impl Into<String>) -> VdfsResult<Self> {
        let label = label.into();
        let len = reader.seek(SeekFrom::End(0))?;
        if len < HEADER_SIZE as u64 {
            return Err(VdfsError::Truncated { offset: 0, need: HEADER_SIZE as u64, have: len });
        }

        reader.seek(SeekFrom::Start(0))?;
        let header = VdfHeader::read(&mut reader)?;

        let cat_offset = u64::from(header.root_cat_offset);
        let cat_len = u64::from(header.num_entries) * ENTRY_SIZE as u64;
        if cat_offset + cat_len > len {
            return Err(VdfsError::Truncated {
                offset: cat_offset,
                need:   cat_len,
                have:   len.saturating_sub(cat_offset),
            });
        }

        reader.seek(SeekFrom::Start(cat_offset))?;
        let catalog = Catalog::read(&mut reader, header.num_entries)?;
        let files = catalog.build_index()?;
        if files.len() != header.num_files as usize {
            warn!(
                archive = %label,
                declared = header.num_files,
                found = files.len(),
                "file count does not match the header"
            );
        }
        debug!(archive = %label, entries = catalog.len(), files = files.len(), "opened VDFS archive");

        Ok(Self { label, header, catalog, files, reader, len })
    }

    /// Read `size` bytes at `offset`.  The range must lie inside the archive.
    pub fn read_range(&mut self, offset: u64, size: u64) -> VdfsResult<Vec<u8>> {
        let end = offset.checked_add(size).filter(|&end| end <= self.len);
        if end.is_none() {
            return Err(VdfsError::Truncated {
                offset,
                need: size,
                have: self.len.saturating_sub(offset),
            });
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::with_capacity(size as usize);
        (&mut self.reader).take(size).read_to_end(&mut buf)?;
        if (buf.len() as u64) < size {
            return Err(VdfsError::Truncated { offset, need: size, have: buf.len() as u64 });
        }
        Ok(buf)
    }

    pub fn read_file(&mut self, file: &CatalogFile) -> VdfsResult<Vec<u8>> {
        self.read_range(file.offset, file.size)
    }
}

impl<R> VdfArchive<R> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn header(&self) -> &VdfHeader {
        &self.header
    }

    pub fn version(&self) -> ArchiveVersion {
        self.header.archive_version()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn files(&self) -> &[CatalogFile] {
        &self.files
    }

    /// Archive size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
