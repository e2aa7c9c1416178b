use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

use crate::vdfs::archive::VdfArchive;
use crate::vdfs::{normalize_name, VdfsError, VdfsResult};

/// Handle of a mounted archive, unique within one [`FileIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArchiveId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub archive: ArchiveId,
    /// Full path inside the archive.
    pub path:    String,
    pub offset:  u64,
    pub size:    u64,
}

/// Name → location table over a stack of mounted archives.
///
/// Names are matched by [`normalize_name`].  When two archives contain the
/// same name, the one mounted later wins.
#[derive(Debug)]
pub struct FileIndex<R = File> {
    archives: Vec<(ArchiveId, VdfArchive<R>)>,
    files:    HashMap<String, FileRecord>,
    next_id:  u32,
}

impl<R> Default for FileIndex<R> {
    fn default() -> Self {
        Self { archives: Vec::new(), files: HashMap::new(), next_id: 0 }
    }
}

impl FileIndex<File> {
    pub fn load_vdf<P: AsRef<Path>>(&mut self, path: P) -> VdfsResult<ArchiveId> {
        let archive = VdfArchive::open(path)?;
        Ok(self.mount(archive))
    }
}

impl<R> FileIndex<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `archive` on top of the stack.  The merged table is built aside
    /// and swapped in whole.
    pub fn mount(&mut self, archive: VdfArchive<R>) -> ArchiveId {
        let id = ArchiveId(self.next_id);
        self.next_id += 1;

        let mut files = self.files.clone();
        let overridden = merge(&mut files, id, &archive);
        debug!(
            archive = %archive.label(),
            id = id.0,
            files = archive.files().len(),
            overridden,
            "mounted archive"
        );

        self.files = files;
        self.archives.push((id, archive));
        id
    }

    /// Remove an archive.  Names it had overridden fall back to whichever
    /// remaining archive was mounted last.
    pub fn unmount(&mut self, id: ArchiveId) -> Option<VdfArchive<R>> {
        let pos = self.archives.iter().position(|(a, _)| *a == id)?;
        let (_, archive) = self.archives.remove(pos);

        let mut files = HashMap::new();
        for (id, archive) in &self.archives {
            merge(&mut files, *id, archive);
        }
        self.files = files;
        debug!(archive = %archive.label(), id = id.0, "unmounted archive");
        Some(archive)
    }

    pub fn lookup(&self, name: &str) -> VdfsResult<&FileRecord> {
        self.files
            .get(&normalize_name(name))
            .ok_or_else(|| VdfsError::NotFound(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(&normalize_name(name))
    }

    /// All resolved files, sorted by normalized name.
    pub fn files(&self) -> Vec<(&str, &FileRecord)> {
        let mut v: Vec<_> = self.files.iter().map(|(k, r)| (k.as_str(), r)).collect();
        v.sort_by(|a, b| a.0.cmp(b.0));
        v
    }

    pub fn archives(&self) -> impl Iterator<Item = (ArchiveId, &VdfArchive<R>)> {
        self.archives.iter().map(|(id, a)| (*id, a))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<R: Read + Seek> FileIndex<R> {
    /// Read the whole file `name` from the archive that owns it.
    pub fn read(&mut self, name: &str) -> VdfsResult<Vec<u8>> {
        let record = self.lookup(name)?.clone();
        let archive = self
            .archives
            .iter_mut()
            .find(|(id, _)| *id == record.archive)
            .map(|(_, a)| a)
            .ok_or_else(|| {
                VdfsError::IndexCorruption(format!("`{name}` maps to unmounted archive {}", record.archive.0))
            })?;
        archive.read_range(record.offset, record.size)
    }
}

/// Insert `archive`'s files into `files`; returns how many names it replaced.
fn merge<R>(files: &mut HashMap<String, FileRecord>, id: ArchiveId, archive: &VdfArchive<R>) -> usize {
    let mut overridden = 0;
    for f in archive.files() {
        let record = FileRecord { archive: id, path: f.path.clone(), offset: f.offset, size: f.size };
        if files.insert(normalize_name(&f.name), record).is_some() {
            overridden += 1;
        }
    }
    overridden
}
