//! The entry table and its directory walk.
//!
//! Entries form one flat array.  Each directory level is a run of
//! consecutive entries ending at the one flagged [`ENTRY_LAST`]; a directory
//! entry's `jump_to` is the index of its first child, a file entry's
//! `jump_to` is its data offset in the archive.

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Read;

use crate::vdfs::{VdfsError, VdfsResult, ENTRY_DIR, ENTRY_LAST};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VdfEntry {
    pub name:       String,
    pub jump_to:    u32,
    pub size:       u32,
    pub kind:       u32,
    pub attributes: u32,
}

impl VdfEntry {
    pub fn read<R: Read>(mut reader: R) -> VdfsResult<Self> {
        let mut name = [0u8; 64];
        reader.read_exact(&mut name)?;
        let jump_to = reader.read_u32::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let kind = reader.read_u32::<LittleEndian>()?;
        let attributes = reader.read_u32::<LittleEndian>()?;

        // names are space padded, sometimes NUL terminated
        let name = name
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect::<String>();

        Ok(Self {
            name: name.trim_end().to_owned(),
            jump_to,
            size,
            kind,
            attributes,
        })
    }

    pub fn is_dir(&self) -> bool {
        self.kind & ENTRY_DIR != 0
    }

    pub fn is_last(&self) -> bool {
        self.kind & ENTRY_LAST != 0
    }
}

/// A file found by [`Catalog::build_index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogFile {
    /// Directory components joined with `\`, ending in the file name.
    pub path:   String,
    pub name:   String,
    pub offset: u64,
    pub size:   u64,
    /// Position in the entry table.
    pub entry:  usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub entries: Vec<VdfEntry>,
}

struct Level {
    next:   usize,
    prefix: String,
}

impl Catalog {
    pub fn new(entries: Vec<VdfEntry>) -> Self {
        Self { entries }
    }

    /// Read exactly `count` consecutive entries.
    pub fn read<R: Read>(mut reader: R, count: u32) -> VdfsResult<Self> {
        let entries = (0..count)
            .map(|_| VdfEntry::read(&mut reader))
            .collect::<VdfsResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk the directory tree from entry 0 and list every file in catalog
    /// order.  Every entry may be visited once; a second visit means the
    /// table loops back on itself.
    pub fn build_index(&self) -> VdfsResult<Vec<CatalogFile>> {
        let mut files = Vec::new();
        if self.entries.is_empty() {
            return Ok(files);
        }

        let mut visited = vec![false; self.entries.len()];
        let mut stack = vec![Level { next: 0, prefix: String::new() }];

        while let Some(level) = stack.last_mut() {
            let i = level.next;
            let entry = self.entries.get(i).ok_or_else(|| {
                VdfsError::IndexCorruption(format!(
                    "directory level runs past the end of the table ({} entries)", self.entries.len()
                ))
            })?;
            if std::mem::replace(&mut visited[i], true) {
                return Err(VdfsError::IndexCorruption(format!("entry {i} is reachable twice")));
            }

            let path = format!("{}{}", level.prefix, entry.name);
            if entry.is_last() {
                stack.pop();
            } else {
                level.next = i + 1;
            }

            if entry.is_dir() {
                let child = entry.jump_to as usize;
                if child >= self.entries.len() {
                    return Err(VdfsError::IndexCorruption(format!(
                        "directory `{}` points at entry {child} of {}", entry.name, self.entries.len()
                    )));
                }
                stack.push(Level { next: child, prefix: format!("{path}\\") });
            } else {
                files.push(CatalogFile {
                    path,
                    name:   entry.name.clone(),
                    offset: u64::from(entry.jump_to),
                    size:   u64::from(entry.size),
                    entry:  i,
                });
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(name: &str, jump_to: u32, size: u32, kind: u32) -> VdfEntry {
        VdfEntry { name: name.into(), jump_to, size, kind, attributes: 0 }
    }

    #[test]
    fn walks_nested_directories() {
        // 0 WORLDS/ -> 2     1 README.TXT (last)
        // 2 A.ZEN           3 SUB/ -> 4 (last)
        // 4 B.ZEN (last)
        let cat = Catalog::new(vec![
            e("WORLDS", 2, 0, ENTRY_DIR),
            e("README.TXT", 1000, 5, ENTRY_LAST),
            e("A.ZEN", 2000, 10, 0),
            e("SUB", 4, 0, ENTRY_DIR | ENTRY_LAST),
            e("B.ZEN", 3000, 20, ENTRY_LAST),
        ]);
        let files = cat.build_index().unwrap();
        let got: Vec<_> = files.iter().map(|f| (f.path.as_str(), f.offset, f.size)).collect();
        assert_eq!(
            got,
            [
                ("WORLDS\\A.ZEN", 2000, 10),
                ("WORLDS\\SUB\\B.ZEN", 3000, 20),
                ("README.TXT", 1000, 5),
            ]
        );
    }

    #[test]
    fn directory_pointing_at_itself_is_a_cycle() {
        let cat = Catalog::new(vec![e("LOOP", 0, 0, ENTRY_DIR | ENTRY_LAST)]);
        assert!(matches!(cat.build_index(), Err(VdfsError::IndexCorruption(_))));
    }

    #[test]
    fn missing_last_flag_runs_off_the_table() {
        let cat = Catalog::new(vec![e("A", 0, 1, 0), e("B", 0, 1, 0)]);
        assert!(matches!(cat.build_index(), Err(VdfsError::IndexCorruption(_))));
    }

    #[test]
    fn jump_out_of_range() {
        let cat = Catalog::new(vec![e("D", 9, 0, ENTRY_DIR | ENTRY_LAST)]);
        assert!(matches!(cat.build_index(), Err(VdfsError::IndexCorruption(_))));
    }
}
