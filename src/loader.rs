//! Loading worlds by name through the mounted archives.

use std::io::{self, Read, Seek};
use std::fs::File;
use thiserror::Error;
use tracing::{error, info};

use crate::vdfs::{FileIndex, VdfsError};
use crate::zen::{ParseOptions, ZenArchive, ZenError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Zen(#[from] ZenError),
    #[error(transparent)]
    Vdfs(#[from] VdfsError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Resolves world documents and visuals by name.
///
/// A world is looked up in the [`FileIndex`] first and read from disk if no
/// mounted archive has it.  A world that fails to load is reported and the
/// previously loaded one stays current.
pub struct WorldLoader<R = File> {
    index:   FileIndex<R>,
    options: ParseOptions,
    current: Option<ZenArchive>,
}

impl<R: Read + Seek> WorldLoader<R> {
    pub fn new(index: FileIndex<R>, options: ParseOptions) -> Self {
        Self { index, options, current: None }
    }

    pub fn index(&self) -> &FileIndex<R> {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut FileIndex<R> {
        &mut self.index
    }

    pub fn current(&self) -> Option<&ZenArchive> {
        self.current.as_ref()
    }

    pub fn load_world(&mut self, name: &str) -> Result<&ZenArchive, LoadError> {
        match self.try_load(name) {
            Ok(archive) => {
                info!(world = name, objects = archive.world().object_count, "loaded world");
                Ok(self.current.insert(archive))
            }
            Err(e) => {
                error!(world = name, reason = %e, "failed to load ZEN file");
                Err(e)
            }
        }
    }

    fn try_load(&mut self, name: &str) -> Result<ZenArchive, LoadError> {
        let data = match self.index.read(name) {
            Ok(data) => data,
            Err(VdfsError::NotFound(_)) => std::fs::read(name)?,
            Err(e) => return Err(e.into()),
        };
        Ok(ZenArchive::from_bytes(data, self.options.clone())?)
    }

    /// Map a visual name to the file that should be loaded for it.  Static
    /// meshes named `*.3DS` are shipped precompiled as `*.MRM`.
    pub fn resolve_visual(&self, visual: &str) -> Option<String> {
        let upper = visual.to_uppercase();
        if let Some(pos) = upper.find(".3DS").filter(|&p| p > 0) {
            let compiled = format!("{}.MRM", &upper[..pos]);
            return self.index.contains(&compiled).then_some(compiled);
        }
        self.index.contains(visual).then(|| visual.to_owned())
    }
}
