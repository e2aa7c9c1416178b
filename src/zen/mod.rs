//! ZEN world archives.
//!
//! ```no_run
//! use zenvdfs::zen::{ParseOptions, ZenArchive};
//!
//! let archive = ZenArchive::open("NEWWORLD.ZEN", ParseOptions::default())?;
//! let world = archive.world();
//! println!("{} objects, {} nodes", world.object_count, world.root.count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A document is a text preamble ([`header`]), an encoding-specific header
//! and a stream of nested chunks read through one of the [`codec`]s.  The
//! [`tree`] reader turns that stream into [`WorldObjectNode`]s.

pub mod codec;
pub mod header;
pub mod schema;
pub mod text;
pub mod tree;
pub mod value;

use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::cursor::{ByteCursor, CursorError};

pub use codec::{get_codec, ChunkHeader, Codec, ImplHeader, Token};
pub use header::{ArchiveHeader, Encoding};
pub use schema::{FieldSpec, Schema};
pub use tree::{ChunkTreeReader, MeshBlock, WorldObjectNode};
pub use value::{Color, Entry, Value, ValueKind};

/// Class of the top-level world object.
pub const DEFAULT_ROOT_CLASS: &str = "oCWorld:zCWorld";
pub const DEFAULT_MAX_DEPTH:  usize = 256;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ZenError {
    #[error("malformed archive: {0}")]
    Format(String),
    #[error("archive truncated at offset {offset:#x} (need {need} bytes, have {have})")]
    Truncated { offset: usize, need: usize, have: usize },
    #[error("type mismatch at offset {offset:#x}: expected {expected}, found {found}")]
    TypeMismatch { offset: usize, expected: ValueKind, found: ValueKind },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CursorError> for ZenError {
    fn from(e: CursorError) -> Self {
        let CursorError::OutOfRange { offset, need, have } = e;
        ZenError::Truncated { offset, need, have }
    }
}

pub type ZenResult<T> = Result<T, ZenError>;

// ── ParseOptions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Top-level class to descend into; other top-level chunks are skipped.
    pub root_class: String,
    pub max_depth:  usize,
    /// Field layouts, consulted by the BINARY codec only.
    pub schema:     Arc<Schema>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            root_class: DEFAULT_ROOT_CLASS.to_owned(),
            max_depth:  DEFAULT_MAX_DEPTH,
            schema:     Arc::new(Schema::default()),
        }
    }
}

impl ParseOptions {
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Arc::new(schema);
        self
    }
}

// ── ZenWorld ──────────────────────────────────────────────────────────────────

/// A fully decoded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZenWorld {
    pub header:       ArchiveHeader,
    pub object_count: u32,
    pub root:         WorldObjectNode,
    /// World mesh found at top level, before the root chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh:         Option<MeshBlock>,
}

// ── ZenReader ─────────────────────────────────────────────────────────────────

/// Low-level reader: preamble and implementation header are consumed on
/// construction, after which the chunk stream can be pulled item by item or
/// read as a whole with [`ZenReader::read_world`].
pub struct ZenReader<'a> {
    cursor:      ByteCursor<'a>,
    header:      ArchiveHeader,
    impl_header: ImplHeader,
    codec:       Box<dyn Codec>,
    options:     ParseOptions,
}

impl<'a> ZenReader<'a> {
    pub fn new(data: &'a [u8], options: ParseOptions) -> ZenResult<Self> {
        let mut cursor = ByteCursor::new(data);
        let header = ArchiveHeader::read(&mut cursor)?;
        let mut codec = get_codec(header.encoding, Arc::clone(&options.schema));
        debug!(encoding = %header.encoding, version = header.version, "selected codec");
        let impl_header = codec.read_impl_header(&mut cursor)?;
        Ok(Self { cursor, header, impl_header, codec, options })
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn impl_header(&self) -> ImplHeader {
        self.impl_header
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn peek(&self) -> ZenResult<Token> {
        self.codec.peek(&self.cursor)
    }

    pub fn read_chunk_start(&mut self) -> ZenResult<ChunkHeader> {
        self.codec.read_chunk_start(&mut self.cursor)
    }

    pub fn read_chunk_end(&mut self) -> ZenResult<()> {
        self.codec.read_chunk_end(&mut self.cursor)
    }

    pub fn read_entry(&mut self, expected: ValueKind) -> ZenResult<Entry> {
        self.codec.read_entry(&mut self.cursor, expected)
    }

    pub fn skip_entry(&mut self) -> ZenResult<()> {
        self.codec.skip_entry(&mut self.cursor)
    }

    pub fn skip_chunk(&mut self) -> ZenResult<()> {
        self.codec.skip_chunk(&mut self.cursor)
    }

    pub fn read_world(mut self) -> ZenResult<ZenWorld> {
        let (root, mesh) =
            ChunkTreeReader::new(self.codec.as_mut(), &self.options).read_world(&mut self.cursor)?;
        Ok(ZenWorld {
            header: self.header,
            object_count: self.impl_header.object_count,
            root,
            mesh,
        })
    }
}

// ── ZenArchive ────────────────────────────────────────────────────────────────

/// An owned document together with its decoded world.
#[derive(Debug, Clone)]
pub struct ZenArchive {
    data:  Vec<u8>,
    world: ZenWorld,
}

impl ZenArchive {
    /// Load a file wholesale and decode it.
    pub fn open<P: AsRef<Path>>(path: P, options: ParseOptions) -> ZenResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, options)
    }

    pub fn from_bytes(data: Vec<u8>, options: ParseOptions) -> ZenResult<Self> {
        let world = ZenReader::new(&data, options)?.read_world()?;
        Ok(Self { data, world })
    }

    pub fn world(&self) -> &ZenWorld {
        &self.world
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.world.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of the world mesh, if the document embeds one.
    pub fn mesh_bytes(&self) -> Option<&[u8]> {
        self.world.mesh.as_ref().and_then(|m| m.bytes(&self.data))
    }

    pub fn into_world(self) -> ZenWorld {
        self.world
    }
}
