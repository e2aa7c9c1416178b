//! Encoding codecs: one [`Codec`] implementation per physical ZEN encoding.
//!
//! The codec is chosen once, from the [`Encoding`] named in the preamble, and
//! drives the rest of the document.  All three share the same logical model:
//! a stream of chunk starts, typed entries and chunk ends.
//!
//! | Encoding | Chunk markers            | Entries                            |
//! |----------|--------------------------|------------------------------------|
//! | ASCII    | `[name class ver id]`/`[]` lines | `key=kind:value` lines     |
//! | BINARY   | size-prefixed header, implicit end | untagged, fixed width    |
//! | BIN_SAFE | string entries           | `tag, u16 length, payload`         |

pub mod ascii;
pub mod binary;
pub mod binsafe;

use serde::Serialize;
use std::sync::Arc;

use crate::cursor::ByteCursor;
use crate::zen::header::Encoding;
use crate::zen::schema::Schema;
use crate::zen::tree::MeshBlock;
use crate::zen::value::{Entry, ValueKind};
use crate::zen::{ZenError, ZenResult};

pub use ascii::AsciiCodec;
pub use binary::BinaryCodec;
pub use binsafe::BinSafeCodec;

/// Name of the chunk that carries the embedded world mesh.
pub const MESH_CHUNK_NAME: &str = "MeshAndBsp";

/// Class name used for references to an already-read object.
pub const REFERENCE_CLASS: &str = "\u{a7}";

// ── Chunk header ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkHeader {
    pub name:       String,
    pub class_name: String,
    pub version:    u16,
    pub object_id:  u32,
    /// Set on the final child of a parent once the parent's end is read.
    pub is_last:    bool,
}

impl ChunkHeader {
    pub fn is_mesh(&self) -> bool {
        self.name == MESH_CHUNK_NAME
    }

    pub fn is_reference(&self) -> bool {
        self.class_name == REFERENCE_CLASS
    }

    /// Parse the bracketed form `[name class version id]` used by ASCII
    /// lines and BIN_SAFE string entries.  `%` stands for an empty field.
    pub fn parse_marker(text: &str, offset: usize) -> ZenResult<Self> {
        let bad = || ZenError::Format(format!("malformed chunk marker `{text}` at offset {offset:#x}"));

        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(bad)?;
        let fields: Vec<&str> = inner.split_whitespace().collect();
        let &[name, class_name, version, object_id] = fields.as_slice() else {
            return Err(bad());
        };
        let field = |s: &str| if s == "%" { String::new() } else { s.to_owned() };

        Ok(Self {
            name:       field(name),
            class_name: field(class_name),
            version:    version.parse().map_err(|_| bad())?,
            object_id:  object_id.parse().map_err(|_| bad())?,
            is_last:    false,
        })
    }
}

/// What comes next in the stream, as reported by [`Codec::peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    ChunkStart,
    ChunkEnd,
    Entry(ValueKind),
}

/// Encoding-specific header that follows the common preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImplHeader {
    pub object_count: u32,
    /// Only BIN_SAFE carries its own format version.
    pub bin_safe_version: Option<u32>,
}

// ── Codec trait ───────────────────────────────────────────────────────────────

pub trait Codec {
    fn encoding(&self) -> Encoding;

    /// Consume the encoding-specific header directly after the preamble's `END`.
    fn read_impl_header(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ImplHeader>;

    /// Classify the next item without consuming it.
    fn peek(&self, c: &ByteCursor<'_>) -> ZenResult<Token>;

    fn read_chunk_start(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ChunkHeader>;

    fn read_chunk_end(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()>;

    /// Read one entry the caller expects to be of kind `expected`.
    fn read_entry(&mut self, c: &mut ByteCursor<'_>, expected: ValueKind) -> ZenResult<Entry>;

    fn skip_entry(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()>;

    /// True when no further top-level chunk follows.
    fn at_end(&self, c: &ByteCursor<'_>) -> bool;

    /// Consume the rest of a chunk whose start has just been read, nested
    /// chunks and embedded mesh blocks included.
    fn skip_chunk(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek(c)? {
                Token::ChunkStart => {
                    let header = self.read_chunk_start(c)?;
                    if header.is_mesh() {
                        MeshBlock::read(c)?;
                        self.read_chunk_end(c)?;
                    } else {
                        depth += 1;
                    }
                }
                Token::ChunkEnd => {
                    self.read_chunk_end(c)?;
                    depth -= 1;
                }
                Token::Entry(_) => self.skip_entry(c)?,
            }
        }
        Ok(())
    }
}

// ── Factory ──────────────────────────────────────────────────────────────────

/// Build the codec for `encoding`.  Only BINARY consults `schema`.
pub fn get_codec(encoding: Encoding, schema: Arc<Schema>) -> Box<dyn Codec> {
    match encoding {
        Encoding::Ascii   => Box::new(AsciiCodec::new()),
        Encoding::Binary  => Box::new(BinaryCodec::new(schema)),
        Encoding::BinSafe => Box::new(BinSafeCodec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_markers() {
        let h = ChunkHeader::parse_marker("[% oCWorld:zCWorld 64513 0]", 0).unwrap();
        assert_eq!(h.name, "");
        assert_eq!(h.class_name, "oCWorld:zCWorld");
        assert_eq!(h.version, 64513);
        assert_eq!(h.object_id, 0);

        let h = ChunkHeader::parse_marker("[MeshAndBsp % 0 0]", 0).unwrap();
        assert!(h.is_mesh());
        assert_eq!(h.class_name, "");
    }

    #[test]
    fn rejects_malformed_markers() {
        for bad in ["[]", "[a b c]", "[a b c d e]", "a b 0 0]", "[a b x 0]"] {
            assert!(
                matches!(ChunkHeader::parse_marker(bad, 0), Err(ZenError::Format(_))),
                "{bad}"
            );
        }
    }
}
