//! BIN_SAFE encoding: every item is `u8 tag, u16 length, payload`.
//!
//! ```text
//! \n
//! u32  version
//! u32  object count
//! u32  hash table offset
//! ...  entries
//! ...  hash table:  u32 count, then per key
//!                   u16 key length, u16 insertion index, u32 hash, key bytes
//! ```
//!
//! A named property is a `hash` entry holding the key's insertion index,
//! followed by the value entry.  Chunk markers are bare string entries.

use std::collections::HashMap;

use crate::cursor::ByteCursor;
use crate::zen::codec::{ChunkHeader, Codec, ImplHeader, Token};
use crate::zen::header::Encoding;
use crate::zen::text;
use crate::zen::tree::MeshBlock;
use crate::zen::value::{decode_latin1, Color, Entry, Value, ValueKind};
use crate::zen::{ZenError, ZenResult};

/// Tag of the key-reference entry preceding a named value.
pub const TAG_HASH: u8 = 0x12;

const CHUNK_END: &[u8] = b"[]";

#[derive(Debug, Clone, Copy)]
struct RawEntry<'a> {
    offset:  usize,
    tag:     u8,
    payload: &'a [u8],
}

impl RawEntry<'_> {
    fn is_marker(&self) -> bool {
        self.tag == ValueKind::String.tag() && self.payload.first() == Some(&b'[')
    }

    fn is_chunk_end(&self) -> bool {
        self.tag == ValueKind::String.tag() && self.payload == CHUNK_END
    }
}

#[derive(Debug)]
pub struct BinSafeCodec {
    keys:         HashMap<u16, String>,
    table_offset: usize,
}

impl Default for BinSafeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BinSafeCodec {
    pub fn new() -> Self {
        Self { keys: HashMap::new(), table_offset: usize::MAX }
    }

    /// Number of keys loaded from the hash table.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn read_raw<'a>(&self, c: &mut ByteCursor<'a>) -> ZenResult<RawEntry<'a>> {
        let mut probe = c.clone();
        let offset = probe.position();
        let tag = probe.read_u8()?;
        let len = probe.read_u16()? as usize;
        let payload = probe.read_bytes(len)?;
        if probe.position() > self.table_offset {
            return Err(ZenError::Format(format!(
                "entry at offset {offset:#x} runs into the hash table at {:#x}", self.table_offset
            )));
        }
        *c = probe;
        Ok(RawEntry { offset, tag, payload })
    }

    fn key(&self, raw: &RawEntry<'_>) -> ZenResult<String> {
        let &[a, b, c, d] = raw.payload else {
            return Err(ZenError::Format(format!(
                "hash entry at offset {:#x} has length {}", raw.offset, raw.payload.len()
            )));
        };
        let index = u32::from_le_bytes([a, b, c, d]);
        u16::try_from(index)
            .ok()
            .and_then(|i| self.keys.get(&i))
            .cloned()
            .ok_or_else(|| {
                ZenError::Format(format!("unknown key index {index} at offset {:#x}", raw.offset))
            })
    }

    fn read_table(&mut self, data: &[u8]) -> ZenResult<()> {
        let mut t = ByteCursor::new(data);
        t.seek(self.table_offset)?;
        let count = t.read_u32()?;
        for _ in 0..count {
            let len = t.read_u16()? as usize;
            let index = t.read_u16()?;
            let _hash = t.read_u32()?;
            let key = decode_latin1(t.read_bytes(len)?);
            self.keys.insert(index, key);
        }
        Ok(())
    }
}

fn kind_of(raw: &RawEntry<'_>) -> ZenResult<ValueKind> {
    ValueKind::from_tag(raw.tag).ok_or_else(|| {
        ZenError::Format(format!("unknown value tag {:#04x} at offset {:#x}", raw.tag, raw.offset))
    })
}

fn decode(kind: ValueKind, raw: &RawEntry<'_>) -> ZenResult<Value> {
    let bad_len = || {
        ZenError::Format(format!(
            "{kind} entry at offset {:#x} has length {}", raw.offset, raw.payload.len()
        ))
    };
    if let Some(width) = kind.safe_width() {
        if raw.payload.len() != width {
            return Err(bad_len());
        }
    }

    let mut p = ByteCursor::new(raw.payload);
    let value = match kind {
        ValueKind::String => Value::String(decode_latin1(raw.payload)),
        ValueKind::Int    => Value::Int(p.read_i32()?),
        ValueKind::Float  => Value::Float(p.read_f32()?),
        ValueKind::Byte   => Value::Byte(p.read_u8()?),
        ValueKind::Word   => Value::Word(p.read_u16()?),
        ValueKind::Bool   => Value::Bool(p.read_u32()? != 0),
        ValueKind::Enum   => Value::Enum(p.read_u32()?),
        ValueKind::Vec3   => Value::Vec3([p.read_f32()?, p.read_f32()?, p.read_f32()?]),
        ValueKind::Color  => Value::Color(Color::from_bgra(raw.payload)),
        ValueKind::Raw    => Value::Raw(raw.payload.to_vec()),
        ValueKind::RawFloat => {
            if raw.payload.len() % 4 != 0 {
                return Err(bad_len());
            }
            let mut v = Vec::with_capacity(raw.payload.len() / 4);
            while !p.is_empty() {
                v.push(p.read_f32()?);
            }
            Value::RawFloat(v)
        }
    };
    Ok(value)
}

impl Codec for BinSafeCodec {
    fn encoding(&self) -> Encoding {
        Encoding::BinSafe
    }

    fn read_impl_header(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ImplHeader> {
        text::expect_line_end(c)?;
        let version = c.read_u32()?;
        let object_count = c.read_u32()?;
        let table_start = c.position();
        let table_offset = c.read_u32()? as usize;

        if table_offset < c.position() {
            return Err(ZenError::Format(format!(
                "hash table offset {table_offset:#x} at {table_start:#x} points into the header"
            )));
        }
        if table_offset > c.len() {
            return Err(ZenError::Truncated {
                offset: table_offset,
                need:   4,
                have:   0,
            });
        }
        self.table_offset = table_offset;
        self.read_table(c.data())?;

        Ok(ImplHeader { object_count, bin_safe_version: Some(version) })
    }

    fn peek(&self, c: &ByteCursor<'_>) -> ZenResult<Token> {
        let mut probe = c.clone();
        let first = self.read_raw(&mut probe)?;
        if first.tag == TAG_HASH {
            let value = self.read_raw(&mut probe)?;
            return Ok(Token::Entry(kind_of(&value)?));
        }
        if first.is_chunk_end() {
            Ok(Token::ChunkEnd)
        } else if first.is_marker() && first.payload.len() > 2 {
            Ok(Token::ChunkStart)
        } else {
            Ok(Token::Entry(kind_of(&first)?))
        }
    }

    fn read_chunk_start(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ChunkHeader> {
        let mut probe = c.clone();
        let raw = self.read_raw(&mut probe)?;
        if !raw.is_marker() || raw.is_chunk_end() {
            return Err(ZenError::Format(format!("expected chunk start at offset {:#x}", raw.offset)));
        }
        let header = ChunkHeader::parse_marker(&decode_latin1(raw.payload), raw.offset)?;
        *c = probe;
        Ok(header)
    }

    fn read_chunk_end(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let mut probe = c.clone();
        let raw = self.read_raw(&mut probe)?;
        if !raw.is_chunk_end() {
            return Err(ZenError::Format(format!("expected `[]` at offset {:#x}", raw.offset)));
        }
        *c = probe;
        Ok(())
    }

    fn read_entry(&mut self, c: &mut ByteCursor<'_>, expected: ValueKind) -> ZenResult<Entry> {
        let mut probe = c.clone();
        let offset = probe.position();
        let first = self.read_raw(&mut probe)?;
        let (name, raw) = if first.tag == TAG_HASH {
            (self.key(&first)?, self.read_raw(&mut probe)?)
        } else if first.is_marker() {
            return Err(ZenError::Format(format!("expected an entry at offset {offset:#x}")));
        } else {
            (String::new(), first)
        };

        let found = kind_of(&raw)?;
        if found != expected {
            return Err(ZenError::TypeMismatch { offset, expected, found });
        }
        let value = decode(found, &raw)?;
        *c = probe;
        Ok(Entry { name, value })
    }

    fn skip_entry(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let mut probe = c.clone();
        let first = self.read_raw(&mut probe)?;
        if first.tag == TAG_HASH {
            self.read_raw(&mut probe)?;
        }
        *c = probe;
        Ok(())
    }

    fn at_end(&self, c: &ByteCursor<'_>) -> bool {
        c.is_empty() || c.position() >= self.table_offset
    }

    /// Walks entries by their length prefix, so unknown tags inside the
    /// skipped chunk do not stop it.
    fn skip_chunk(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let raw = self.read_raw(c)?;
            if raw.is_chunk_end() {
                depth -= 1;
            } else if raw.is_marker() {
                let header = ChunkHeader::parse_marker(&decode_latin1(raw.payload), raw.offset)?;
                if header.is_mesh() {
                    MeshBlock::read(c)?;
                    self.read_chunk_end(c)?;
                } else {
                    depth += 1;
                }
            }
        }
        Ok(())
    }
}
