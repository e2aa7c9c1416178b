//! BINARY encoding: untagged fixed-width values.
//!
//! Chunk layout:
//!
//! ```text
//! u32  size        bytes from this field to the end of the chunk
//! u16  version
//! u32  object id
//! cstr name        NUL-terminated, "%" = empty
//! cstr class       NUL-terminated, "%" = empty
//! ...  fields      in the order of the class's field layout
//! ...  children    nested chunks until `start + size`
//! ```
//!
//! Values carry no type or length.  What is read next is decided by the
//! class's [`FieldSpec`] list, and a caller that asks for a different kind
//! than was written gets whatever those bytes decode to.

use std::sync::Arc;

use crate::cursor::ByteCursor;
use crate::zen::codec::{ChunkHeader, Codec, ImplHeader, Token};
use crate::zen::header::Encoding;
use crate::zen::schema::{FieldSpec, Schema};
use crate::zen::text;
use crate::zen::value::{decode_latin1, Color, Entry, Value, ValueKind};
use crate::zen::{ZenError, ZenResult};

#[derive(Debug)]
struct Frame {
    class:  String,
    end:    usize,
    fields: Option<Vec<FieldSpec>>,
    next:   usize,
}

impl Frame {
    fn pending_field(&self) -> Option<&FieldSpec> {
        self.fields.as_ref().and_then(|f| f.get(self.next))
    }
}

pub struct BinaryCodec {
    schema: Arc<Schema>,
    frames: Vec<Frame>,
}

impl BinaryCodec {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema, frames: Vec::new() }
    }

    fn current(&mut self, offset: usize) -> ZenResult<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| ZenError::Format(format!("entry outside of any chunk at offset {offset:#x}")))
    }
}

fn read_name(c: &mut ByteCursor<'_>) -> ZenResult<String> {
    let s = decode_latin1(c.read_cstr()?);
    Ok(if s == "%" { String::new() } else { s })
}

fn read_value(c: &mut ByteCursor<'_>, kind: ValueKind, width: usize) -> ZenResult<Value> {
    let value = match kind {
        ValueKind::String => Value::String(decode_latin1(c.read_cstr()?)),
        ValueKind::Int    => Value::Int(c.read_i32()?),
        ValueKind::Float  => Value::Float(c.read_f32()?),
        ValueKind::Byte   => Value::Byte(c.read_u8()?),
        ValueKind::Word   => Value::Word(c.read_u16()?),
        ValueKind::Bool   => Value::Bool(c.read_u8()? != 0),
        ValueKind::Enum   => Value::Enum(c.read_u32()?),
        ValueKind::Vec3   => Value::Vec3([c.read_f32()?, c.read_f32()?, c.read_f32()?]),
        ValueKind::Color  => Value::Color(Color::from_bgra(c.read_bytes(4)?)),
        ValueKind::Raw    => Value::Raw(c.read_bytes(width)?.to_vec()),
        ValueKind::RawFloat => {
            // check the whole run up front so a bad width fails before allocating
            c.peek(width.saturating_mul(4))?;
            let mut v = Vec::with_capacity(width);
            for _ in 0..width {
                v.push(c.read_f32()?);
            }
            Value::RawFloat(v)
        }
    };
    Ok(value)
}

impl Codec for BinaryCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Binary
    }

    fn read_impl_header(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ImplHeader> {
        text::expect_literal(c, "objects")?;
        let offset = c.position();
        let count = text::read_int(c)?;
        let object_count = u32::try_from(count).map_err(|_| {
            ZenError::Format(format!("negative object count {count} at offset {offset:#x}"))
        })?;
        text::expect_literal(c, "END")?;
        text::expect_line_end(c)?;
        Ok(ImplHeader { object_count, bin_safe_version: None })
    }

    fn peek(&self, c: &ByteCursor<'_>) -> ZenResult<Token> {
        let pos = c.position();
        let Some(frame) = self.frames.last() else {
            if c.is_empty() {
                return Err(ZenError::Truncated { offset: pos, need: 4, have: 0 });
            }
            return Ok(Token::ChunkStart);
        };

        if pos > frame.end {
            return Err(ZenError::Format(format!(
                "read past the end of chunk `{}` ({pos:#x} > {:#x})", frame.class, frame.end
            )));
        }
        if let Some(field) = frame.pending_field() {
            if pos == frame.end {
                return Err(ZenError::Format(format!(
                    "chunk `{}` ends before field `{}`", frame.class, field.name
                )));
            }
            return Ok(Token::Entry(field.kind));
        }
        if pos == frame.end {
            return Ok(Token::ChunkEnd);
        }
        if frame.fields.is_none() {
            return Err(ZenError::Format(format!(
                "no field layout for class `{}` at offset {pos:#x}", frame.class
            )));
        }
        Ok(Token::ChunkStart)
    }

    fn read_chunk_start(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ChunkHeader> {
        let start = c.position();
        let size = c.read_u32()? as usize;
        let version = c.read_u16()?;
        let object_id = c.read_u32()?;
        let name = read_name(c)?;
        let class_name = read_name(c)?;

        let end = start.checked_add(size).ok_or_else(|| {
            ZenError::Format(format!("chunk size {size} at offset {start:#x} overflows"))
        })?;
        if end < c.position() {
            return Err(ZenError::Format(format!(
                "chunk size {size} at offset {start:#x} is smaller than its header"
            )));
        }
        if end > c.len() {
            return Err(ZenError::Truncated { offset: start, need: size, have: c.len() - start });
        }
        if let Some(parent) = self.frames.last() {
            if end > parent.end {
                return Err(ZenError::Format(format!(
                    "chunk at offset {start:#x} overruns its parent `{}`", parent.class
                )));
            }
        }

        self.frames.push(Frame {
            class:  class_name.clone(),
            end,
            fields: self.schema.fields(&class_name).map(<[FieldSpec]>::to_vec),
            next:   0,
        });
        Ok(ChunkHeader { name, class_name, version, object_id, is_last: false })
    }

    fn read_chunk_end(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let pos = c.position();
        let frame = self.frames.pop().ok_or_else(|| {
            ZenError::Format(format!("chunk end outside of any chunk at offset {pos:#x}"))
        })?;
        if pos != frame.end {
            return Err(ZenError::Format(format!(
                "chunk `{}` ends at {:#x} but the reader is at {pos:#x}", frame.class, frame.end
            )));
        }
        Ok(())
    }

    fn read_entry(&mut self, c: &mut ByteCursor<'_>, expected: ValueKind) -> ZenResult<Entry> {
        let offset = c.position();
        let frame = self.current(offset)?;
        let field = frame.pending_field().cloned().ok_or_else(|| {
            ZenError::Format(format!(
                "no more fields declared for class `{}` at offset {offset:#x}", frame.class
            ))
        })?;
        let value = read_value(c, expected, field.width)?;
        frame.next += 1;
        Ok(Entry { name: field.name, value })
    }

    fn skip_entry(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let offset = c.position();
        let kind = self
            .current(offset)?
            .pending_field()
            .map(|f| f.kind)
            .ok_or_else(|| ZenError::Format(format!("no field to skip at offset {offset:#x}")))?;
        self.read_entry(c, kind).map(|_| ())
    }

    fn at_end(&self, c: &ByteCursor<'_>) -> bool {
        c.is_empty()
    }

    /// The chunk size says where it ends; no need to understand the body.
    fn skip_chunk(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let pos = c.position();
        let frame = self.frames.pop().ok_or_else(|| {
            ZenError::Format(format!("nothing to skip at offset {pos:#x}"))
        })?;
        c.seek(frame.end)?;
        Ok(())
    }
}
