//! ASCII encoding: one item per line.
//!
//! ```text
//! objects 3
//! END
//! [% oCWorld:zCWorld 64513 0]
//!     [VobTree % 0 1]
//!         vobName=string:FIRE_01
//!         trafoOSToWSPos=vec3:1 2.5 -3
//!     []
//! []
//! ```

use crate::cursor::ByteCursor;
use crate::zen::codec::{ChunkHeader, Codec, ImplHeader, Token};
use crate::zen::header::Encoding;
use crate::zen::text;
use crate::zen::value::{decode_latin1, Color, Entry, Value, ValueKind};
use crate::zen::{ZenError, ZenResult};

const CHUNK_END: &[u8] = b"[]";

#[derive(Debug, Default)]
pub struct AsciiCodec;

impl AsciiCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Next non-blank line.  The final `[]` of a document may lack its newline.
fn next_line<'a>(c: &mut ByteCursor<'a>) -> ZenResult<(usize, &'a [u8])> {
    text::skip_whitespace(c);
    let offset = c.position();
    if c.rest() == CHUNK_END {
        c.skip(CHUNK_END.len())?;
        return Ok((offset, CHUNK_END));
    }
    let line = text::read_line(c)?;
    Ok((offset, line.trim_ascii_end()))
}

fn is_chunk_start(line: &[u8]) -> bool {
    line.len() > 2 && line[0] == b'['
}

/// Split `key=kind:value`.
fn split_entry(line: &[u8], offset: usize) -> ZenResult<(String, ValueKind, String)> {
    let text = decode_latin1(line);
    let bad = || ZenError::Format(format!("malformed entry `{text}` at offset {offset:#x}"));

    let (key, typed) = text.split_once('=').ok_or_else(bad)?;
    let (kind, value) = typed.split_once(':').ok_or_else(bad)?;
    let kind = ValueKind::from_name(kind).ok_or_else(|| {
        ZenError::Format(format!("unknown value kind `{kind}` at offset {offset:#x}"))
    })?;
    Ok((key.trim().to_owned(), kind, value.to_owned()))
}

fn parse_value(kind: ValueKind, raw: &str, offset: usize) -> ZenResult<Value> {
    let bad = || ZenError::Format(format!("invalid {kind} value `{raw}` at offset {offset:#x}"));
    let floats = || -> ZenResult<Vec<f32>> {
        raw.split_whitespace()
            .map(|s| s.parse::<f32>().map_err(|_| bad()))
            .collect()
    };

    let value = match kind {
        ValueKind::String => Value::String(raw.to_owned()),
        ValueKind::Int    => Value::Int(raw.trim().parse().map_err(|_| bad())?),
        ValueKind::Float  => Value::Float(raw.trim().parse().map_err(|_| bad())?),
        ValueKind::Byte   => Value::Byte(raw.trim().parse().map_err(|_| bad())?),
        ValueKind::Word   => Value::Word(raw.trim().parse().map_err(|_| bad())?),
        ValueKind::Enum   => Value::Enum(raw.trim().parse().map_err(|_| bad())?),
        ValueKind::Bool   => match raw.trim() {
            "0" => Value::Bool(false),
            "1" => Value::Bool(true),
            _   => return Err(bad()),
        },
        ValueKind::Vec3 => {
            let v = floats()?;
            let &[x, y, z] = v.as_slice() else { return Err(bad()) };
            Value::Vec3([x, y, z])
        }
        ValueKind::Color => {
            let parts = raw
                .split_whitespace()
                .map(|s| s.parse::<u8>().map_err(|_| bad()))
                .collect::<ZenResult<Vec<u8>>>()?;
            let &[r, g, b, a] = parts.as_slice() else { return Err(bad()) };
            Value::Color(Color { r, g, b, a })
        }
        ValueKind::Raw      => Value::Raw(hex::decode(raw.trim()).map_err(|_| bad())?),
        ValueKind::RawFloat => Value::RawFloat(floats()?),
    };
    Ok(value)
}

impl Codec for AsciiCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Ascii
    }

    fn read_impl_header(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ImplHeader> {
        text::expect_literal(c, "objects")?;
        let offset = c.position();
        let count = text::read_int(c)?;
        let object_count = u32::try_from(count).map_err(|_| {
            ZenError::Format(format!("negative object count {count} at offset {offset:#x}"))
        })?;
        text::expect_literal(c, "END")?;
        Ok(ImplHeader { object_count, bin_safe_version: None })
    }

    fn peek(&self, c: &ByteCursor<'_>) -> ZenResult<Token> {
        let mut probe = c.clone();
        let (offset, line) = next_line(&mut probe)?;
        if line == CHUNK_END {
            Ok(Token::ChunkEnd)
        } else if is_chunk_start(line) {
            Ok(Token::ChunkStart)
        } else {
            let (_, kind, _) = split_entry(line, offset)?;
            Ok(Token::Entry(kind))
        }
    }

    fn read_chunk_start(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<ChunkHeader> {
        let mut probe = c.clone();
        let (offset, line) = next_line(&mut probe)?;
        if !is_chunk_start(line) {
            return Err(ZenError::Format(format!(
                "expected chunk start at offset {offset:#x}, found `{}`", decode_latin1(line)
            )));
        }
        let header = ChunkHeader::parse_marker(&decode_latin1(line), offset)?;
        *c = probe;
        Ok(header)
    }

    fn read_chunk_end(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let mut probe = c.clone();
        let (offset, line) = next_line(&mut probe)?;
        if line != CHUNK_END {
            return Err(ZenError::Format(format!(
                "expected `[]` at offset {offset:#x}, found `{}`", decode_latin1(line)
            )));
        }
        *c = probe;
        Ok(())
    }

    fn read_entry(&mut self, c: &mut ByteCursor<'_>, expected: ValueKind) -> ZenResult<Entry> {
        let mut probe = c.clone();
        let (offset, line) = next_line(&mut probe)?;
        if line == CHUNK_END || is_chunk_start(line) {
            return Err(ZenError::Format(format!("expected an entry at offset {offset:#x}")));
        }
        let (name, found, raw) = split_entry(line, offset)?;
        if found != expected {
            return Err(ZenError::TypeMismatch { offset, expected, found });
        }
        let value = parse_value(found, &raw, offset)?;
        *c = probe;
        Ok(Entry { name, value })
    }

    fn skip_entry(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<()> {
        let mut probe = c.clone();
        let (offset, line) = next_line(&mut probe)?;
        split_entry(line, offset)?;
        *c = probe;
        Ok(())
    }

    fn at_end(&self, c: &ByteCursor<'_>) -> bool {
        let mut probe = c.clone();
        text::skip_whitespace(&mut probe);
        probe.is_empty()
    }
}
