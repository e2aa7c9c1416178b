//! Token-level helpers for the plain-text parts of a ZEN file: the common
//! preamble, the ASCII implementation header and ASCII entry lines.
//!
//! Running out of input is always [`ZenError::Truncated`]; input that is
//! present but wrong is [`ZenError::Format`].

use crate::cursor::ByteCursor;
use crate::zen::value::decode_latin1;
use crate::zen::{ZenError, ZenResult};

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn truncated(c: &ByteCursor<'_>, need: usize) -> ZenError {
    ZenError::Truncated { offset: c.position(), need, have: c.remaining() }
}

pub fn skip_whitespace(c: &mut ByteCursor<'_>) {
    let n = c.rest().iter().take_while(|&&b| is_space(b)).count();
    // n <= remaining
    let _ = c.skip(n);
}

/// Skip whitespace and require that something follows.
fn token_start(c: &mut ByteCursor<'_>) -> ZenResult<()> {
    skip_whitespace(c);
    if c.is_empty() {
        return Err(truncated(c, 1));
    }
    Ok(())
}

/// Consume `literal` if it is next.  Input ending part-way through a
/// matching prefix is a truncation, not a mismatch.
pub fn try_literal(c: &mut ByteCursor<'_>, literal: &str) -> ZenResult<bool> {
    token_start(c)?;
    let lit = literal.as_bytes();
    let rest = c.rest();
    let n = lit.len().min(rest.len());
    if rest[..n] != lit[..n] {
        return Ok(false);
    }
    if n < lit.len() {
        return Err(truncated(c, lit.len()));
    }
    c.skip(lit.len())?;
    Ok(true)
}

pub fn expect_literal(c: &mut ByteCursor<'_>, literal: &str) -> ZenResult<()> {
    let offset = c.position();
    if try_literal(c, literal)? {
        Ok(())
    } else {
        Err(ZenError::Format(format!("expected `{literal}` at offset {offset:#x}")))
    }
}

/// Decimal integer with optional leading minus.
pub fn read_int(c: &mut ByteCursor<'_>) -> ZenResult<i32> {
    token_start(c)?;
    let rest = c.rest();
    let sign = usize::from(rest[0] == b'-');
    let digits = rest[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        if sign + digits == rest.len() {
            return Err(truncated(c, sign + 1));
        }
        return Err(ZenError::Format(format!("expected a number at offset {:#x}", c.position())));
    }
    let text = decode_latin1(&rest[..sign + digits]);
    let value = text.parse::<i32>().map_err(|_| {
        ZenError::Format(format!("number `{text}` at offset {:#x} is out of range", c.position()))
    })?;
    c.skip(sign + digits)?;
    Ok(value)
}

pub fn read_bool(c: &mut ByteCursor<'_>) -> ZenResult<bool> {
    token_start(c)?;
    let value = match c.peek_u8()? {
        b'0' => false,
        b'1' => true,
        other => {
            return Err(ZenError::Format(format!(
                "expected 0 or 1 at offset {:#x}, found {:?}", c.position(), other as char
            )))
        }
    };
    c.skip(1)?;
    Ok(value)
}

/// Read a whitespace-delimited token.  The delimiter is not consumed; a token
/// running into end of input is a truncation.
pub fn read_token(c: &mut ByteCursor<'_>) -> ZenResult<String> {
    token_start(c)?;
    let rest = c.rest();
    match rest.iter().position(|&b| is_space(b)) {
        Some(n) => {
            let token = decode_latin1(&rest[..n]);
            c.skip(n)?;
            Ok(token)
        }
        None => Err(truncated(c, rest.len() + 1)),
    }
}

/// Read up to the next `\n`, consuming it.  A trailing `\r` is dropped.
pub fn read_line<'a>(c: &mut ByteCursor<'a>) -> ZenResult<&'a [u8]> {
    let rest = c.rest();
    match rest.iter().position(|&b| b == b'\n') {
        Some(n) => {
            c.skip(n + 1)?;
            let line = &rest[..n];
            Ok(line.strip_suffix(b"\r").unwrap_or(line))
        }
        None => Err(truncated(c, rest.len() + 1)),
    }
}

/// Consume exactly one `\n` or `\r\n`.  Binary payloads follow directly, so
/// no further whitespace may be skipped.
pub fn expect_line_end(c: &mut ByteCursor<'_>) -> ZenResult<()> {
    let rest = c.rest();
    let n = match rest {
        [b'\n', ..]        => 1,
        [b'\r', b'\n', ..] => 2,
        [] | [b'\r']       => return Err(truncated(c, 1)),
        _ => {
            return Err(ZenError::Format(format!(
                "expected end of line at offset {:#x}", c.position()
            )))
        }
    };
    c.skip(n)?;
    Ok(())
}
