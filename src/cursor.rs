//! Bounds-checked forward reader over an in-memory byte buffer.
//!
//! Every archive decoder in this crate reads through a [`ByteCursor`].  A read
//! either consumes exactly the bytes it returns or fails with
//! [`CursorError::OutOfRange`] and leaves the position where it was.  There is
//! no unchecked offset arithmetic anywhere else in the crate.
//!
//! # Endianness
//! All multi-byte integers and floats are little-endian.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("read out of range at offset {offset:#x} (need {need} bytes, have {have})")]
    OutOfRange { offset: usize, need: usize, have: usize },
}

pub type CursorResult<T> = Result<T, CursorError>;

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize { self.pos }

    #[inline]
    pub fn len(&self) -> usize { self.data.len() }

    #[inline]
    pub fn remaining(&self) -> usize { self.data.len() - self.pos }

    /// True once every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool { self.pos >= self.data.len() }

    /// The whole underlying buffer, independent of the position.
    pub fn data(&self) -> &'a [u8] { self.data }

    /// Move to an absolute position.  `to == len()` is allowed (end of data).
    pub fn seek(&mut self, to: usize) -> CursorResult<()> {
        if to > self.data.len() {
            return Err(CursorError::OutOfRange {
                offset: to,
                need:   0,
                have:   0,
            });
        }
        self.pos = to;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> CursorResult<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Look at the next `n` bytes without consuming them.
    pub fn peek(&self, n: usize) -> CursorResult<&'a [u8]> {
        self.ensure(n)?;
        Ok(&self.data[self.pos..self.pos + n])
    }

    pub fn peek_u8(&self) -> CursorResult<u8> {
        Ok(self.peek(1)?[0])
    }

    /// Everything from the current position to the end, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn read_bytes(&mut self, n: usize) -> CursorResult<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> CursorResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> CursorResult<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> CursorResult<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> CursorResult<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> CursorResult<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    /// Read bytes up to (not including) the next NUL and consume the NUL.
    pub fn read_cstr(&mut self) -> CursorResult<&'a [u8]> {
        let rest = self.rest();
        match rest.iter().position(|&b| b == 0) {
            Some(n) => {
                self.pos += n + 1;
                Ok(&rest[..n])
            }
            None => Err(CursorError::OutOfRange {
                offset: self.pos,
                need:   rest.len() + 1,
                have:   rest.len(),
            }),
        }
    }

    fn ensure(&self, n: usize) -> CursorResult<()> {
        if n > self.remaining() {
            return Err(CursorError::OutOfRange {
                offset: self.pos,
                need:   n,
                have:   self.remaining(),
            });
        }
        Ok(())
    }
}
