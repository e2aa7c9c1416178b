//! The plain-text preamble shared by every ZEN file.
//!
//! ```text
//! ZenGin Archive
//! ver 1
//! zCArchiverGeneric
//! ASCII                      <- ASCII | BINARY | BIN_SAFE
//! saveGame 0
//! date 18.10.2026 12:00:00   <- optional
//! user dev                   <- optional
//! END
//! ```
//!
//! Parsing is linear: every expected literal that does not match is a hard
//! error, and only `date` / `user` may be absent.

use serde::Serialize;
use std::fmt;

use crate::cursor::ByteCursor;
use crate::zen::text;
use crate::zen::value::decode_latin1;
use crate::zen::{ZenError, ZenResult};

pub const SIGNATURE: &str = "ZenGin Archive";

/// Physical encoding of the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encoding {
    /// Line-based text.
    Ascii,
    /// Fixed-width values with no type information.
    Binary,
    /// Tagged, length-prefixed values.
    BinSafe,
}

impl Encoding {
    pub fn from_file_type(s: &str) -> Option<Self> {
        match s {
            "ASCII"    => Some(Encoding::Ascii),
            "BINARY"   => Some(Encoding::Binary),
            "BIN_SAFE" => Some(Encoding::BinSafe),
            _          => None,
        }
    }

    /// The file-type token as written in the preamble.
    pub fn file_type(self) -> &'static str {
        match self {
            Encoding::Ascii   => "ASCII",
            Encoding::Binary  => "BINARY",
            Encoding::BinSafe => "BIN_SAFE",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveHeader {
    pub version:   i32,
    pub encoding:  Encoding,
    pub save_game: bool,
    pub date:      Option<String>,
    pub user:      Option<String>,
}

impl ArchiveHeader {
    /// Parse the preamble up to and including its `END` literal.  The cursor
    /// is left directly behind `END`; the encoding-specific header follows.
    pub fn read(c: &mut ByteCursor<'_>) -> ZenResult<Self> {
        text::expect_literal(c, SIGNATURE)?;

        text::expect_literal(c, "ver")?;
        let version = text::read_int(c)?;

        // archiver class, e.g. zCArchiverGeneric
        text::read_token(c)?;

        text::skip_whitespace(c);
        let line_offset = c.position();
        let file_type = decode_latin1(text::read_line(c)?);
        let encoding = Encoding::from_file_type(file_type.trim()).ok_or_else(|| {
            ZenError::Format(format!(
                "unsupported file type `{}` at offset {line_offset:#x}", file_type.trim()
            ))
        })?;

        text::expect_literal(c, "saveGame")?;
        let save_game = text::read_bool(c)?;

        let date = if text::try_literal(c, "date")? {
            let day = text::read_token(c)?;
            let time = text::read_token(c)?;
            Some(format!("{day} {time}"))
        } else {
            None
        };

        let user = if text::try_literal(c, "user")? {
            Some(text::read_token(c)?)
        } else {
            None
        };

        text::expect_literal(c, "END")?;

        Ok(Self { version, encoding, save_game, date, user })
    }
}
