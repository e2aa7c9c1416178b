//! Typed entry values shared by all three ZEN encodings.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── ValueKind ─────────────────────────────────────────────────────────────────

/// Declared type of one entry.
///
/// The ASCII encoding spells the kind out (`key=int:5`), BIN_SAFE stores it as
/// a tag byte, and BINARY does not store it at all: there the kind comes from
/// the class's field layout (see [`crate::zen::schema`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    String,
    Int,
    Float,
    Byte,
    Word,
    Bool,
    Vec3,
    Color,
    Raw,
    RawFloat,
    Enum,
}

impl ValueKind {
    /// Name used by the ASCII encoding.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::String   => "string",
            ValueKind::Int      => "int",
            ValueKind::Float    => "float",
            ValueKind::Byte     => "byte",
            ValueKind::Word     => "word",
            ValueKind::Bool     => "bool",
            ValueKind::Vec3     => "vec3",
            ValueKind::Color    => "color",
            ValueKind::Raw      => "raw",
            ValueKind::RawFloat => "rawFloat",
            ValueKind::Enum     => "enum",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "string"   => Some(ValueKind::String),
            "int"      => Some(ValueKind::Int),
            "float"    => Some(ValueKind::Float),
            "byte"     => Some(ValueKind::Byte),
            "word"     => Some(ValueKind::Word),
            "bool"     => Some(ValueKind::Bool),
            "vec3"     => Some(ValueKind::Vec3),
            "color"    => Some(ValueKind::Color),
            "raw"      => Some(ValueKind::Raw),
            "rawFloat" => Some(ValueKind::RawFloat),
            "enum"     => Some(ValueKind::Enum),
            _          => None,
        }
    }

    /// BIN_SAFE tag byte.
    pub fn tag(self) -> u8 {
        match self {
            ValueKind::String   => 0x01,
            ValueKind::Int      => 0x02,
            ValueKind::Float    => 0x03,
            ValueKind::Byte     => 0x04,
            ValueKind::Word     => 0x05,
            ValueKind::Bool     => 0x06,
            ValueKind::Vec3     => 0x07,
            ValueKind::Color    => 0x08,
            ValueKind::Raw      => 0x09,
            ValueKind::RawFloat => 0x10,
            ValueKind::Enum     => 0x11,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(ValueKind::String),
            0x02 => Some(ValueKind::Int),
            0x03 => Some(ValueKind::Float),
            0x04 => Some(ValueKind::Byte),
            0x05 => Some(ValueKind::Word),
            0x06 => Some(ValueKind::Bool),
            0x07 => Some(ValueKind::Vec3),
            0x08 => Some(ValueKind::Color),
            0x09 => Some(ValueKind::Raw),
            0x10 => Some(ValueKind::RawFloat),
            0x11 => Some(ValueKind::Enum),
            _    => None,
        }
    }

    /// Payload width in BIN_SAFE for kinds that have one.  `None` for the
    /// variable-length kinds (string, raw, rawFloat).
    pub fn safe_width(self) -> Option<usize> {
        match self {
            ValueKind::Int | ValueKind::Float | ValueKind::Enum => Some(4),
            ValueKind::Bool | ValueKind::Color                  => Some(4),
            ValueKind::Byte                                     => Some(1),
            ValueKind::Word                                     => Some(2),
            ValueKind::Vec3                                     => Some(12),
            ValueKind::String | ValueKind::Raw | ValueKind::RawFloat => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Binary encodings store colors as B, G, R, A.
    pub(crate) fn from_bgra(bytes: &[u8]) -> Self {
        Color { r: bytes[2], g: bytes[1], b: bytes[0], a: bytes[3] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Value {
    String(String),
    Int(i32),
    Float(f32),
    Byte(u8),
    Word(u16),
    Bool(bool),
    Vec3([f32; 3]),
    Color(Color),
    Raw(Vec<u8>),
    RawFloat(Vec<f32>),
    Enum(u32),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_)   => ValueKind::String,
            Value::Int(_)      => ValueKind::Int,
            Value::Float(_)    => ValueKind::Float,
            Value::Byte(_)     => ValueKind::Byte,
            Value::Word(_)     => ValueKind::Word,
            Value::Bool(_)     => ValueKind::Bool,
            Value::Vec3(_)     => ValueKind::Vec3,
            Value::Color(_)    => ValueKind::Color,
            Value::Raw(_)      => ValueKind::Raw,
            Value::RawFloat(_) => ValueKind::RawFloat,
            Value::Enum(_)     => ValueKind::Enum,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _                => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _             => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _              => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Value::Vec3(v) => Some(*v),
            _              => None,
        }
    }
}

/// One decoded property.  `name` is empty when the encoding carries no key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub name:  String,
    pub value: Value,
}

/// Archives are written by a Windows-1252 engine; map bytes 1:1 to chars.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
