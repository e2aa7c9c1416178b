//! Field layouts for the BINARY encoding.
//!
//! BINARY values carry neither name nor type, so the reader needs to know,
//! per class, which fields come in which order.  Layouts can be built in code
//! or loaded from JSON:
//!
//! ```json
//! { "classes": { "zCVob": [ { "name": "pack", "kind": "int" },
//!                           { "name": "bbox", "kind": "raw", "width": 24 } ] } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::zen::value::ValueKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name:  String,
    pub kind:  ValueKind,
    /// Byte count for `raw`, float count for `rawFloat`; ignored otherwise.
    #[serde(default)]
    pub width: usize,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self { name: name.into(), kind, width: 0 }
    }

    pub fn raw(name: impl Into<String>, len: usize) -> Self {
        Self { name: name.into(), kind: ValueKind::Raw, width: len }
    }

    pub fn raw_float(name: impl Into<String>, count: usize) -> Self {
        Self { name: name.into(), kind: ValueKind::RawFloat, width: count }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    classes: HashMap<String, Vec<FieldSpec>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the ordered fields of `class`, replacing any earlier layout.
    pub fn class(mut self, class: impl Into<String>, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.classes.insert(class.into(), fields.into_iter().collect());
        self
    }

    pub fn fields(&self, class: &str) -> Option<&[FieldSpec]> {
        self.classes.get(class).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
