//! Recursive descent over the chunk stream, building [`WorldObjectNode`]s.

use serde::Serialize;
use tracing::debug;

use crate::cursor::{ByteCursor, CursorResult};
use crate::zen::codec::{ChunkHeader, Codec, Token};
use crate::zen::value::Entry;
use crate::zen::{ParseOptions, ZenError, ZenResult};

// ── Mesh block ────────────────────────────────────────────────────────────────

/// Opaque embedded mesh: `u32 version, u32 size` followed by `size` bytes.
/// Only the byte range is kept; the geometry is not decoded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshBlock {
    pub version: u32,
    pub offset:  usize,
    pub len:     usize,
}

impl MeshBlock {
    pub(crate) fn read(c: &mut ByteCursor<'_>) -> CursorResult<Self> {
        let mut probe = c.clone();
        let version = probe.read_u32()?;
        let len = probe.read_u32()? as usize;
        let offset = probe.position();
        probe.skip(len)?;
        *c = probe;
        Ok(Self { version, offset, len })
    }

    /// The mesh payload within the document it was read from.
    pub fn bytes<'a>(&self, document: &'a [u8]) -> Option<&'a [u8]> {
        document.get(self.offset..self.offset.checked_add(self.len)?)
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldObjectNode {
    pub header:   ChunkHeader,
    pub entries:  Vec<Entry>,
    pub children: Vec<WorldObjectNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh:     Option<MeshBlock>,
}

impl WorldObjectNode {
    pub fn new(header: ChunkHeader) -> Self {
        Self { header, entries: Vec::new(), children: Vec::new(), mesh: None }
    }

    pub fn class_name(&self) -> &str {
        &self.header.class_name
    }

    pub fn object_id(&self) -> u32 {
        self.header.object_id
    }

    /// First entry called `name`.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(WorldObjectNode::count).sum::<usize>()
    }

    /// Height of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(WorldObjectNode::depth).max().unwrap_or(0)
    }

    /// Pre-order traversal.  The root is visited at depth 0.
    pub fn walk<F: FnMut(&WorldObjectNode, usize)>(&self, mut f: F) {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            f(node, depth);
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

pub struct ChunkTreeReader<'c, 'o> {
    codec:   &'c mut dyn Codec,
    options: &'o ParseOptions,
}

impl<'c, 'o> ChunkTreeReader<'c, 'o> {
    pub fn new(codec: &'c mut dyn Codec, options: &'o ParseOptions) -> Self {
        Self { codec, options }
    }

    /// Scan top-level chunks until the root class is found and return its
    /// tree, plus the last top-level mesh block seen on the way.
    pub fn read_world(&mut self, c: &mut ByteCursor<'_>) -> ZenResult<(WorldObjectNode, Option<MeshBlock>)> {
        let mut mesh = None;
        loop {
            if self.codec.at_end(c) {
                return Err(ZenError::Truncated { offset: c.position(), need: 1, have: 0 });
            }
            let header = self.codec.read_chunk_start(c)?;
            if header.is_mesh() {
                mesh = Some(MeshBlock::read(c)?);
                self.codec.read_chunk_end(c)?;
            } else if header.class_name == self.options.root_class {
                let root = self.read_node(c, header, 1)?;
                return Ok((root, mesh));
            } else {
                debug!(
                    name = %header.name,
                    class = %header.class_name,
                    offset = c.position(),
                    "skipping top-level chunk"
                );
                self.codec.skip_chunk(c)?;
            }
        }
    }

    /// Read the body of a chunk whose start is `header`, up to and including
    /// its end marker.
    pub fn read_node(&mut self, c: &mut ByteCursor<'_>, header: ChunkHeader, depth: usize) -> ZenResult<WorldObjectNode> {
        if depth > self.options.max_depth {
            return Err(ZenError::Format(format!(
                "chunk nesting exceeds {} levels at offset {:#x}", self.options.max_depth, c.position()
            )));
        }

        let mut node = WorldObjectNode::new(header);
        loop {
            match self.codec.peek(c)? {
                Token::Entry(kind) => {
                    let entry = self.codec.read_entry(c, kind)?;
                    node.entries.push(entry);
                }
                Token::ChunkStart => {
                    let child = self.codec.read_chunk_start(c)?;
                    if child.is_mesh() {
                        node.mesh = Some(MeshBlock::read(c)?);
                        self.codec.read_chunk_end(c)?;
                    } else {
                        let child = self.read_node(c, child, depth + 1)?;
                        node.children.push(child);
                    }
                }
                Token::ChunkEnd => {
                    self.codec.read_chunk_end(c)?;
                    if let Some(last) = node.children.last_mut() {
                        last.header.is_last = true;
                    }
                    return Ok(node);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zen::value::Value;

    fn node(class: &str, children: Vec<WorldObjectNode>) -> WorldObjectNode {
        let mut n = WorldObjectNode::new(ChunkHeader {
            name:       String::new(),
            class_name: class.into(),
            version:    0,
            object_id:  0,
            is_last:    false,
        });
        n.children = children;
        n
    }

    #[test]
    fn walk_is_pre_order() {
        let tree = node("a", vec![node("b", vec![node("c", vec![])]), node("d", vec![])]);
        let mut seen = Vec::new();
        tree.walk(|n, depth| seen.push((n.class_name().to_owned(), depth)));
        assert_eq!(
            seen,
            [("a".into(), 0), ("b".into(), 1), ("c".into(), 2), ("d".into(), 1)]
        );
        assert_eq!(tree.count(), 4);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn entry_lookup_by_name() {
        let mut n = node("zCVob", vec![]);
        n.entries.push(Entry { name: "visual".into(), value: Value::String("TREE.3DS".into()) });
        assert_eq!(n.entry("visual").and_then(|e| e.value.as_str()), Some("TREE.3DS"));
        assert!(n.entry("pack").is_none());
    }

    #[test]
    fn mesh_block_keeps_its_range() {
        let mut data = 9u32.to_le_bytes().to_vec();
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(b"abc!");
        let mut c = ByteCursor::new(&data);
        let mesh = MeshBlock::read(&mut c).unwrap();
        assert_eq!(mesh, MeshBlock { version: 9, offset: 8, len: 3 });
        assert_eq!(mesh.bytes(&data), Some(&b"abc"[..]));
        assert_eq!(c.position(), 11);

        let mut short = ByteCursor::new(&data[..9]);
        assert!(MeshBlock::read(&mut short).is_err());
        assert_eq!(short.position(), 0);
    }
}
