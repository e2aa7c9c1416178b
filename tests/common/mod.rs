//! Fixture writers.  The crate only reads; these build the same logical
//! document in each encoding, and VDFS archives with a known layout.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use zenvdfs::vdfs::{ENTRY_DIR, ENTRY_LAST, SIGNATURE_G2};
use zenvdfs::zen::{FieldSpec, Schema, Value, ValueKind};

// ── ZEN ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Node {
    pub name:     &'static str,
    pub class:    &'static str,
    pub version:  u16,
    pub id:       u32,
    pub entries:  Vec<(&'static str, Value)>,
    pub children: Vec<Node>,
    /// Set on `MeshAndBsp` chunks: version and payload.
    pub mesh:     Option<(u32, Vec<u8>)>,
}

impl Node {
    pub fn new(name: &'static str, class: &'static str, id: u32) -> Self {
        Node { name, class, version: 0, id, entries: Vec::new(), children: Vec::new(), mesh: None }
    }

    pub fn entry(mut self, key: &'static str, value: Value) -> Self {
        self.entries.push((key, value));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn mesh(version: u32, payload: &[u8]) -> Self {
        let mut n = Node::new("MeshAndBsp", "", 0);
        n.mesh = Some((version, payload.to_vec()));
        n
    }

    fn count(&self) -> u32 {
        1 + self.children.iter().map(Node::count).sum::<u32>()
    }

    fn marker(&self) -> String {
        let pct = |s: &str| if s.is_empty() { "%".to_string() } else { s.to_string() };
        format!("[{} {} {} {}]", pct(self.name), pct(self.class), self.version, self.id)
    }
}

/// `root{VobTree{} WayNet{wp{}}}` preceded by a world mesh and an unrelated
/// top-level chunk.
pub fn sample_world() -> Vec<Node> {
    let root = Node { version: 64513, ..Node::new("", "oCWorld:zCWorld", 0) }
        .child(
            Node::new("VobTree", "zCVob", 1)
                .entry("vobName", Value::String("FIRE_01".into()))
                .entry("pack", Value::Int(3))
                .entry("trafoOSToWSPos", Value::Vec3([1.0, 2.5, -3.0]))
                .entry("showVisual", Value::Bool(true)),
        )
        .child(
            Node::new("WayNet", "zCWayNet", 2)
                .entry("waynetVersion", Value::Int(1))
                .child(
                    Node::new("wp", "zCWaypoint", 3)
                        .entry("wpName", Value::String("START".into()))
                        .entry("waterDepth", Value::Byte(7))
                        .entry("wpColor", Value::Color(zenvdfs::zen::Color { r: 1, g: 2, b: 3, a: 255 })),
                ),
        );
    let skipped = Node::new("Session", "zCCSManager", 9)
        .entry("ignored", Value::Float(0.5))
        .child(Node::new("inner", "zCCSBlock", 10).entry("x", Value::Int(1)));

    vec![Node::mesh(7, b"MESHBYTES"), skipped, root]
}

/// Field layouts matching [`sample_world`] for the BINARY encoding.
pub fn sample_schema() -> Schema {
    Schema::new()
        .class("oCWorld:zCWorld", [])
        .class(
            "zCVob",
            [
                FieldSpec::new("vobName", ValueKind::String),
                FieldSpec::new("pack", ValueKind::Int),
                FieldSpec::new("trafoOSToWSPos", ValueKind::Vec3),
                FieldSpec::new("showVisual", ValueKind::Bool),
            ],
        )
        .class("zCWayNet", [FieldSpec::new("waynetVersion", ValueKind::Int)])
        .class(
            "zCWaypoint",
            [
                FieldSpec::new("wpName", ValueKind::String),
                FieldSpec::new("waterDepth", ValueKind::Byte),
                FieldSpec::new("wpColor", ValueKind::Color),
            ],
        )
        .class("zCCSManager", [FieldSpec::new("ignored", ValueKind::Float)])
        .class("zCCSBlock", [FieldSpec::new("x", ValueKind::Int)])
}

pub fn preamble(file_type: &str) -> String {
    format!(
        "ZenGin Archive\nver 1\nzCArchiverGeneric\n{file_type}\nsaveGame 0\n\
         date 18.10.2026 12:00:00\nuser dev\nEND\n"
    )
}

fn object_count(nodes: &[Node]) -> u32 {
    nodes.iter().filter(|n| n.mesh.is_none()).map(Node::count).sum()
}

// ASCII

fn ascii_value(v: &Value) -> String {
    match v {
        Value::String(s)   => s.clone(),
        Value::Int(i)      => i.to_string(),
        Value::Float(f)    => f.to_string(),
        Value::Byte(b)     => b.to_string(),
        Value::Word(w)     => w.to_string(),
        Value::Bool(b)     => u8::from(*b).to_string(),
        Value::Vec3([x, y, z]) => format!("{x} {y} {z}"),
        Value::Color(c)    => format!("{} {} {} {}", c.r, c.g, c.b, c.a),
        Value::Raw(r)      => hex::encode(r),
        Value::RawFloat(f) => f.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" "),
        Value::Enum(e)     => e.to_string(),
    }
}

fn write_ascii(out: &mut Vec<u8>, node: &Node, depth: usize) {
    let indent = "\t".repeat(depth);
    out.extend_from_slice(format!("{indent}{}\n", node.marker()).as_bytes());
    if let Some((version, payload)) = &node.mesh {
        write_mesh(out, *version, payload);
        out.push(b'\n');
    }
    for (key, value) in &node.entries {
        let line = format!("{indent}\t{key}={}:{}\n", value.kind(), ascii_value(value));
        out.extend_from_slice(line.as_bytes());
    }
    for child in &node.children {
        write_ascii(out, child, depth + 1);
    }
    out.extend_from_slice(format!("{indent}[]\n").as_bytes());
}

pub fn ascii_doc(nodes: &[Node]) -> Vec<u8> {
    let mut out = preamble("ASCII").into_bytes();
    out.extend_from_slice(format!("objects {}\nEND\n\n", object_count(nodes)).as_bytes());
    for n in nodes {
        write_ascii(&mut out, n, 0);
    }
    out
}

fn write_mesh(out: &mut Vec<u8>, version: u32, payload: &[u8]) {
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

// BINARY

fn binary_value(out: &mut Vec<u8>, v: &Value) {
    match v {
        Value::String(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        Value::Int(i)    => out.extend_from_slice(&i.to_le_bytes()),
        Value::Float(f)  => out.extend_from_slice(&f.to_le_bytes()),
        Value::Byte(b)   => out.push(*b),
        Value::Word(w)   => out.extend_from_slice(&w.to_le_bytes()),
        Value::Bool(b)   => out.push(u8::from(*b)),
        Value::Vec3(v)   => v.iter().for_each(|f| out.extend_from_slice(&f.to_le_bytes())),
        Value::Color(c)  => out.extend_from_slice(&[c.b, c.g, c.r, c.a]),
        Value::Raw(r)    => out.extend_from_slice(r),
        Value::RawFloat(v) => v.iter().for_each(|f| out.extend_from_slice(&f.to_le_bytes())),
        Value::Enum(e)   => out.extend_from_slice(&e.to_le_bytes()),
    }
}

fn write_binary(out: &mut Vec<u8>, node: &Node) {
    let mut body = Vec::new();
    body.extend_from_slice(&node.version.to_le_bytes());
    body.extend_from_slice(&node.id.to_le_bytes());
    for s in [node.name, node.class] {
        body.extend_from_slice(if s.is_empty() { b"%" } else { s.as_bytes() });
        body.push(0);
    }
    if let Some((version, payload)) = &node.mesh {
        write_mesh(&mut body, *version, payload);
    }
    for (_, value) in &node.entries {
        binary_value(&mut body, value);
    }
    for child in &node.children {
        write_binary(&mut body, child);
    }
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend(body);
}

pub fn binary_doc(nodes: &[Node]) -> Vec<u8> {
    let mut out = preamble("BINARY").into_bytes();
    out.extend_from_slice(format!("objects {}\nEND\n", object_count(nodes)).as_bytes());
    for n in nodes {
        write_binary(&mut out, n);
    }
    out
}

// BIN_SAFE

pub const TAG_HASH: u8 = 0x12;

fn safe_entry(out: &mut Vec<u8>, tag: u8, payload: &[u8]) {
    out.push(tag);
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
}

#[derive(Default)]
struct Keys {
    order: Vec<String>,
    index: HashMap<String, u32>,
}

impl Keys {
    fn get(&mut self, key: &str) -> u32 {
        if let Some(&i) = self.index.get(key) {
            return i;
        }
        let i = self.order.len() as u32;
        self.order.push(key.to_owned());
        self.index.insert(key.to_owned(), i);
        i
    }
}

fn safe_value(v: &Value) -> Vec<u8> {
    let mut payload = Vec::new();
    match v {
        Value::String(s) => payload.extend_from_slice(s.as_bytes()),
        Value::Bool(b)   => payload.extend_from_slice(&u32::from(*b).to_le_bytes()),
        other            => binary_value(&mut payload, other),
    }
    payload
}

fn write_safe(out: &mut Vec<u8>, keys: &mut Keys, node: &Node) {
    safe_entry(out, ValueKind::String.tag(), node.marker().as_bytes());
    if let Some((version, payload)) = &node.mesh {
        write_mesh(out, *version, payload);
    }
    for (key, value) in &node.entries {
        safe_entry(out, TAG_HASH, &keys.get(key).to_le_bytes());
        safe_entry(out, value.kind().tag(), &safe_value(value));
    }
    for child in &node.children {
        write_safe(out, keys, child);
    }
    safe_entry(out, ValueKind::String.tag(), b"[]");
}

pub fn binsafe_doc(nodes: &[Node]) -> Vec<u8> {
    let mut keys = Keys::default();
    let mut body = Vec::new();
    for n in nodes {
        write_safe(&mut body, &mut keys, n);
    }

    let mut out = preamble("BIN_SAFE").into_bytes();
    let table_offset = out.len() + 12 + body.len();
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&object_count(nodes).to_le_bytes());
    out.extend_from_slice(&(table_offset as u32).to_le_bytes());
    out.extend(body);

    out.extend_from_slice(&(keys.order.len() as u32).to_le_bytes());
    for (i, key) in keys.order.iter().enumerate() {
        out.extend_from_slice(&(key.len() as u16).to_le_bytes());
        out.extend_from_slice(&(i as u16).to_le_bytes());
        out.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        out.extend_from_slice(key.as_bytes());
    }
    out
}

/// Length of the document up to and including the root's closing marker;
/// anything shorter must fail as truncated.
pub fn complete_len(file_type: &str, doc: &[u8]) -> usize {
    match file_type {
        "ASCII" => doc.len() - 1,
        _       => doc.len(),
    }
}

// ── VDFS ─────────────────────────────────────────────────────────────────────

pub enum VdfNode {
    File(&'static str, Vec<u8>),
    Dir(&'static str, Vec<VdfNode>),
}

/// Raw catalog row: name, jump_to, size, kind.
pub type RawEntry = (String, u32, u32, u32);

pub fn vdf_from_entries(entries: &[RawEntry], data: &[u8], num_files: u32) -> Vec<u8> {
    let mut out = b"zvdf test archive".to_vec();
    out.resize(256, 0x1a);
    out.extend_from_slice(SIGNATURE_G2);
    let timestamp: u32 = (46 << 25) | (10 << 21) | (18 << 16) | (12 << 11);
    for v in [entries.len() as u32, num_files, timestamp, data.len() as u32, 296, 0x50] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for (name, jump_to, size, kind) in entries {
        let mut raw = name.as_bytes().to_vec();
        raw.resize(64, b' ');
        out.extend(raw);
        for v in [*jump_to, *size, *kind, 0x20] {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// Lay out `root` level by level, the way packers do, and return the archive
/// with `(name, offset, size)` for every file.
pub fn build_vdf(root: &[VdfNode]) -> (Vec<u8>, Vec<(String, u64, u64)>) {
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut payloads: Vec<Option<&[u8]>> = Vec::new();
    let mut queue: VecDeque<(Option<usize>, &[VdfNode])> = VecDeque::from([(None, root)]);

    while let Some((parent, level)) = queue.pop_front() {
        let start = entries.len();
        if let Some(p) = parent {
            entries[p].1 = start as u32;
        }
        for (i, node) in level.iter().enumerate() {
            let last = if i + 1 == level.len() { ENTRY_LAST } else { 0 };
            match node {
                VdfNode::File(name, data) => {
                    entries.push((name.to_string(), 0, data.len() as u32, last));
                    payloads.push(Some(data.as_slice()));
                }
                VdfNode::Dir(name, children) => {
                    entries.push((name.to_string(), 0, 0, ENTRY_DIR | last));
                    payloads.push(None);
                    queue.push_back((Some(entries.len() - 1), children));
                }
            }
        }
    }

    let mut data = Vec::new();
    let mut files = Vec::new();
    let base = 296 + 80 * entries.len();
    for (entry, payload) in entries.iter_mut().zip(&payloads) {
        if let Some(p) = payload {
            let offset = base + data.len();
            entry.1 = offset as u32;
            files.push((entry.0.clone(), offset as u64, p.len() as u64));
            data.extend_from_slice(p);
        }
    }
    let bytes = vdf_from_entries(&entries, &data, files.len() as u32);
    (bytes, files)
}
