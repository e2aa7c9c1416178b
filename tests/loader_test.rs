mod common;

use common::{ascii_doc, binsafe_doc, build_vdf, sample_schema, sample_world, Node, VdfNode};
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;
use zenvdfs::loader::{LoadError, WorldLoader};
use zenvdfs::vdfs::{FileIndex, VdfArchive};
use zenvdfs::zen::{Encoding, ParseOptions};

fn loader() -> WorldLoader<Cursor<Vec<u8>>> {
    let (bytes, _) = build_vdf(&[
        VdfNode::Dir("WORLDS", vec![
            VdfNode::File("WORLD.ZEN", ascii_doc(&sample_world())),
            VdfNode::File("BROKEN.ZEN", b"ZenGin Archive\nver 1\n".to_vec()),
        ]),
        VdfNode::File("TREE.MRM", b"mrm".to_vec()),
    ]);
    let mut index = FileIndex::new();
    index.mount(VdfArchive::from_reader(Cursor::new(bytes), "worlds.vdf").unwrap());
    WorldLoader::new(index, ParseOptions::default().with_schema(sample_schema()))
}

#[test]
fn test_load_from_archive() {
    let mut loader = loader();
    let world = loader.load_world("world.zen").unwrap();
    assert_eq!(world.header().encoding, Encoding::Ascii);
    assert_eq!(world.world().root.count(), 4);
}

#[test]
fn test_failed_load_keeps_previous_world() {
    let mut loader = loader();
    loader.load_world("WORLD.ZEN").unwrap();

    let err = loader.load_world("BROKEN.ZEN").unwrap_err();
    assert!(matches!(err, LoadError::Zen(_)), "{err}");
    assert_eq!(loader.current().unwrap().world().root.count(), 4);

    let err = loader.load_world("does/not/exist.zen").unwrap_err();
    assert!(matches!(err, LoadError::Io(_)), "{err}");
    assert!(loader.current().is_some());
}

#[test]
fn test_disk_fallback() {
    let world = vec![Node::new("", "oCWorld:zCWorld", 0)];
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&binsafe_doc(&world)).unwrap();
    tmp.flush().unwrap();

    let mut loader = loader();
    let path = tmp.path().to_str().unwrap();
    let archive = loader.load_world(path).unwrap();
    assert_eq!(archive.header().encoding, Encoding::BinSafe);
    assert_eq!(archive.world().root.count(), 1);
}

#[test]
fn test_resolve_visual() {
    let loader = loader();
    assert_eq!(loader.resolve_visual("tree.3ds").as_deref(), Some("TREE.MRM"));
    assert_eq!(loader.resolve_visual("TREE.MRM").as_deref(), Some("TREE.MRM"));
    assert_eq!(loader.resolve_visual("ROCK.3DS"), None);
    assert_eq!(loader.resolve_visual(".3DS"), None);
}
