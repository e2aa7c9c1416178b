pub mod cursor;
pub mod loader;
pub mod vdfs;
pub mod zen;

pub use cursor::{ByteCursor, CursorError};
pub use loader::{LoadError, WorldLoader};
pub use vdfs::{FileIndex, FileRecord, VdfArchive, VdfsError};
pub use zen::{ParseOptions, ZenArchive, ZenError, ZenReader, ZenWorld};
