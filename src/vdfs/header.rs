use byteorder::{LittleEndian, ReadBytesExt};
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::io::Read;
use tracing::warn;

use crate::vdfs::{VdfsError, VdfsResult, SIGNATURE_G1, SIGNATURE_G2};

pub const EXPECTED_VERSION: u32 = 0x50;

/// DOS-style packed timestamp.
///
/// | bits  | field            |
/// |-------|------------------|
/// | 0–4   | seconds / 2      |
/// | 5–10  | minutes          |
/// | 11–15 | hour             |
/// | 16–20 | day              |
/// | 21–24 | month            |
/// | 25–31 | years since 1980 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VdfTime(pub u32);

impl VdfTime {
    pub fn seconds(self) -> u32 { (self.0 & 0x1f) * 2 }
    pub fn minutes(self) -> u32 { (self.0 >> 5) & 0x3f }
    pub fn hour(self)    -> u32 { (self.0 >> 11) & 0x1f }
    pub fn day(self)     -> u32 { (self.0 >> 16) & 0x1f }
    pub fn month(self)   -> u32 { (self.0 >> 21) & 0x0f }
    pub fn year(self)    -> i32 { 1980 + ((self.0 >> 25) & 0x7f) as i32 }

    /// `None` for field combinations that are not a real date.
    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), self.day())?
            .and_hms_opt(self.hour(), self.minutes(), self.seconds())
    }
}

/// Game generation, told apart by the signature's line-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveVersion {
    Gothic1,
    Gothic2,
}

#[derive(Debug, Clone, Serialize)]
pub struct VdfHeader {
    pub comment:         String,
    #[serde(skip)]
    pub signature:       [u8; 16],
    pub num_entries:     u32,
    pub num_files:       u32,
    pub timestamp:       VdfTime,
    pub data_size:       u32,
    pub root_cat_offset: u32,
    pub version:         u32,
}

impl VdfHeader {
    pub fn read<R: Read>(mut reader: R) -> VdfsResult<Self> {
        let mut comment = [0u8; 256];
        reader.read_exact(&mut comment)?;
        let mut signature = [0u8; 16];
        reader.read_exact(&mut signature)?;
        if &signature != SIGNATURE_G1 && &signature != SIGNATURE_G2 {
            return Err(VdfsError::InvalidSignature);
        }

        let num_entries = reader.read_u32::<LittleEndian>()?;
        let num_files = reader.read_u32::<LittleEndian>()?;
        let timestamp = VdfTime(reader.read_u32::<LittleEndian>()?);
        let data_size = reader.read_u32::<LittleEndian>()?;
        let root_cat_offset = reader.read_u32::<LittleEndian>()?;
        let version = reader.read_u32::<LittleEndian>()?;
        if version != EXPECTED_VERSION {
            warn!(version, "unexpected VDFS header version");
        }

        // comments are padded with 0x1A (DOS EOF) or NUL
        let end = comment
            .iter()
            .position(|&b| b == 0x1a || b == 0)
            .unwrap_or(comment.len());
        let comment = comment[..end].iter().map(|&b| b as char).collect::<String>();

        Ok(Self {
            comment: comment.trim_end().to_owned(),
            signature,
            num_entries,
            num_files,
            timestamp,
            data_size,
            root_cat_offset,
            version,
        })
    }

    pub fn archive_version(&self) -> ArchiveVersion {
        if &self.signature == SIGNATURE_G1 {
            ArchiveVersion::Gothic1
        } else {
            ArchiveVersion::Gothic2
        }
    }
}
