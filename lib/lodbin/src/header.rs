use std::io::{Read, Seek};

use binrw::{binrw, BinReaderExt};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Marker the catalog pipeline writes in front of every file.
pub const VERSION_MARKER: i32 = -1;
pub const METADATA_VERSION: i32 = 1;
pub const PARTICLES_VERSION: i32 = 2;

/// The 12 byte header shared by `metadata.bin` and `particles_*.bin`.
///
/// Neither the marker nor the version is validated on read.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
  pub marker: i32,
  pub version: i32,
  pub count: i32,
}

impl FileHeader {
  pub const SIZE: usize = 3 * 4;

  pub fn metadata(count: i32) -> Self {
    Self {
      marker: VERSION_MARKER,
      version: METADATA_VERSION,
      count,
    }
  }

  pub fn particles(count: i32) -> Self {
    Self {
      marker: VERSION_MARKER,
      version: PARTICLES_VERSION,
      count,
    }
  }

  /// Reads only the header, leaving the reader positioned at the first record.
  pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
    Ok(reader.read_be()?)
  }

  /// Number of records that follow. A negative count means none.
  pub fn record_count(&self) -> usize {
    usize::try_from(self.count).unwrap_or(0)
  }

  pub(crate) fn with_count(self, count: usize) -> Result<Self> {
    let count = i32::try_from(count).map_err(|_| Error::CountOverflow(count))?;
    Ok(Self { count, ..self })
  }
}
