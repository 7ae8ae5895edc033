use std::io::{Cursor, Read, Seek, Write};

use binrw::{binrw, BinRead, BinReaderExt, BinWriterExt};
use serde::{Deserialize, Serialize};

use crate::{FileHeader, Result};

pub const PARTICLE_FILE_PREFIX: &str = "particles_";
pub const BIN_EXTENSION: &str = ".bin";

/// Separator between the names of a star in [`StarRecord::name`].
pub const NAME_SEPARATOR: char = '|';

/// Whether `name` looks like `particles_[id].bin`.
pub fn is_particle_file_name(name: &str) -> bool {
  name.starts_with(PARTICLE_FILE_PREFIX) && name.ends_with(BIN_EXTENSION)
}

/// One star of a particle file.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
  #[serde(with = "crate::float::triple")]
  pub position: [f64; 3],
  #[serde(with = "crate::float::triple")]
  pub proper_motion: [f32; 3],
  #[serde(with = "crate::float::scalar")]
  pub mu_alpha: f32,
  #[serde(with = "crate::float::scalar")]
  pub mu_delta: f32,
  #[serde(with = "crate::float::scalar")]
  pub radial_velocity: f32,
  #[serde(with = "crate::float::scalar")]
  pub app_mag: f32,
  #[serde(with = "crate::float::scalar")]
  pub abs_mag: f32,
  #[serde(with = "crate::float::scalar")]
  pub color: f32,
  #[serde(with = "crate::float::scalar")]
  pub size: f32,
  pub hip: i32,
  pub id: i64,

  #[br(temp)]
  #[bw(try_calc(i32::try_from(name.encode_utf16().count())))]
  name_len: i32,

  /// Every name of the star joined by [`NAME_SEPARATOR`], stored as UTF-16
  /// code units. Unpaired surrogates decode to U+FFFD.
  #[br(
    count = usize::try_from(name_len).unwrap_or(0),
    map = |units: Vec<u16>| String::from_utf16_lossy(&units)
  )]
  #[bw(map = |name: &String| name.encode_utf16().collect::<Vec<u16>>())]
  pub name: String,
}

impl StarRecord {
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self
      .name
      .split(NAME_SEPARATOR)
      .filter(|name| !name.is_empty())
  }
}

/// A decoded `particles_*.bin` file.
#[derive(BinRead, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[br(big)]
pub struct ParticleFile {
  pub header: FileHeader,
  #[br(count = header.record_count())]
  pub stars: Vec<StarRecord>,
}

impl ParticleFile {
  pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Self> {
    let file: Self = reader.read_be()?;
    tracing::debug!(
      marker = file.header.marker,
      version = file.header.version,
      stars = file.stars.len(),
      "read particle file"
    );
    Ok(file)
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    let mut cursor = Cursor::new(bytes);
    let file = Self::decode(&mut cursor)?;

    let trailing = bytes.len() as u64 - cursor.position();
    if trailing > 0 {
      tracing::warn!(
        trailing,
        stars = file.stars.len(),
        "bytes left over after the last star record"
      );
    }
    Ok(file)
  }

  /// Writes the header, with the count taken from `stars`, and every star.
  pub fn encode<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
    let header = self.header.with_count(self.stars.len())?;
    writer.write_be(&header)?;
    for star in &self.stars {
      writer.write_be(star)?;
    }

    tracing::debug!(stars = self.stars.len(), "encoded particle file");
    Ok(())
  }
}
