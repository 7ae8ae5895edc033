use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone, ValueEnum)]
pub enum Format {
  Json,
  Yaml,
}

impl Display for Format {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Format::Json => f.write_str("json"),
      Format::Yaml => f.write_str("yaml"),
    }
  }
}

pub(crate) fn write_dump<T: Serialize>(path: &Path, format: &Format, value: &T) -> anyhow::Result<()> {
  let mut file = BufWriter::new(
    File::create(path).with_context(|| format!("creating {}", path.display()))?,
  );

  match format {
    Format::Json => serde_json::to_writer_pretty(&mut file, value)?,
    Format::Yaml => serde_yaml::to_writer(&mut file, value)?,
  }

  file.flush()?;
  Ok(())
}

pub(crate) fn read_dump<T: DeserializeOwned>(path: &Path, format: &Format) -> anyhow::Result<T> {
  let file = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);

  Ok(match format {
    Format::Json => serde_json::from_reader(file)?,
    Format::Yaml => serde_yaml::from_reader(file)?,
  })
}

/// Writes a binary file through `encode`, which needs a seekable writer.
pub(crate) fn write_binary(
  path: &Path,
  encode: impl FnOnce(&mut BufWriter<File>) -> lodbin::Result<()>,
) -> anyhow::Result<()> {
  let mut file = BufWriter::new(
    File::create(path).with_context(|| format!("creating {}", path.display()))?,
  );
  encode(&mut file)?;
  file.flush()?;
  Ok(())
}
