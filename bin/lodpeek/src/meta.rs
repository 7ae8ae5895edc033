use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lodbin::print::write_tree;
use lodbin::Octree;

use crate::dump::{read_dump, write_binary, write_dump, Format};

const METADATA_FILE: &str = "metadata.bin";

/// Work with octree metadata files
#[derive(Parser)]
pub(super) struct MetaModule {
  #[clap(subcommand)]
  command: Command,
}

#[derive(Clone, ValueEnum)]
pub enum Style {
  Tree,
  Brief,
}

impl Display for Style {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Style::Tree => f.write_str("tree"),
      Style::Brief => f.write_str("brief"),
    }
  }
}

impl From<Style> for lodbin::print::Style {
  fn from(value: Style) -> Self {
    match value {
      Style::Tree => Self::Tree,
      Style::Brief => Self::Brief,
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Print the octree structure of a metadata.bin file
  Print {
    file: PathBuf,
    #[clap(short, long, default_value_t = Style::Tree)]
    style: Style,
  },
  /// Decode a metadata.bin file into JSON or YAML
  Dump {
    in_file: PathBuf,
    out_file: PathBuf,
    #[clap(short, long, default_value_t = Format::Json)]
    format: Format,
  },
  /// Encode a JSON or YAML dump back into a metadata.bin file
  Encode {
    in_file: PathBuf,
    out_file: PathBuf,
    #[clap(short, long, default_value_t = Format::Json)]
    format: Format,
  },
}

impl MetaModule {
  pub(super) fn execute(self) -> anyhow::Result<()> {
    match self.command {
      Command::Print { file, style } => {
        let mut out = io::stdout().lock();
        print_tree(&file, style, &mut out)?;
        out.flush()?;
      }
      Command::Dump {
        in_file,
        out_file,
        format,
      } => {
        let tree = read_tree(&in_file)?;
        write_dump(&out_file, &format, &tree)?;
        tracing::info!(nodes = tree.len(), %format, "dumped {}", out_file.display());
      }
      Command::Encode {
        in_file,
        out_file,
        format,
      } => {
        let tree: Octree = read_dump(&in_file, &format)?;
        write_binary(&out_file, |file| tree.encode(file))?;
        tracing::info!(nodes = tree.len(), "encoded {}", out_file.display());
      }
    }

    Ok(())
  }
}

/// Prints the `File:` line, then the tree. Any other file name only gets a
/// diagnostic line and is not read.
fn print_tree<W: Write>(file: &Path, style: Style, out: &mut W) -> anyhow::Result<()> {
  if !is_metadata_file(file) {
    writeln!(
      out,
      "{}",
      format!("File {} is not a {METADATA_FILE} file", file.display()).yellow()
    )?;
    return Ok(());
  }

  writeln!(out, "File: {}", file.display())?;
  let tree = read_tree(file)?;
  write_tree(&tree, style.into(), out)?;

  Ok(())
}

fn is_metadata_file(path: &Path) -> bool {
  path
    .file_name()
    .is_some_and(|name| name.to_string_lossy().ends_with(METADATA_FILE))
}

fn read_tree(path: &Path) -> anyhow::Result<Octree> {
  let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
  Octree::from_bytes(&bytes).with_context(|| format!("decoding {}", path.display()))
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use lodbin::{FileHeader, Octree};
  use tempfile::tempdir;

  use crate::dump::{read_dump, write_binary, write_dump, Format};
  use crate::meta::{is_metadata_file, print_tree, read_tree, Style};

  fn render(path: &Path, style: Style) -> (anyhow::Result<()>, String) {
    let mut out = Vec::new();
    let result = print_tree(path, style, &mut out);
    (result, String::from_utf8(out).unwrap())
  }

  fn node_bytes(id: i64, centre: [f32; 3], size: [f32; 3]) -> Vec<u8> {
    let mut bytes = id.to_be_bytes().to_vec();
    for value in centre.iter().chain(size.iter()) {
      bytes.extend_from_slice(&value.to_be_bytes());
    }
    for _ in 0..8 {
      bytes.extend_from_slice(&(-1i64).to_be_bytes());
    }
    for value in [0i32, 5, 5, 0] {
      bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
  }

  #[test]
  fn metadata_file_names() {
    assert!(is_metadata_file(Path::new("out/metadata.bin")));
    assert!(is_metadata_file(Path::new("old-metadata.bin")));
    assert!(!is_metadata_file(Path::new("metadata.bin/particles_000001.bin")));
    assert!(!is_metadata_file(Path::new("metadata.json")));
  }

  #[test]
  fn dump_and_encode_round_trip() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("metadata.bin");
    let bytes = [0xffu8, 0xff, 0xff, 0xff, 0, 0, 0, 1, 0, 0, 0, 0];
    std::fs::write(&bin, bytes).unwrap();

    let tree = read_tree(&bin).unwrap();
    assert_eq!(tree.header(), &FileHeader::metadata(0));

    for format in [Format::Json, Format::Yaml] {
      let dump = dir.path().join(format!("metadata.{format}"));
      write_dump(&dump, &format, &tree).unwrap();

      let restored: Octree = read_dump(&dump, &format).unwrap();
      let out = dir.path().join(format!("restored-{format}.bin"));
      write_binary(&out, |file| restored.encode(file)).unwrap();

      assert_eq!(std::fs::read(&out).unwrap(), bytes);
    }
  }

  #[test]
  fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(read_tree(&dir.path().join("metadata.bin")).is_err());
  }

  #[test]
  fn non_finite_floats_survive_dumps() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("metadata.bin");
    let mut bytes = [-1i32, 1, 1]
      .iter()
      .flat_map(|value| value.to_be_bytes())
      .collect::<Vec<u8>>();
    bytes.extend(node_bytes(
      1,
      [f32::INFINITY, f32::NEG_INFINITY, 0.5],
      [f32::NAN, 1024.0, 2.0],
    ));
    std::fs::write(&bin, &bytes).unwrap();

    let tree = read_tree(&bin).unwrap();
    for format in [Format::Json, Format::Yaml] {
      let dump = dir.path().join(format!("metadata.{format}"));
      write_dump(&dump, &format, &tree).unwrap();

      let restored: Octree = read_dump(&dump, &format).unwrap();
      let root = restored.root().unwrap();
      assert_eq!(root.centre[0], f32::INFINITY);
      assert_eq!(root.centre[1], f32::NEG_INFINITY);
      assert!(root.size[0].is_nan());

      let out = dir.path().join(format!("restored-{format}.bin"));
      write_binary(&out, |file| restored.encode(file)).unwrap();
      assert_eq!(std::fs::read(&out).unwrap(), bytes);
    }
  }

  #[test]
  fn prints_file_line_then_tree() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("metadata.bin");
    let mut bytes = [-1i32, 1, 1]
      .iter()
      .flat_map(|value| value.to_be_bytes())
      .collect::<Vec<u8>>();
    bytes.extend(node_bytes(3, [0.0; 3], [1.0; 3]));
    std::fs::write(&bin, &bytes).unwrap();

    let (result, out) = render(&bin, Style::Brief);
    result.unwrap();
    assert_eq!(
      out,
      format!(
        "File: {}\nm-1, v1, 1 nodes\nL0: 3 > 5/5 objs/rec [0 ch]\n",
        bin.display()
      )
    );
  }

  #[test]
  fn truncated_file_still_prints_file_line() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("metadata.bin");
    std::fs::write(&bin, [0xffu8, 0xff, 0xff, 0xff, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0]).unwrap();

    let (result, out) = render(&bin, Style::Tree);
    assert!(result.is_err());
    assert_eq!(out, format!("File: {}\n", bin.display()));
  }

  #[test]
  fn other_file_names_are_not_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.bin");

    let (result, out) = render(&path, Style::Tree);
    result.unwrap();
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains(&format!("File {} is not a metadata.bin file", path.display())));
  }
}
