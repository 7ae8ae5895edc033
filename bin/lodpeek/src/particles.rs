use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::ProgressBar;
use lodbin::print::{header_line, star_line};
use lodbin::{is_particle_file_name, FileHeader, ParticleFile, BIN_EXTENSION};

use crate::dump::{read_dump, write_binary, write_dump, Format};

/// Work with particle files
#[derive(Parser)]
pub(super) struct ParticlesModule {
  #[clap(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print the stars of a particles_[id].bin file, or the header of every
  /// .bin file when given a directory
  Print { path: PathBuf },
  /// Print the header of every .bin file in a directory
  Check { dir: PathBuf },
  /// Decode a particle file into JSON or YAML
  Dump {
    in_file: PathBuf,
    out_file: PathBuf,
    #[clap(short, long, default_value_t = Format::Json)]
    format: Format,
  },
  /// Encode a JSON or YAML dump back into a particle file
  Encode {
    in_file: PathBuf,
    out_file: PathBuf,
    #[clap(short, long, default_value_t = Format::Json)]
    format: Format,
  },
}

impl ParticlesModule {
  pub(super) fn execute(self) -> anyhow::Result<()> {
    match self.command {
      Command::Print { path } => {
        let mut out = io::stdout().lock();
        if path.is_dir() {
          list_headers(&path, &mut out)?;
        } else if path.is_file() {
          print_stars(&path, &mut out)?;
        } else {
          bail!("{} is neither a file nor a directory", path.display())
        }
        out.flush()?;
        Ok(())
      }
      Command::Check { dir } => {
        let mut out = io::stdout().lock();
        list_headers(&dir, &mut out)?;
        out.flush()?;
        Ok(())
      }
      Command::Dump {
        in_file,
        out_file,
        format,
      } => {
        let particles = read_particles(&in_file)?;
        write_dump(&out_file, &format, &particles)?;
        tracing::info!(stars = particles.stars.len(), %format, "dumped {}", out_file.display());
        Ok(())
      }
      Command::Encode {
        in_file,
        out_file,
        format,
      } => {
        let particles: ParticleFile = read_dump(&in_file, &format)?;
        write_binary(&out_file, |file| particles.encode(file))?;
        tracing::info!(stars = particles.stars.len(), "encoded {}", out_file.display());
        Ok(())
      }
    }
  }
}

fn list_headers<W: Write>(dir: &Path, out: &mut W) -> anyhow::Result<()> {
  let files = bin_files(dir)?;

  writeln!(out, "Directory: {}", dir.display())?;
  writeln!(out)?;

  let bar = ProgressBar::new(files.len() as u64);
  for (name, path) in files {
    let mut reader =
      BufReader::new(File::open(&path).with_context(|| format!("opening {}", path.display()))?);
    let header = FileHeader::read_from(&mut reader)
      .with_context(|| format!("reading header of {}", path.display()))?;

    bar.suspend(|| writeln!(out, "{}", header_line(&name, &header)))?;
    bar.inc(1);
  }
  bar.finish_and_clear();

  Ok(())
}

/// Regular files in `dir` ending in `.bin`, sorted by name.
fn bin_files(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
  let mut files = Vec::new();
  for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
    let entry = entry?;
    let name = entry.file_name().to_string_lossy().into_owned();
    if name.ends_with(BIN_EXTENSION) && entry.path().is_file() {
      files.push((name, entry.path()));
    }
  }

  files.sort();
  tracing::debug!(files = files.len(), "found bin files in {}", dir.display());
  Ok(files)
}

/// Prints every star of a `particles_[id].bin` file. Any other file name
/// only gets a diagnostic line and is not read.
fn print_stars<W: Write>(path: &Path, out: &mut W) -> anyhow::Result<()> {
  writeln!(out, "File: {}", path.display())?;
  writeln!(out)?;

  let name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  if !is_particle_file_name(&name) {
    writeln!(
      out,
      "{}",
      format!("File {name} does not have the form 'particles_[id].bin").yellow()
    )?;
    return Ok(());
  }

  let particles = read_particles(path)?;

  writeln!(out, "{}", header_line(&name, &particles.header))?;
  for star in &particles.stars {
    writeln!(out, "{}", star_line(star))?;
  }

  Ok(())
}

fn read_particles(path: &Path) -> anyhow::Result<ParticleFile> {
  let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
  ParticleFile::from_bytes(&bytes).with_context(|| format!("decoding {}", path.display()))
}
