use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::meta::MetaModule;
use crate::particles::ParticlesModule;

mod dump;
mod meta;
mod particles;

#[derive(Parser)]
#[clap(version, about)]
pub struct Lodpeek {
  /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG wins if set.
  #[clap(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,
  #[clap(subcommand)]
  module: Module,
}

#[derive(Subcommand)]
enum Module {
  Meta(MetaModule),
  Particles(ParticlesModule),
}

impl Lodpeek {
  pub fn execute(self) -> anyhow::Result<()> {
    init_logging(self.verbose);

    match self.module {
      Module::Meta(module) => module.execute(),
      Module::Particles(module) => module.execute(),
    }
  }
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn main() -> anyhow::Result<()> {
  Lodpeek::parse().execute()
}
