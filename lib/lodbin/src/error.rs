use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("malformed record data: {0}")]
  Binary(#[from] binrw::Error),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("node {parent} points to child {id}, which is not in the file")]
  MissingNode { parent: i64, id: i64 },
  #[error("node {id} is its own ancestor")]
  Cycle { id: i64 },
  #[error("{0} records do not fit into the header count")]
  CountOverflow(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
