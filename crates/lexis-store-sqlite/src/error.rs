//! Error type for `lexis-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lexis_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A stored value does not fit its domain type.
  #[error("corrupt row: {0}")]
  Decode(String),

  /// The word key is global; a word may belong to one set only.
  #[error("word {word:?} already belongs to set {set:?}")]
  WordOwnedByOtherSet { word: String, set: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
