//! Error types for the lexis-toml word-file parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "language {0:?} is not supported; if you would like it to be, please \
     open a feature request"
  )]
  UnsupportedLanguage(String),

  #[error("key {field:?} not found in {entry}")]
  MissingField { field: &'static str, entry: String },

  #[error("TOML syntax error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("cannot write word file: {0}")]
  Serialize(#[from] toml::ser::Error),

  #[error("cannot access word file {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Core(#[from] lexis_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
