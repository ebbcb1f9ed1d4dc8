//! Error types for the lexis-scrape crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid article base URL {url:?}: {reason}")]
  BaseUrl { url: String, reason: String },

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("fetching {word:?} failed: {source}")]
  Fetch {
    word:   String,
    #[source]
    source: reqwest::Error,
  },

  #[error("fetching {word:?} returned HTTP {status}")]
  Status { word: String, status: u16 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
