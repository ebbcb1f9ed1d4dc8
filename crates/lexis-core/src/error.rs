//! Error types for `lexis-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "language {0:?} is not supported; if you would like it to be, please \
     open a feature request"
  )]
  UnsupportedLanguage(String),

  #[error("grade must be between 0 and 5, got {0}")]
  InvalidGrade(u8),

  #[error("word {word:?} is tagged {found} but its set is tagged {expected}")]
  LanguageMismatch {
    word:     String,
    expected: String,
    found:    String,
  },

  #[error("cannot join a set in {left} with a set in {right}")]
  ConfigLanguageMismatch { left: String, right: String },

  #[error("word {0:?} appears more than once in the same set")]
  DuplicateWord(String),

  #[error(
    "chart for word {word:?} is {width} columns wide; at most {max} are \
     supported",
    max = crate::entry::MAX_CHART_COLUMNS
  )]
  ChartTooWide { word: String, width: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
