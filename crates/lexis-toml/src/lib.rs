//! TOML word files for lexis.
//!
//! Converts a word file into a [`lexis_core::Config`] and writes a set back
//! out in the same format. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use lexis_toml::parse;
//!
//! let input = "lang = \"ru\"\n[[words]]\nword = \"книга\"\ndefinition = \"book\"\n";
//! let config = parse(input, "books.toml", lexis_core::today()).unwrap();
//! println!("{} words in {}", config.len(), config.name());
//! ```

pub mod error;
mod parse;
mod serialize;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
pub use error::{Error, Result};
use lexis_core::Config;

/// Parse a word file held in memory. `name` becomes the set name.
///
/// Every entry starts with a fresh scheduling state due on `today`.
pub fn parse(input: &str, name: &str, today: NaiveDate) -> Result<Config> {
  parse::parse_document(input, name, today)
}

/// Read and parse the word file at `path`.
///
/// The set is named after the file stem, so `verbs.toml` imports as
/// `verbs` wherever it lives.
pub fn parse_file(path: impl AsRef<Path>, today: NaiveDate) -> Result<Config> {
  let path = path.as_ref();
  let input = std::fs::read_to_string(path)
    .map_err(|source| Error::Io { path: path.display().to_string(), source })?;
  parse(&input, &set_name(path), today)
}

/// The set name for a word file: its stem.
pub fn set_name(path: &Path) -> String {
  path
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

/// Render `config` as a word file.
pub fn to_string(config: &Config) -> Result<String> {
  serialize::write_document(config)
}

/// Write `config` as a word file to `dest` and return the path written.
///
/// When `dest` is an existing directory the file is placed inside it as
/// `<set name>.toml`.
pub fn export(config: &Config, dest: impl AsRef<Path>) -> Result<PathBuf> {
  let dest = dest.as_ref();
  let path = if dest.is_dir() {
    dest.join(format!("{}.toml", set_name(Path::new(config.name()))))
  } else {
    dest.to_path_buf()
  };

  let text = to_string(config)?;
  std::fs::write(&path, text)
    .map_err(|source| Error::Io { path: path.display().to_string(), source })?;
  tracing::info!(set = %config.name(), path = %path.display(), "exported set");
  Ok(path)
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() }

  #[test]
  fn file_is_named_by_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nouns.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "lang = \"uk\"\n[[words]]\nword = \"кіт\"\ndefinition = \"cat\"").unwrap();

    let config = parse_file(&path, today()).unwrap();
    assert_eq!(config.name(), "nouns");
    assert_eq!(config.len(), 1);

    let indirect = dir.path().join(".").join("nouns.toml");
    assert_eq!(parse_file(&indirect, today()).unwrap().name(), "nouns");
  }

  #[test]
  fn export_into_directory_uses_set_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = parse(
      "lang = \"fr\"\n[[words]]\nword = \"chat\"\ndefinition = \"cat\"\n",
      "animals",
      today(),
    )
    .unwrap();

    let written = export(&config, dir.path()).unwrap();
    assert_eq!(written, dir.path().join("animals.toml"));
    assert_eq!(parse_file(&written, today()).unwrap(), config);

    let explicit = dir.path().join("copy.toml");
    assert_eq!(export(&config, &explicit).unwrap(), explicit);
    assert_eq!(parse_file(&explicit, today()).unwrap().name(), "copy");
  }

  #[test]
  fn export_to_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = parse("words = []\n", "empty", today()).unwrap();
    let err = export(&config, dir.path().join("absent").join("x.toml")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_file(dir.path().join("absent.toml"), today()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
  }
}
