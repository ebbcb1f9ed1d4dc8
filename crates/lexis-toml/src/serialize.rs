//! Word-file writer.
//!
//! Emits the same document shape the parser reads: an optional `lang` key
//! and one `[[words]]` table per entry. Scheduling state is not part of the
//! format and is never written.

use lexis_core::entry::{Config, Entry};
use serde::Serialize;

use crate::error::Result;

// ─── Document representation ─────────────────────────────────────────────────

#[derive(Serialize)]
struct OutDocument<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  lang:  Option<&'static str>,
  words: Vec<OutEntry<'a>>,
}

#[derive(Serialize)]
struct OutEntry<'a> {
  word:           &'a str,
  definition:     &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  gender:         Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  aspect:         Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  usage:          Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  part_of_speech: Option<&'a str>,
  /// Only the explicit chart; stored charts are fetched again on import.
  #[serde(skip_serializing_if = "Option::is_none")]
  charts:         Option<&'a [Vec<String>]>,
}

impl<'a> From<&'a Entry> for OutEntry<'a> {
  fn from(entry: &'a Entry) -> Self {
    Self {
      word:           &entry.word,
      definition:     &entry.definition,
      gender:         entry.gender.as_deref(),
      aspect:         entry.aspect.as_deref(),
      usage:          entry.usage.as_deref(),
      part_of_speech: entry.part_of_speech.as_deref(),
      charts:         entry.chart.as_ref().map(|c| c.rows()),
    }
  }
}

/// Render `config` as a word file.
pub(crate) fn write_document(config: &Config) -> Result<String> {
  let doc = OutDocument {
    lang:  config.language().map(|l| l.code()),
    words: config.entries().iter().map(OutEntry::from).collect(),
  };
  let out = toml::to_string(&doc)?;
  tracing::debug!(set = %config.name(), words = doc.words.len(), "rendered word file");
  Ok(out)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use lexis_core::{entry::Chart, language::Language};

  use super::*;
  use crate::parse::parse_document;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() }

  #[test]
  fn written_file_parses_back_to_same_set() {
    let mut book = Entry::new("книга", "book", today());
    book.gender = Some("f".into());
    book.usage = Some("Я читаю книгу.".into());
    book.chart = Some(Chart::new(vec![
      vec!["книга".into(), "книги".into()],
      vec!["книгу".into()],
    ]));
    let mut read = Entry::new("читать", "to read", today());
    read.aspect = Some("impf".into());
    read.part_of_speech = Some("verb".into());
    let config =
      Config::new("books", Some(Language::Russian), vec![book, read]).unwrap();

    let text = write_document(&config).unwrap();
    assert!(text.starts_with("lang = \"ru\""));
    assert_eq!(text.matches("[[words]]").count(), 2);

    let back = parse_document(&text, "books", today()).unwrap();
    assert_eq!(back, config);
  }

  #[test]
  fn absent_fields_and_language_are_omitted() {
    let config =
      Config::new("plain", None, vec![Entry::new("a", "b", today())]).unwrap();
    let text = write_document(&config).unwrap();
    assert!(!text.contains("lang"));
    assert!(!text.contains("gender"));
    assert!(!text.contains("charts"));
    assert!(text.contains("word = \"a\""));
  }

  #[test]
  fn stored_charts_are_not_written() {
    let mut entry = Entry::new("кот", "cat", today());
    entry.charts = vec![Chart::new(vec![vec!["кот".into(), "кота".into()]])];
    let config = Config::new("cats", Some(Language::Russian), vec![entry]).unwrap();
    assert!(!write_document(&config).unwrap().contains("charts"));
  }

  #[test]
  fn empty_set_still_writes_words_key() {
    let config = Config::new("empty", Some(Language::French), vec![]).unwrap();
    let text = write_document(&config).unwrap();
    let back = parse_document(&text, "empty", today()).unwrap();
    assert!(back.is_empty());
    assert_eq!(back.language(), Some(Language::French));
  }
}
