//! Word-file document model and its mapping onto [`lexis_core`] types.
//!
//! Pipeline:
//!   raw &str
//!     └─ toml::from_str()   → RawDocument
//!          └─ into_entry()   → Entry (per `[[words]]` table)
//!               └─ Config::new() → validated Config

use chrono::NaiveDate;
use lexis_core::{
  entry::{Chart, Config, Entry},
  language::Language,
};
use serde::Deserialize;

use crate::error::{Error, Result};

// ─── Document representation ─────────────────────────────────────────────────

/// The file as written. Every key is optional here so that a missing key is
/// reported against the entry it belongs to rather than as a bare serde
/// message.
#[derive(Deserialize)]
struct RawDocument {
  lang:  Option<String>,
  words: Option<Vec<RawEntry>>,
}

#[derive(Deserialize)]
struct RawEntry {
  word:           Option<String>,
  definition:     Option<String>,
  gender:         Option<String>,
  aspect:         Option<String>,
  usage:          Option<String>,
  part_of_speech: Option<String>,
  charts:         Option<Vec<Vec<String>>>,
}

impl RawEntry {
  fn into_entry(self, index: usize, today: NaiveDate) -> Result<Entry> {
    let Some(word) = self.word else {
      return Err(Error::MissingField {
        field: "word",
        entry: format!("entry #{}", index + 1),
      });
    };
    let Some(definition) = self.definition else {
      return Err(Error::MissingField {
        field: "definition",
        entry: format!("entry #{} ({word:?})", index + 1),
      });
    };

    let chart = self.charts.map(Chart::from);
    if let Some(chart) = &chart {
      chart.check_width(&word)?;
    }

    let mut entry = Entry::new(word, definition, today);
    entry.gender = self.gender;
    entry.aspect = self.aspect;
    entry.usage = self.usage;
    entry.part_of_speech = self.part_of_speech;
    entry.chart = chart;
    Ok(entry)
  }
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

fn parse_language(tag: Option<String>) -> Result<Option<Language>> {
  let Some(tag) = tag else {
    return Ok(None);
  };
  tag
    .parse::<Language>()
    .map(Some)
    .map_err(|_| Error::UnsupportedLanguage(tag))
}

/// Parse a whole document into a [`Config`] named `name`.
pub(crate) fn parse_document(
  input: &str,
  name: &str,
  today: NaiveDate,
) -> Result<Config> {
  let doc: RawDocument = toml::from_str(input)?;
  let language = parse_language(doc.lang)?;

  let Some(words) = doc.words else {
    return Err(Error::MissingField {
      field: "words",
      entry: "document".to_owned(),
    });
  };

  let entries = words
    .into_iter()
    .enumerate()
    .map(|(i, raw)| raw.into_entry(i, today))
    .collect::<Result<Vec<_>>>()?;

  tracing::debug!(set = %name, words = entries.len(), ?language, "parsed word file");
  Ok(Config::new(name, language, entries)?)
}
