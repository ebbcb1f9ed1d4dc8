//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Dates are stored as ISO 8601 `YYYY-MM-DD` strings, booleans as `0`/`1`,
//! languages as their two-letter tag and a word's chart tables as a
//! comma-separated list.

use chrono::NaiveDate;
use lexis_core::{
  entry::{Chart, Entry, RepetitionState},
  language::Language,
  store::{FlashcardSet, SetId},
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Language ────────────────────────────────────────────────────────────────

pub fn encode_language(lang: Option<Language>) -> Option<&'static str> {
  lang.map(Language::code)
}

pub fn decode_language(s: Option<&str>) -> Result<Option<Language>> {
  Ok(s.map(str::parse::<Language>).transpose()?)
}

// ─── Chart table list ────────────────────────────────────────────────────────

pub fn encode_chart_tables(tables: &[String]) -> String { tables.join(",") }

pub fn decode_chart_tables(s: &str) -> Vec<String> {
  s.split(',')
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Rebuild a chart row from its lettered columns. Cells past the row's end
/// were never written and come back as trailing NULLs.
pub fn decode_chart_row(mut cells: Vec<Option<String>>) -> Vec<String> {
  while matches!(cells.last(), Some(None)) {
    cells.pop();
  }
  cells.into_iter().map(Option::unwrap_or_default).collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Plain values of one `words` row, minus the owning set and chart list.
pub struct RawWord {
  pub word:            String,
  pub definition:      String,
  pub gender:          Option<String>,
  pub aspect:          Option<String>,
  pub usage:           Option<String>,
  pub part_of_speech:  Option<String>,
  pub easiness_factor: f64,
  pub num_correct:     i64,
  pub in_n_days:       i64,
  pub date_of_next:    String,
  pub review:          i64,
}

impl RawWord {
  pub fn from_entry(entry: &Entry) -> Self {
    let rep = &entry.repetition;
    Self {
      word:            entry.word.clone(),
      definition:      entry.definition.clone(),
      gender:          entry.gender.clone(),
      aspect:          entry.aspect.clone(),
      usage:           entry.usage.clone(),
      part_of_speech:  entry.part_of_speech.clone(),
      easiness_factor: rep.easiness_factor,
      num_correct:     i64::from(rep.num_correct),
      in_n_days:       i64::from(rep.in_n_days),
      date_of_next:    encode_date(rep.date_of_next),
      review:          i64::from(rep.should_review),
    }
  }

  pub fn into_entry(
    self,
    charts: Vec<Chart>,
    language: Option<Language>,
  ) -> Result<Entry> {
    let repetition = RepetitionState {
      easiness_factor: self.easiness_factor,
      num_correct:     decode_count(&self.word, "num_correct", self.num_correct)?,
      in_n_days:       decode_count(&self.word, "in_n_days", self.in_n_days)?,
      date_of_next:    decode_date(&self.date_of_next)?,
      should_review:   self.review != 0,
    };
    Ok(Entry {
      word: self.word,
      definition: self.definition,
      gender: self.gender,
      aspect: self.aspect,
      usage: self.usage,
      part_of_speech: self.part_of_speech,
      chart: None,
      charts,
      repetition,
      language,
    })
  }
}

fn decode_count(word: &str, column: &str, value: i64) -> Result<u32> {
  u32::try_from(value)
    .map_err(|_| Error::Decode(format!("{column} = {value} for word {word:?}")))
}

/// The five scheduling columns of a word, encoded for an `UPDATE`.
pub struct RawRepetition {
  pub easiness_factor: f64,
  pub num_correct:     i64,
  pub in_n_days:       i64,
  pub date_of_next:    String,
  pub review:          i64,
}

impl From<&RepetitionState> for RawRepetition {
  fn from(rep: &RepetitionState) -> Self {
    Self {
      easiness_factor: rep.easiness_factor,
      num_correct:     i64::from(rep.num_correct),
      in_n_days:       i64::from(rep.in_n_days),
      date_of_next:    encode_date(rep.date_of_next),
      review:          i64::from(rep.should_review),
    }
  }
}

/// Raw values read directly from a `flashcard_sets` row.
pub struct RawSet {
  pub set_id: i64,
  pub name:   String,
  pub lang:   Option<String>,
}

impl RawSet {
  pub fn into_set(self) -> Result<FlashcardSet> {
    Ok(FlashcardSet {
      set_id:   SetId(self.set_id),
      name:     self.name,
      language: decode_language(self.lang.as_deref())?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_are_iso() {
    let d = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
    assert_eq!(encode_date(d), "2024-01-09");
    assert_eq!(decode_date("2024-01-09").unwrap(), d);
    assert!(matches!(decode_date("09/01/2024"), Err(Error::DateParse(_))));
  }

  #[test]
  fn chart_table_list() {
    let tables = vec!["chart_1".to_owned(), "chart_2".to_owned()];
    assert_eq!(decode_chart_tables(&encode_chart_tables(&tables)), tables);
    assert!(decode_chart_tables("").is_empty());
  }

  #[test]
  fn chart_row_trims_unwritten_cells() {
    let row = decode_chart_row(vec![Some("a".into()), Some("".into()), None, None]);
    assert_eq!(row, ["a", ""]);
    assert!(decode_chart_row(vec![None, None]).is_empty());
  }

  #[test]
  fn unknown_stored_language_is_an_error() {
    assert!(matches!(
      decode_language(Some("xx")),
      Err(Error::Core(lexis_core::Error::UnsupportedLanguage(_)))
    ));
    assert_eq!(decode_language(None).unwrap(), None);
  }
}
