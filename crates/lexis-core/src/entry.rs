//! Entries, charts and word sets.
//!
//! An [`Entry`] is one vocabulary word with its descriptive fields and its
//! [`RepetitionState`]. A [`Config`] is a named collection of entries that is
//! imported, reconciled and loaded as a unit.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, language::Language};

/// Widest chart the store can hold: one lettered column per ASCII letter.
pub const MAX_CHART_COLUMNS: usize = 26;

/// Starting easiness factor for a word that has never been graded.
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

// ─── Chart ───────────────────────────────────────────────────────────────────

/// A ragged two-dimensional table of inflection forms attached to a word.
///
/// Rows keep their order and may differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chart {
  rows: Vec<Vec<String>>,
}

impl Chart {
  pub fn new(rows: Vec<Vec<String>>) -> Self { Self { rows } }

  pub fn rows(&self) -> &[Vec<String>] { &self.rows }

  pub fn into_rows(self) -> Vec<Vec<String>> { self.rows }

  /// Length of the widest row; `0` for a chart with no cells.
  pub fn width(&self) -> usize {
    self.rows.iter().map(Vec::len).max().unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Fail with [`Error::ChartTooWide`] when the chart cannot be stored.
  pub fn check_width(&self, word: &str) -> Result<()> {
    let width = self.width();
    if width > MAX_CHART_COLUMNS {
      return Err(Error::ChartTooWide { word: word.to_owned(), width });
    }
    Ok(())
  }
}

impl From<Vec<Vec<String>>> for Chart {
  fn from(rows: Vec<Vec<String>>) -> Self { Self::new(rows) }
}

// ─── RepetitionState ─────────────────────────────────────────────────────────

/// Scheduling state of a single word.
///
/// Mutated only by [`crate::schedule`]; persisted after every grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionState {
  /// Never below [`crate::schedule::MIN_EASINESS_FACTOR`].
  pub easiness_factor: f64,
  /// Current streak of successful recalls.
  pub num_correct:     u32,
  /// Interval in days computed by the last grade; `0` before the first one.
  pub in_n_days:       u32,
  pub date_of_next:    NaiveDate,
  /// Repeat the word again in the current sitting.
  pub should_review:   bool,
}

impl RepetitionState {
  /// State of a freshly imported word: due on `today`, nothing learned yet.
  pub fn new(today: NaiveDate) -> Self {
    Self {
      easiness_factor: DEFAULT_EASINESS_FACTOR,
      num_correct:     0,
      in_n_days:       0,
      date_of_next:    today,
      should_review:   false,
    }
  }

  /// Whether the long-term next-review date has arrived.
  pub fn is_due(&self, today: NaiveDate) -> bool { self.date_of_next <= today }

  /// Whether the word belongs in a sitting held on `today`.
  pub fn is_studyable(&self, today: NaiveDate) -> bool {
    self.is_due(today) || self.should_review
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// One vocabulary word plus its metadata and scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  /// Identity key; unique across the whole store.
  pub word:           String,
  pub definition:     String,
  pub gender:         Option<String>,
  pub aspect:         Option<String>,
  pub usage:          Option<String>,
  pub part_of_speech: Option<String>,
  /// Chart given explicitly in the source document. Takes precedence over
  /// scraped charts on import.
  pub chart:          Option<Chart>,
  /// Charts attached to the word in the store; filled in by `load`.
  pub charts:         Vec<Chart>,
  pub repetition:     RepetitionState,
  pub language:       Option<Language>,
}

impl Entry {
  /// Convenience constructor with all optional fields empty.
  pub fn new(
    word: impl Into<String>,
    definition: impl Into<String>,
    today: NaiveDate,
  ) -> Self {
    Self {
      word:           word.into(),
      definition:     definition.into(),
      gender:         None,
      aspect:         None,
      usage:          None,
      part_of_speech: None,
      chart:          None,
      charts:         Vec::new(),
      repetition:     RepetitionState::new(today),
      language:       None,
    }
  }

  /// The word as shown on the back of a card, e.g. `[f] книга`.
  pub fn show_word(&self) -> String {
    match &self.gender {
      Some(gender) => format!("[{gender}] {}", self.word),
      None => self.word.clone(),
    }
  }

  /// The definition as shown on the front of a card, e.g.
  /// `[impf] [verb] to read`.
  pub fn show_definition(&self) -> String {
    let mut shown = self.definition.clone();
    if let Some(pos) = &self.part_of_speech {
      shown = format!("[{pos}] {shown}");
    }
    if let Some(aspect) = &self.aspect {
      shown = format!("[{aspect}] {shown}");
    }
    shown
  }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// A named collection of entries. Sets are imported, updated and deleted
/// as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  name:     String,
  language: Option<Language>,
  entries:  Vec<Entry>,
}

impl Config {
  /// Build a config, enforcing that tagged entries agree with the set's
  /// language and that no word appears twice.
  ///
  /// Entries without a language inherit the set's.
  pub fn new(
    name: impl Into<String>,
    language: Option<Language>,
    mut entries: Vec<Entry>,
  ) -> Result<Self> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &mut entries {
      if !seen.insert(entry.word.clone()) {
        return Err(Error::DuplicateWord(entry.word.clone()));
      }
      match (language, entry.language) {
        (Some(expected), Some(found)) if expected != found => {
          return Err(Error::LanguageMismatch {
            word:     entry.word.clone(),
            expected: expected.to_string(),
            found:    found.to_string(),
          });
        }
        (Some(expected), None) => entry.language = Some(expected),
        _ => {}
      }
    }
    Ok(Self { name: name.into(), language, entries })
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn language(&self) -> Option<Language> { self.language }

  pub fn entries(&self) -> &[Entry] { &self.entries }

  pub fn into_entries(self) -> Vec<Entry> { self.entries }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn words(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|e| e.word.as_str())
  }

  /// Append another set's entries, for studying several sets in one sitting.
  pub fn extend(&mut self, other: Config) -> Result<()> {
    if self.language != other.language {
      return Err(Error::ConfigLanguageMismatch {
        left:  describe(self.language),
        right: describe(other.language),
      });
    }
    self.entries.extend(other.entries);
    Ok(())
  }
}

fn describe(lang: Option<Language>) -> String {
  lang.map_or_else(|| "no language".to_owned(), |l| l.to_string())
}
