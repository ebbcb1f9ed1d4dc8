//! The `SetRepository` trait and the persisted set type.
//!
//! The trait is implemented by storage backends (e.g. `lexis-store-sqlite`).
//! The CLI depends on this abstraction; only the binary's wiring names a
//! concrete backend.

use std::{collections::HashMap, fmt, future::Future};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  entry::{Chart, Config, RepetitionState},
  language::Language,
  session::SessionQueue,
};

/// Charts fetched for a batch of words, keyed by word.
pub type ScrapedCharts = HashMap<String, Vec<Chart>>;

// ─── FlashcardSet ────────────────────────────────────────────────────────────

/// Store-assigned identifier of an imported set.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SetId(pub i64);

impl fmt::Display for SetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// One imported set as persisted: identifier, source name, language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSet {
  pub set_id:   SetId,
  pub name:     String,
  pub language: Option<Language>,
}

/// One word matched by [`SetRepository::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  pub word:       String,
  pub definition: String,
  pub usage:      Option<String>,
  /// Name of the set that owns the word.
  pub set:        String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a persistent store of word sets.
///
/// Every operation is atomic with respect to the backend's commit boundary:
/// a failed call leaves the store as it was before the call.
///
/// "Not found" is never an error: lookups return `None`, deletions and
/// updates report whether anything matched.
pub trait SetRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Import `config` under `name`, creating the set or reconciling an
  /// existing one. Returns `true` if the set was newly created.
  ///
  /// Each word's charts are its explicit chart when present, else
  /// `scraped[word]`, else none. On reconciliation added words are
  /// inserted, kept words have their charts regenerated and fields
  /// overwritten, and removed words are deleted with their charts.
  fn import<'a>(
    &'a self,
    name: &'a str,
    config: &'a Config,
    scraped: &'a ScrapedCharts,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a set, its words and their charts. Returns `false` if no set
  /// has this id.
  fn delete_set(
    &self,
    id: SetId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Resolve a set name to its id.
  fn get_id_from_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<SetId>, Self::Error>> + Send + 'a;

  /// All persisted sets, in import order.
  fn list_sets(
    &self,
  ) -> impl Future<Output = Result<Vec<FlashcardSet>, Self::Error>> + Send + '_;

  /// All persisted set names, in import order.
  fn list_set_names(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Rehydrate the words of set `name` that are studyable on `today`: due,
  /// or flagged for review. Returns `None` for an unknown name.
  fn load_as_of<'a>(
    &'a self,
    name: &'a str,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Option<Config>, Self::Error>> + Send + 'a;

  /// [`Self::load_as_of`] for the local calendar date.
  fn load<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Config>, Self::Error>> + Send + 'a {
    self.load_as_of(name, crate::today())
  }

  /// Every word of set `name`, due or not, as it would be written back to a
  /// word file. Returns `None` for an unknown name.
  fn export<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Config>, Self::Error>> + Send + 'a;

  /// Words across all sets whose word or definition contains `query`,
  /// case-insensitively for ASCII, ordered by word. An empty query matches
  /// nothing.
  fn search<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a;

  /// Remove every set, word and chart. Returns the number of sets removed.
  fn reset(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Overwrite the five scheduling fields of `word`. Descriptive fields and
  /// charts are untouched. Returns `false` if the word is not stored.
  fn persist<'a>(
    &'a self,
    word: &'a str,
    state: &'a RepetitionState,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

/// Write the final state of every entry a sitting touched, once each.
/// Returns the number of rows updated.
pub async fn persist_session<R: SetRepository>(
  repo: &R,
  session: &SessionQueue,
) -> Result<usize, R::Error> {
  let mut updated = 0;
  for entry in session.all_entries() {
    if repo.persist(&entry.word, &entry.repetition).await? {
      updated += 1;
    } else {
      tracing::warn!(word = %entry.word, "studied word is no longer stored");
    }
  }
  tracing::debug!(updated, "flushed study session");
  Ok(updated)
}
