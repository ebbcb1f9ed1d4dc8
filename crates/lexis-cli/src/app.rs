//! Application state machine and event dispatcher.

use std::collections::BTreeSet;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use lexis_core::{
  Config, FlashcardSet, Grade, SearchHit, SessionQueue, SetRepository,
  store::persist_session,
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Choose which sets to study.
  Picker,
  /// Work through a session's cards.
  Study,
  /// Look words up across every set.
  Search,
}

/// What the study card currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
  /// Definition, with aspect and part of speech.
  Front,
  /// The word, with its gender.
  Back,
  Usage,
  Charts,
}

/// A running study sitting.
pub struct Study {
  pub session: SessionQueue,
  pub face:    Face,
  /// Cards in the queue when the sitting started.
  pub total:   usize,
  pub graded:  usize,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<R> {
  pub screen: Screen,

  /// All sets in the store, in import order.
  pub sets: Vec<FlashcardSet>,

  /// Names of the sets ticked for the next sitting.
  pub selected: BTreeSet<String>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* set list.
  pub list_cursor: usize,

  /// Set awaiting a `y` to confirm deletion.
  pub pending_delete: Option<FlashcardSet>,

  pub study: Option<Study>,

  /// Word search query; typed into while `search_active`.
  pub search_query: String,

  pub search_active: bool,

  /// Results of the last word search.
  pub search_hits: Vec<SearchHit>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  repo:  R,
  today: NaiveDate,
}

impl<R: SetRepository> App<R> {
  pub fn new(repo: R, today: NaiveDate) -> Self {
    Self {
      screen: Screen::Picker,
      sets: Vec::new(),
      selected: BTreeSet::new(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      pending_delete: None,
      study: None,
      search_query: String::new(),
      search_active: false,
      search_hits: Vec::new(),
      status_msg: String::new(),
      repo,
      today,
    }
  }

  pub fn today(&self) -> NaiveDate { self.today }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Refresh `self.sets` from the store, dropping stale selections.
  pub async fn load_sets(&mut self) -> Result<()> {
    self.sets = self.repo.list_sets().await.context("listing sets")?;
    let names: BTreeSet<&str> = self.sets.iter().map(|s| s.name.as_str()).collect();
    self.selected.retain(|n| names.contains(n.as_str()));
    let len = self.filtered_sets().len();
    self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
    Ok(())
  }

  /// Load and merge the studyable words of every set in `names`.
  async fn load_study_config(&self, names: &[String]) -> Result<Option<Config>> {
    let mut merged: Option<Config> = None;
    for name in names {
      let Some(config) = self
        .repo
        .load_as_of(name, self.today)
        .await
        .with_context(|| format!("loading {name}"))?
      else {
        anyhow::bail!("no set named {name}");
      };
      match merged.as_mut() {
        Some(m) => m.extend(config)?,
        None => merged = Some(config),
      }
    }
    Ok(merged)
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Returns sets whose name matches the current filter query.
  pub fn filtered_sets(&self) -> Vec<&FlashcardSet> {
    if self.filter.is_empty() {
      return self.sets.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .sets
      .iter()
      .filter(|s| matcher.fuzzy_match(&s.name, &self.filter).is_some())
      .collect()
  }

  /// The set under the list cursor in the filtered view, if any.
  pub fn cursor_set(&self) -> Option<&FlashcardSet> {
    self.filtered_sets().get(self.list_cursor).copied()
  }

  // ── Study sitting ─────────────────────────────────────────────────────────

  /// Start a sitting over `names`, or over the ticked sets when empty, or
  /// over the set under the cursor when nothing is ticked.
  pub async fn start_study(&mut self, names: Vec<String>) -> Result<()> {
    let names = if !names.is_empty() {
      names
    } else if !self.selected.is_empty() {
      self.selected.iter().cloned().collect()
    } else if let Some(set) = self.cursor_set() {
      vec![set.name.clone()]
    } else {
      self.status_msg = "No sets to study.".into();
      return Ok(());
    };

    let config = match self.load_study_config(&names).await {
      Ok(config) => config,
      Err(e) => {
        self.status_msg = format!("Error: {e:#}");
        return Ok(());
      }
    };

    let session = SessionQueue::new(
      config.map(Config::into_entries).unwrap_or_default(),
      self.today,
    );
    if session.is_finished() {
      self.status_msg = "Nothing to study today.".into();
      return Ok(());
    }

    tracing::info!(sets = names.len(), cards = session.flashcards_left(), "study started");
    self.study = Some(Study {
      total: session.flashcards_left(),
      session,
      face: Face::Front,
      graded: 0,
    });
    self.status_msg.clear();
    self.screen = Screen::Study;
    Ok(())
  }

  /// Grade the current card and persist its new state straight away.
  async fn grade(&mut self, score: Grade) -> Result<()> {
    let today = self.today;
    let Some(study) = self.study.as_mut() else {
      return Ok(());
    };
    let Some(word) = study.session.current().map(|(e, _)| e.word.clone()) else {
      return Ok(());
    };

    study.session.grade(score, today);
    study.graded += 1;
    study.face = Face::Front;

    if let Some(entry) = study.session.entry(&word) {
      self
        .repo
        .persist(&entry.word, &entry.repetition)
        .await
        .with_context(|| format!("saving {word}"))?;
    }

    self.status_msg = if study.session.is_finished() {
      "All done!".into()
    } else {
      format!("{word}: {}", score.label())
    };
    Ok(())
  }

  /// Flush the sitting, if any, and return to the picker.
  pub async fn end_study(&mut self) -> Result<()> {
    if let Some(study) = self.study.take() {
      let saved = persist_session(&self.repo, &study.session)
        .await
        .context("saving session")?;
      tracing::info!(graded = study.graded, saved, "study ended");
      self.status_msg = format!("Saved {saved} words.");
    }
    self.screen = Screen::Picker;
    self.load_sets().await
  }

  // ── Word search ───────────────────────────────────────────────────────────

  async fn run_search(&mut self) -> Result<()> {
    self.search_hits = self
      .repo
      .search(&self.search_query)
      .await
      .with_context(|| format!("searching for {}", self.search_query))?;
    self.status_msg = match self.search_hits.len() {
      0 => format!("No words match {}.", self.search_query),
      1 => "1 match.".into(),
      n => format!("{n} matches."),
    };
    Ok(())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // Filter input mode: all printable keys go into the filter string.
    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }
    if self.search_active {
      self.handle_search_input(key).await?;
      return Ok(true);
    }

    match self.screen {
      Screen::Picker => self.handle_picker_key(key).await,
      Screen::Study => self.handle_study_key(key).await,
      Screen::Search => Ok(self.handle_search_key(key)),
    }
  }

  async fn handle_search_input(&mut self, key: KeyEvent) -> Result<()> {
    match key.code {
      KeyCode::Esc => {
        self.search_active = false;
        self.screen = Screen::Picker;
        self.status_msg.clear();
      }
      KeyCode::Enter => {
        self.search_active = false;
        self.run_search().await?;
      }
      KeyCode::Backspace => {
        self.search_query.pop();
      }
      KeyCode::Char(c) => self.search_query.push(c),
      _ => {}
    }
    Ok(())
  }

  /// Keys on the search results screen.
  fn handle_search_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.screen = Screen::Picker;
        self.status_msg.clear();
      }
      KeyCode::Char('s') | KeyCode::Char('/') => {
        self.search_active = true;
        self.search_query.clear();
      }
      _ => {}
    }
    true
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_picker_key(&mut self, key: KeyEvent) -> Result<bool> {
    if let Some(set) = self.pending_delete.take() {
      if key.code == KeyCode::Char('y') {
        self.repo.delete_set(set.set_id).await.context("deleting set")?;
        self.status_msg = format!("Deleted {}.", set.name);
        self.load_sets().await?;
      } else {
        self.status_msg.clear();
      }
      return Ok(true);
    }

    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_sets().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Selection
      KeyCode::Char(' ') => {
        if let Some(name) = self.cursor_set().map(|s| s.name.clone())
          && !self.selected.remove(&name)
        {
          self.selected.insert(name);
        }
      }
      KeyCode::Char('a') => {
        if self.selected.len() == self.sets.len() {
          self.selected.clear();
        } else {
          self.selected = self.sets.iter().map(|s| s.name.clone()).collect();
        }
      }

      KeyCode::Char('d') => {
        if let Some(set) = self.cursor_set().cloned() {
          self.status_msg = format!("Delete {}? (y/n)", set.name);
          self.pending_delete = Some(set);
        }
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      // Word search
      KeyCode::Char('s') => {
        self.screen = Screen::Search;
        self.search_active = true;
        self.search_query.clear();
        self.search_hits.clear();
        self.status_msg.clear();
      }

      KeyCode::Enter => self.start_study(Vec::new()).await?,

      _ => {}
    }
    Ok(true)
  }

  async fn handle_study_key(&mut self, key: KeyEvent) -> Result<bool> {
    let Some(study) = self.study.as_mut() else {
      self.screen = Screen::Picker;
      return Ok(true);
    };
    let current = study.session.current().map(|(e, _)| e);

    match key.code {
      KeyCode::Esc => self.end_study().await?,

      KeyCode::Char('f') => study.face = Face::Front,
      KeyCode::Char('b') => study.face = Face::Back,
      KeyCode::Char('u') => match current {
        Some(e) if e.usage.is_some() => study.face = Face::Usage,
        Some(_) => self.status_msg = "No usage example.".into(),
        None => {}
      },
      KeyCode::Char('c') => match current {
        Some(e) if !e.charts.is_empty() => study.face = Face::Charts,
        Some(_) => self.status_msg = "No charts.".into(),
        None => {}
      },

      KeyCode::Char(c @ '0'..='5') => {
        let score = c.to_digit(10).and_then(|d| Grade::new(d as u8).ok());
        if let Some(score) = score {
          self.grade(score).await?;
        }
      }

      _ => {}
    }
    Ok(true)
  }

  /// Flush any running sitting before the program exits.
  pub async fn shutdown(&mut self) -> Result<()> {
    if self.study.is_some() {
      self.end_study().await?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use lexis_core::{Entry, Language, ScrapedCharts};
  use lexis_store_sqlite::SqliteStore;

  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  async fn app_with(sets: &[(&str, &[&str])]) -> App<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for (name, words) in sets {
      let entries = words
        .iter()
        .map(|w| Entry::new(*w, format!("def of {w}"), today()))
        .collect();
      let config = Config::new(*name, Some(Language::French), entries).unwrap();
      store.import(name, &config, &ScrapedCharts::new()).await.unwrap();
    }
    let mut app = App::new(store, today());
    app.load_sets().await.unwrap();
    app
  }

  async fn press(app: &mut App<SqliteStore>, code: KeyCode) -> bool {
    app.handle_key(key(code)).await.unwrap()
  }

  #[tokio::test]
  async fn picker_selection_and_filter() {
    let mut app = app_with(&[("verbs", &["aller"]), ("nouns", &["maison"])]).await;

    press(&mut app, KeyCode::Char(' ')).await;
    assert_eq!(app.selected.iter().collect::<Vec<_>>(), ["verbs"]);

    press(&mut app, KeyCode::Char('a')).await;
    assert_eq!(app.selected.len(), 2);
    press(&mut app, KeyCode::Char('a')).await;
    assert!(app.selected.is_empty());

    press(&mut app, KeyCode::Char('/')).await;
    for c in "nns".chars() {
      press(&mut app, KeyCode::Char(c)).await;
    }
    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.filtered_sets().len(), 1);
    assert_eq!(app.cursor_set().unwrap().name, "nouns");
  }

  #[tokio::test]
  async fn delete_requires_confirmation() {
    let mut app = app_with(&[("verbs", &["aller"])]).await;

    press(&mut app, KeyCode::Char('d')).await;
    press(&mut app, KeyCode::Char('n')).await;
    assert_eq!(app.sets.len(), 1);

    press(&mut app, KeyCode::Char('d')).await;
    press(&mut app, KeyCode::Char('y')).await;
    assert!(app.sets.is_empty());
  }

  #[tokio::test]
  async fn study_grades_persist_and_finish() {
    let mut app = app_with(&[("verbs", &["aller", "venir"])]).await;

    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.screen, Screen::Study);
    assert_eq!(app.study.as_ref().unwrap().total, 2);

    press(&mut app, KeyCode::Char('b')).await;
    assert_eq!(app.study.as_ref().unwrap().face, Face::Back);

    press(&mut app, KeyCode::Char('5')).await;
    // Already saved: only the ungraded word is still due today.
    let due = app.repo.load_as_of("verbs", today()).await.unwrap().unwrap();
    assert_eq!(due.len(), 1);

    press(&mut app, KeyCode::Char('4')).await;
    assert!(app.study.as_ref().unwrap().session.is_finished());
    assert_eq!(app.status_msg, "All done!");

    press(&mut app, KeyCode::Esc).await;
    assert_eq!(app.screen, Screen::Picker);
    assert!(app.study.is_none());
    let due = app.repo.load_as_of("verbs", today()).await.unwrap().unwrap();
    assert!(due.is_empty());
  }

  #[tokio::test]
  async fn nothing_due_stays_on_picker() {
    let mut app = app_with(&[("empty", &[])]).await;
    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.screen, Screen::Picker);
    assert_eq!(app.status_msg, "Nothing to study today.");
  }

  #[tokio::test]
  async fn study_by_name_merges_sets() {
    let mut app = app_with(&[("a", &["un"]), ("b", &["deux"])]).await;
    app.start_study(vec!["a".into(), "b".into()]).await.unwrap();
    assert_eq!(app.study.as_ref().unwrap().total, 2);

    app.shutdown().await.unwrap();
    assert_eq!(app.screen, Screen::Picker);
  }

  #[tokio::test]
  async fn unknown_set_name_is_reported() {
    let mut app = app_with(&[]).await;
    app.start_study(vec!["missing".into()]).await.unwrap();
    assert_eq!(app.screen, Screen::Picker);
    assert!(app.status_msg.contains("no set named missing"));
  }

  #[tokio::test]
  async fn missing_usage_and_charts_keep_face() {
    let mut app = app_with(&[("verbs", &["aller"])]).await;
    press(&mut app, KeyCode::Enter).await;

    press(&mut app, KeyCode::Char('u')).await;
    assert_eq!(app.status_msg, "No usage example.");
    press(&mut app, KeyCode::Char('c')).await;
    assert_eq!(app.status_msg, "No charts.");
    assert_eq!(app.study.as_ref().unwrap().face, Face::Front);
  }

  #[tokio::test]
  async fn word_search_lists_hits_and_returns_to_picker() {
    let mut app = app_with(&[("verbs", &["aller", "venir"]), ("nouns", &["maison"])]).await;

    press(&mut app, KeyCode::Char('s')).await;
    assert_eq!(app.screen, Screen::Search);
    assert!(app.search_active);

    // Picker keys are typed, not obeyed, while the query is open.
    for c in "def of a".chars() {
      press(&mut app, KeyCode::Char(c)).await;
    }
    press(&mut app, KeyCode::Backspace).await;
    press(&mut app, KeyCode::Char('m')).await;
    press(&mut app, KeyCode::Enter).await;

    assert!(!app.search_active);
    assert_eq!(app.search_query, "def of m");
    assert_eq!(app.search_hits.len(), 1);
    assert_eq!(app.search_hits[0].word, "maison");
    assert_eq!(app.search_hits[0].set, "nouns");
    assert_eq!(app.status_msg, "1 match.");

    press(&mut app, KeyCode::Char('s')).await;
    for c in "zzz".chars() {
      press(&mut app, KeyCode::Char(c)).await;
    }
    press(&mut app, KeyCode::Enter).await;
    assert!(app.search_hits.is_empty());
    assert_eq!(app.status_msg, "No words match zzz.");

    assert!(press(&mut app, KeyCode::Char('q')).await);
    assert_eq!(app.screen, Screen::Picker);
    assert_eq!(app.sets.len(), 2);
  }
}
