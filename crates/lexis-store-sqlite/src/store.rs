//! [`SqliteStore`]: the SQLite implementation of [`SetRepository`].
//!
//! Every public operation runs in a single transaction inside one
//! `Connection::call`. SQLite DDL is transactional, so chart tables created or
//! dropped by a failed operation are rolled back together with the rows that
//! reference them.

use std::{collections::HashSet, path::Path};

use chrono::NaiveDate;
use lexis_core::{
  entry::{Chart, Config, Entry, RepetitionState},
  store::{FlashcardSet, ScrapedCharts, SearchHit, SetId, SetRepository},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{
    RawRepetition, RawSet, RawWord, decode_chart_row, decode_chart_tables,
    decode_language, encode_chart_tables, encode_date, encode_language,
  },
  schema::{SCHEMA, create_chart_sql, insert_row_sql, new_chart_table},
};

// ─── Import plan ─────────────────────────────────────────────────────────────

/// One word of an import, with its chart selection already resolved and
/// validated.
struct PlannedWord {
  row:    RawWord,
  charts: Vec<Chart>,
}

/// What the transaction did; conflicts abort before any write.
enum ImportOutcome {
  Imported {
    created: bool,
    added:   usize,
    kept:    usize,
    removed: usize,
  },
  Conflict {
    word: String,
    set:  String,
  },
}

/// Pick the charts for `entry`: its explicit chart, else the scraped ones.
/// Charts without any cell are skipped; charts too wide to store fail the
/// whole import.
fn plan_word(entry: &Entry, scraped: &ScrapedCharts) -> Result<PlannedWord> {
  let candidates = match &entry.chart {
    Some(chart) => vec![chart.clone()],
    None => scraped.get(&entry.word).cloned().unwrap_or_default(),
  };

  let mut charts = Vec::with_capacity(candidates.len());
  for chart in candidates {
    chart.check_width(&entry.word)?;
    if chart.width() == 0 {
      tracing::debug!(word = %entry.word, "skipping chart with no cells");
      continue;
    }
    charts.push(chart);
  }

  Ok(PlannedWord { row: RawWord::from_entry(entry), charts })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A lexis set repository backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the connection, waiting for its thread to finish.
  ///
  /// Every operation commits before returning, so there is nothing left to
  /// flush; this only releases the handle deterministically.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Names of every chart table in the database, for orphan checks.
  #[cfg(test)]
  pub(crate) async fn chart_tables_on_disk(&self) -> Result<Vec<String>> {
    let names = self.conn.call(|conn| Ok(chart_tables(conn)?)).await?;
    Ok(names)
  }

  /// Run raw SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────
//
// These run on the connection thread inside an open transaction.

/// Create one table per chart and fill it; returns the new table names.
fn write_charts(
  conn: &rusqlite::Connection,
  charts: &[Chart],
) -> rusqlite::Result<Vec<String>> {
  let mut tables = Vec::with_capacity(charts.len());
  for chart in charts {
    let table = new_chart_table();
    conn.execute(&create_chart_sql(&table, chart.width()), [])?;
    for row in chart.rows() {
      conn.execute(
        &insert_row_sql(&table, row.len()),
        rusqlite::params_from_iter(row.iter()),
      )?;
    }
    tracing::debug!(%table, rows = chart.rows().len(), "created chart table");
    tables.push(table);
  }
  Ok(tables)
}

fn drop_charts(conn: &rusqlite::Connection, encoded: &str) -> rusqlite::Result<()> {
  for table in decode_chart_tables(encoded) {
    conn.execute(&format!("DROP TABLE IF EXISTS \"{table}\""), [])?;
    tracing::debug!(%table, "dropped chart table");
  }
  Ok(())
}

fn read_chart(
  conn: &rusqlite::Connection,
  table: &str,
) -> rusqlite::Result<Vec<Vec<String>>> {
  let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\" ORDER BY rowid"))?;
  let width = stmt.column_count();
  let rows = stmt
    .query_map([], |row| {
      (0..width)
        .map(|i| row.get::<_, Option<String>>(i))
        .collect::<rusqlite::Result<Vec<_>>>()
    })?
    .map(|cells| cells.map(decode_chart_row))
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn insert_word(
  conn: &rusqlite::Connection,
  set_id: i64,
  planned: &PlannedWord,
) -> rusqlite::Result<()> {
  let tables = write_charts(conn, &planned.charts)?;
  let w = &planned.row;
  conn.execute(
    "INSERT INTO words (
       word, definition, gender, aspect, usage, part_of_speech,
       easiness_factor, num_correct, in_n_days, date_of_next, review,
       set_id, charts
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    rusqlite::params![
      w.word,
      w.definition,
      w.gender,
      w.aspect,
      w.usage,
      w.part_of_speech,
      w.easiness_factor,
      w.num_correct,
      w.in_n_days,
      w.date_of_next,
      w.review,
      set_id,
      encode_chart_tables(&tables),
    ],
  )?;
  Ok(())
}

/// Regenerate a kept word's charts and overwrite its descriptive fields.
/// Scheduling fields are left as they are.
fn update_word(
  conn: &rusqlite::Connection,
  old_charts: &str,
  planned: &PlannedWord,
) -> rusqlite::Result<()> {
  drop_charts(conn, old_charts)?;
  let tables = write_charts(conn, &planned.charts)?;
  let w = &planned.row;
  conn.execute(
    "UPDATE words SET
       definition = ?2, gender = ?3, aspect = ?4, usage = ?5,
       part_of_speech = ?6, charts = ?7
     WHERE word = ?1",
    rusqlite::params![
      w.word,
      w.definition,
      w.gender,
      w.aspect,
      w.usage,
      w.part_of_speech,
      encode_chart_tables(&tables),
    ],
  )?;
  Ok(())
}

fn delete_word(
  conn: &rusqlite::Connection,
  word: &str,
  charts: &str,
) -> rusqlite::Result<()> {
  drop_charts(conn, charts)?;
  conn.execute("DELETE FROM words WHERE word = ?1", rusqlite::params![word])?;
  Ok(())
}

/// `(word, charts)` for every word owned by a set.
fn words_of_set(
  conn: &rusqlite::Connection,
  set_id: i64,
) -> rusqlite::Result<Vec<(String, String)>> {
  let mut stmt =
    conn.prepare("SELECT word, charts FROM words WHERE set_id = ?1 ORDER BY rowid")?;
  let rows = stmt
    .query_map(rusqlite::params![set_id], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Every chart table in the database, referenced or not.
fn chart_tables(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE \
     'chart\\_%' ESCAPE '\\' ORDER BY name",
  )?;
  let names = stmt
    .query_map([], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

/// A set's language and its words with their charts, as stored.
type StoredSet = (Option<String>, Vec<(RawWord, Vec<Vec<Vec<String>>>)>);

/// Read set `name`. With `due_on`, only words studyable on that ISO date
/// are returned.
fn read_set(
  conn: &rusqlite::Connection,
  name: &str,
  due_on: Option<&str>,
) -> rusqlite::Result<Option<StoredSet>> {
  let set: Option<(i64, Option<String>)> = conn
    .query_row(
      "SELECT set_id, lang FROM flashcard_sets WHERE name = ?1",
      rusqlite::params![name],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;
  let Some((set_id, lang)) = set else {
    return Ok(None);
  };

  // ISO dates compare correctly as text.
  let words = {
    let mut stmt = conn.prepare(
      "SELECT
         word, definition, gender, aspect, usage, part_of_speech,
         easiness_factor, num_correct, in_n_days, date_of_next, review,
         charts
       FROM words
       WHERE set_id = ?1 AND (?2 IS NULL OR date_of_next <= ?2 OR review != 0)
       ORDER BY rowid",
    )?;
    stmt
      .query_map(rusqlite::params![set_id, due_on], |row| {
        Ok((
          RawWord {
            word:            row.get(0)?,
            definition:      row.get(1)?,
            gender:          row.get(2)?,
            aspect:          row.get(3)?,
            usage:           row.get(4)?,
            part_of_speech:  row.get(5)?,
            easiness_factor: row.get(6)?,
            num_correct:     row.get(7)?,
            in_n_days:       row.get(8)?,
            date_of_next:    row.get(9)?,
            review:          row.get(10)?,
          },
          row.get::<_, String>(11)?,
        ))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let mut out = Vec::with_capacity(words.len());
  for (raw, charts) in words {
    let charts = decode_chart_tables(&charts)
      .iter()
      .map(|table| read_chart(conn, table))
      .collect::<rusqlite::Result<Vec<_>>>()?;
    out.push((raw, charts));
  }
  Ok(Some((lang, out)))
}

/// Rehydrate a stored set into a [`Config`] called `name`.
fn into_config(name: &str, (lang, words): StoredSet) -> Result<Config> {
  let language = decode_language(lang.as_deref())?;
  let entries = words
    .into_iter()
    .map(|(raw, charts)| {
      raw.into_entry(charts.into_iter().map(Chart::new).collect(), language)
    })
    .collect::<Result<Vec<_>>>()?;
  Ok(Config::new(name, language, entries)?)
}

/// `%query%` for `LIKE ... ESCAPE '\'`, with wildcards in `query` escaped.
fn like_pattern(query: &str) -> String {
  let mut pattern = String::with_capacity(query.len() + 2);
  pattern.push('%');
  for c in query.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── SetRepository impl ──────────────────────────────────────────────────────

impl SetRepository for SqliteStore {
  type Error = Error;

  async fn import(
    &self,
    name: &str,
    config: &Config,
    scraped: &ScrapedCharts,
  ) -> Result<bool> {
    let planned = config
      .entries()
      .iter()
      .map(|entry| plan_word(entry, scraped))
      .collect::<Result<Vec<_>>>()?;

    let name_str = name.to_owned();
    let lang_str = encode_language(config.language());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
          .query_row(
            "SELECT set_id FROM flashcard_sets WHERE name = ?1",
            rusqlite::params![name_str],
            |row| row.get(0),
          )
          .optional()?;

        // Enforce the global word key before the first write.
        for p in &planned {
          let owner: Option<(i64, String)> = tx
            .query_row(
              "SELECT s.set_id, s.name FROM words w
               JOIN flashcard_sets s ON s.set_id = w.set_id
               WHERE w.word = ?1",
              rusqlite::params![p.row.word],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
          if let Some((owner_id, owner_name)) = owner
            && Some(owner_id) != existing
          {
            return Ok(ImportOutcome::Conflict {
              word: p.row.word.clone(),
              set:  owner_name,
            });
          }
        }

        let outcome = match existing {
          None => {
            tx.execute(
              "INSERT INTO flashcard_sets (name, lang) VALUES (?1, ?2)",
              rusqlite::params![name_str, lang_str],
            )?;
            let set_id = tx.last_insert_rowid();
            for p in &planned {
              insert_word(&tx, set_id, p)?;
            }
            ImportOutcome::Imported {
              created: true,
              added:   planned.len(),
              kept:    0,
              removed: 0,
            }
          }
          Some(set_id) => {
            tx.execute(
              "UPDATE flashcard_sets SET lang = ?2 WHERE set_id = ?1",
              rusqlite::params![set_id, lang_str],
            )?;

            let current = words_of_set(&tx, set_id)?;
            let incoming: HashSet<&str> =
              planned.iter().map(|p| p.row.word.as_str()).collect();

            let (mut added, mut kept, mut removed) = (0, 0, 0);
            for (word, charts) in &current {
              if !incoming.contains(word.as_str()) {
                delete_word(&tx, word, charts)?;
                removed += 1;
              }
            }
            for p in &planned {
              match current.iter().find(|(word, _)| *word == p.row.word) {
                Some((_, charts)) => {
                  update_word(&tx, charts, p)?;
                  kept += 1;
                }
                None => {
                  insert_word(&tx, set_id, p)?;
                  added += 1;
                }
              }
            }
            ImportOutcome::Imported { created: false, added, kept, removed }
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    match outcome {
      ImportOutcome::Conflict { word, set } => {
        tracing::warn!(%word, owner = %set, set = %name, "import rejected");
        Err(Error::WordOwnedByOtherSet { word, set })
      }
      ImportOutcome::Imported { created, added, kept, removed } => {
        tracing::info!(set = %name, created, added, kept, removed, "imported set");
        Ok(created)
      }
    }
  }

  async fn delete_set(&self, id: SetId) -> Result<bool> {
    let set_id = id.0;

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM flashcard_sets WHERE set_id = ?1",
            rusqlite::params![set_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(false);
        }

        for (word, charts) in words_of_set(&tx, set_id)? {
          delete_word(&tx, &word, &charts)?;
        }
        tx.execute(
          "DELETE FROM flashcard_sets WHERE set_id = ?1",
          rusqlite::params![set_id],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if deleted {
      tracing::info!(set_id = %id, "deleted set");
    }
    Ok(deleted)
  }

  async fn get_id_from_name(&self, name: &str) -> Result<Option<SetId>> {
    let name_str = name.to_owned();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT set_id FROM flashcard_sets WHERE name = ?1",
              rusqlite::params![name_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(id.map(SetId))
  }

  async fn list_sets(&self) -> Result<Vec<FlashcardSet>> {
    let raws: Vec<RawSet> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT set_id, name, lang FROM flashcard_sets ORDER BY set_id")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSet {
              set_id: row.get(0)?,
              name:   row.get(1)?,
              lang:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSet::into_set).collect()
  }

  async fn list_set_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT name FROM flashcard_sets ORDER BY set_id")?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn load_as_of(
    &self,
    name: &str,
    today: NaiveDate,
  ) -> Result<Option<Config>> {
    let name_str = name.to_owned();
    let today_str = encode_date(today);

    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let stored = read_set(&tx, &name_str, Some(&today_str))?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;

    let Some(stored) = stored else {
      return Ok(None);
    };
    let config = into_config(name, stored)?;
    tracing::debug!(set = %name, words = config.len(), "loaded studyable words");
    Ok(Some(config))
  }

  async fn export(&self, name: &str) -> Result<Option<Config>> {
    let name_str = name.to_owned();

    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let stored = read_set(&tx, &name_str, None)?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;

    stored.map(|stored| into_config(name, stored)).transpose()
  }

  async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
    if query.is_empty() {
      return Ok(Vec::new());
    }
    let pattern = like_pattern(query);

    let hits = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT w.word, w.definition, w.usage, s.name
           FROM words w JOIN flashcard_sets s ON s.set_id = w.set_id
           WHERE w.word LIKE ?1 ESCAPE '\\' OR w.definition LIKE ?1 ESCAPE '\\'
           ORDER BY w.word",
        )?;
        let hits = stmt
          .query_map(rusqlite::params![pattern], |row| {
            Ok(SearchHit {
              word:       row.get(0)?,
              definition: row.get(1)?,
              usage:      row.get(2)?,
              set:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
      })
      .await?;

    tracing::debug!(%query, hits = hits.len(), "searched words");
    Ok(hits)
  }

  async fn reset(&self) -> Result<usize> {
    let removed = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        for table in chart_tables(&tx)? {
          tx.execute(&format!("DROP TABLE \"{table}\""), [])?;
        }
        tx.execute("DELETE FROM words", [])?;
        let removed = tx.execute("DELETE FROM flashcard_sets", [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'flashcard_sets'", [])?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    tracing::info!(sets = removed, "reset store");
    Ok(removed)
  }

  async fn persist(&self, word: &str, state: &RepetitionState) -> Result<bool> {
    let word_str = word.to_owned();
    let rep = RawRepetition::from(state);

    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE words SET
             easiness_factor = ?2, num_correct = ?3, in_n_days = ?4,
             date_of_next = ?5, review = ?6
           WHERE word = ?1",
          rusqlite::params![
            word_str,
            rep.easiness_factor,
            rep.num_correct,
            rep.in_n_days,
            rep.date_of_next,
            rep.review,
          ],
        )?;
        Ok(changed)
      })
      .await?;

    Ok(changed > 0)
  }
}
