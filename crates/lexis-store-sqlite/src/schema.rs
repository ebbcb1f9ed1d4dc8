//! SQL schema for the lexis SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

use uuid::Uuid;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS flashcard_sets (
    set_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    lang    TEXT                -- 'fr' | 'ru' | 'uk' | NULL
);

-- `word` is the global key: a word belongs to exactly one set.
CREATE TABLE IF NOT EXISTS words (
    word            TEXT PRIMARY KEY,
    definition      TEXT NOT NULL,
    gender          TEXT,
    aspect          TEXT,
    usage           TEXT,
    part_of_speech  TEXT,
    easiness_factor REAL NOT NULL,
    num_correct     INTEGER NOT NULL,
    in_n_days       INTEGER NOT NULL,
    date_of_next    TEXT NOT NULL,    -- ISO 8601 date
    review          INTEGER NOT NULL, -- 0 | 1
    set_id          INTEGER NOT NULL REFERENCES flashcard_sets(set_id),
    charts          TEXT NOT NULL DEFAULT ''  -- comma-separated chart tables
);

CREATE INDEX IF NOT EXISTS words_set_idx ON words(set_id);

PRAGMA user_version = 1;
";

/// Prefix shared by every per-chart table.
pub const CHART_TABLE_PREFIX: &str = "chart_";

/// Name for a fresh chart table.
pub fn new_chart_table() -> String {
  format!("{CHART_TABLE_PREFIX}{}", Uuid::new_v4().simple())
}

/// Lettered column name for zero-based index `i` (`0` → `a`).
pub fn column_name(i: usize) -> char {
  debug_assert!(i < lexis_core::entry::MAX_CHART_COLUMNS);
  (b'a' + i as u8) as char
}

/// `CREATE TABLE` statement for a chart `width` columns wide.
pub fn create_chart_sql(table: &str, width: usize) -> String {
  let columns = (0..width)
    .map(|i| format!("{} TEXT", column_name(i)))
    .collect::<Vec<_>>()
    .join(", ");
  format!("CREATE TABLE \"{table}\" ({columns})")
}

/// `INSERT` statement filling the first `len` columns of a chart row.
pub fn insert_row_sql(table: &str, len: usize) -> String {
  if len == 0 {
    return format!("INSERT INTO \"{table}\" DEFAULT VALUES");
  }
  let columns = (0..len)
    .map(|i| column_name(i).to_string())
    .collect::<Vec<_>>()
    .join(", ");
  let params = (1..=len)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  format!("INSERT INTO \"{table}\" ({columns}) VALUES ({params})")
}
