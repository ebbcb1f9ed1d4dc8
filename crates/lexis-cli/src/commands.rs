//! Non-interactive subcommands: `list`, `import`, `delete`, `search`,
//! `export` and `reset`.

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use chrono::NaiveDate;
use lexis_core::{SetRepository, store::ScrapedCharts};
use lexis_scrape::Scraper;

// ─── list ─────────────────────────────────────────────────────────────────────

/// Print set names, one per line, or every set row as a JSON array.
pub async fn list<R: SetRepository>(
  repo: &R,
  json: bool,
  out: &mut impl Write,
) -> Result<()> {
  if json {
    let sets = repo.list_sets().await?;
    serde_json::to_writer_pretty(&mut *out, &sets).context("serialising sets")?;
    writeln!(out)?;
  } else {
    for name in repo.list_set_names().await? {
      writeln!(out, "{name}")?;
    }
  }
  Ok(())
}

// ─── import ───────────────────────────────────────────────────────────────────

/// Parse, optionally scrape, and import each file in turn.
///
/// A failing file is reported and skipped; the command fails at the end if
/// any file did.
pub async fn import<R: SetRepository>(
  repo: &R,
  scraper: Option<&Scraper>,
  files: &[PathBuf],
  today: NaiveDate,
  out: &mut impl Write,
) -> Result<()> {
  let mut failed = 0;
  for file in files {
    if let Err(err) = import_one(repo, scraper, file, today, out).await {
      writeln!(out, "{}: {err:#}", file.display())?;
      failed += 1;
    }
  }
  if failed > 0 {
    bail!("{failed} of {} files failed to import", files.len());
  }
  Ok(())
}

async fn import_one<R: SetRepository>(
  repo: &R,
  scraper: Option<&Scraper>,
  file: &Path,
  today: NaiveDate,
  out: &mut impl Write,
) -> Result<()> {
  let config = lexis_toml::parse_file(file, today)
    .with_context(|| format!("parsing {}", file.display()))?;

  let scraped = match scraper {
    Some(scraper) => {
      // Explicit charts win on import, so those words need no fetch.
      let words = config
        .entries()
        .iter()
        .filter(|e| e.chart.is_none())
        .map(|e| e.word.as_str());
      let report = scraper.scrape(words, config.language()).await;
      for (word, err) in &report.failures {
        writeln!(out, "  no charts for {word}: {err}")?;
      }
      report.charts
    }
    None => ScrapedCharts::new(),
  };

  let created = repo
    .import(config.name(), &config, &scraped)
    .await
    .with_context(|| format!("importing {}", config.name()))?;

  let verb = if created { "created" } else { "updated" };
  writeln!(out, "{verb} {} ({} words)", config.name(), config.len())?;
  Ok(())
}

// ─── delete ───────────────────────────────────────────────────────────────────

/// Delete the set called `name`. An unknown name is reported, not an error.
pub async fn delete<R: SetRepository>(
  repo: &R,
  name: &str,
  out: &mut impl Write,
) -> Result<()> {
  let Some(id) = repo.get_id_from_name(name).await? else {
    writeln!(out, "no set named {name}")?;
    return Ok(());
  };
  if repo.delete_set(id).await? {
    writeln!(out, "deleted {name}")?;
  } else {
    writeln!(out, "no set named {name}")?;
  }
  Ok(())
}

// ─── search ───────────────────────────────────────────────────────────────────

/// Print every word whose text or definition contains `query`.
pub async fn search<R: SetRepository>(
  repo: &R,
  query: &str,
  json: bool,
  out: &mut impl Write,
) -> Result<()> {
  let hits = repo.search(query).await?;
  if json {
    serde_json::to_writer_pretty(&mut *out, &hits).context("serialising matches")?;
    writeln!(out)?;
    return Ok(());
  }
  if hits.is_empty() {
    writeln!(out, "no words match {query}")?;
  }
  for hit in &hits {
    match &hit.usage {
      Some(usage) => {
        writeln!(out, "{}  {}  ({usage})  [{}]", hit.word, hit.definition, hit.set)?
      }
      None => writeln!(out, "{}  {}  [{}]", hit.word, hit.definition, hit.set)?,
    }
  }
  Ok(())
}

// ─── export ───────────────────────────────────────────────────────────────────

/// Write the set called `name` back out as a word file.
pub async fn export<R: SetRepository>(
  repo: &R,
  name: &str,
  dest: &Path,
  out: &mut impl Write,
) -> Result<()> {
  let Some(config) = repo.export(name).await? else {
    writeln!(out, "no set named {name}")?;
    return Ok(());
  };
  let written = lexis_toml::export(&config, dest)
    .with_context(|| format!("exporting {name}"))?;
  writeln!(out, "exported {name} ({} words) to {}", config.len(), written.display())?;
  Ok(())
}

// ─── reset ────────────────────────────────────────────────────────────────────

/// Remove every set. Refuses unless `confirmed`.
pub async fn reset<R: SetRepository>(
  repo: &R,
  confirmed: bool,
  out: &mut impl Write,
) -> Result<()> {
  if !confirmed {
    bail!("reset deletes every set and its progress; pass --yes to confirm");
  }
  let removed = repo.reset().await?;
  writeln!(out, "removed {removed} sets")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use lexis_store_sqlite::SqliteStore;

  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() }

  async fn store() -> SqliteStore { SqliteStore::open_in_memory().await.unwrap() }

  fn output(buf: Vec<u8>) -> String { String::from_utf8(buf).unwrap() }

  fn write_set(dir: &tempfile::TempDir, file: &str, body: &str) -> PathBuf {
    let path = dir.path().join(file);
    std::fs::write(&path, body).unwrap();
    path
  }

  #[tokio::test]
  async fn import_then_list_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_set(
      &dir,
      "nouns.toml",
      "lang = \"ru\"\n[[words]]\nword = \"дом\"\ndefinition = \"house\"\n",
    );
    let s = store().await;

    let mut out = Vec::new();
    import(&s, None, &[path.clone()], today(), &mut out).await.unwrap();
    let name = "nouns";
    assert_eq!(output(out), "created nouns (1 words)\n");

    let mut out = Vec::new();
    import(&s, None, &[path], today(), &mut out).await.unwrap();
    assert!(output(out).starts_with("updated "));

    let mut out = Vec::new();
    list(&s, false, &mut out).await.unwrap();
    assert_eq!(output(out), format!("{name}\n"));

    let mut out = Vec::new();
    list(&s, true, &mut out).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json[0]["name"], name);
    assert_eq!(json[0]["language"], "ru");

    let mut out = Vec::new();
    delete(&s, name, &mut out).await.unwrap();
    assert_eq!(output(out), format!("deleted {name}\n"));
    assert!(s.list_set_names().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn delete_unknown_name_is_not_an_error() {
    let mut out = Vec::new();
    delete(&store().await, "nope", &mut out).await.unwrap();
    assert_eq!(output(out), "no set named nope\n");
  }

  #[tokio::test]
  async fn bad_file_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_set(&dir, "bad.toml", "lang = \"de\"\nwords = []\n");
    let good = write_set(&dir, "good.toml", "[[words]]\nword = \"a\"\ndefinition = \"b\"\n");
    let s = store().await;

    let mut out = Vec::new();
    let err = import(&s, None, &[bad, good], today(), &mut out).await.unwrap_err();
    assert!(err.to_string().contains("1 of 2"));
    assert!(output(out).contains("not supported"));
    assert_eq!(s.list_set_names().await.unwrap().len(), 1);
  }

  async fn imported(dir: &tempfile::TempDir, s: &SqliteStore) {
    let nouns = write_set(
      dir,
      "nouns.toml",
      "lang = \"ru\"\n[[words]]\nword = \"дом\"\ndefinition = \"house\"\n\
       usage = \"Мой дом.\"\n[[words]]\nword = \"кот\"\ndefinition = \"cat\"\n",
    );
    let verbs = write_set(
      dir,
      "verbs.toml",
      "lang = \"ru\"\n[[words]]\nword = \"строить\"\ndefinition = \"to build a house\"\n",
    );
    import(s, None, &[nouns, verbs], today(), &mut Vec::new()).await.unwrap();
  }

  #[tokio::test]
  async fn search_prints_word_definition_usage_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let s = store().await;
    imported(&dir, &s).await;

    let mut out = Vec::new();
    search(&s, "house", false, &mut out).await.unwrap();
    assert_eq!(
      output(out),
      "дом  house  (Мой дом.)  [nouns]\nстроить  to build a house  [verbs]\n"
    );

    let mut out = Vec::new();
    search(&s, "кот", true, &mut out).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["set"], "nouns");

    let mut out = Vec::new();
    search(&s, "zebra", false, &mut out).await.unwrap();
    assert_eq!(output(out), "no words match zebra\n");
  }

  #[tokio::test]
  async fn export_writes_a_file_that_imports_again() {
    let dir = tempfile::tempdir().unwrap();
    let s = store().await;
    imported(&dir, &s).await;

    let dest = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    export(&s, "nouns", dest.path(), &mut out).await.unwrap();
    let written = dest.path().join("nouns.toml");
    assert_eq!(
      output(out),
      format!("exported nouns (2 words) to {}\n", written.display())
    );

    let config = lexis_toml::parse_file(&written, today()).unwrap();
    assert_eq!(config.name(), "nouns");
    assert_eq!(config.words().collect::<Vec<_>>(), ["дом", "кот"]);
    assert_eq!(config.entries()[0].usage.as_deref(), Some("Мой дом."));

    let mut out = Vec::new();
    export(&s, "nope", dest.path(), &mut out).await.unwrap();
    assert_eq!(output(out), "no set named nope\n");
  }

  #[tokio::test]
  async fn reset_needs_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let s = store().await;
    imported(&dir, &s).await;

    let mut out = Vec::new();
    let err = reset(&s, false, &mut out).await.unwrap_err();
    assert!(err.to_string().contains("--yes"));
    assert_eq!(s.list_set_names().await.unwrap().len(), 2);

    let mut out = Vec::new();
    reset(&s, true, &mut out).await.unwrap();
    assert_eq!(output(out), "removed 2 sets\n");
    assert!(s.list_set_names().await.unwrap().is_empty());
    assert!(s.search("дом").await.unwrap().is_empty());
  }
}
