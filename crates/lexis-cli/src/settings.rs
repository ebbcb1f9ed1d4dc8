//! Layered runtime settings: built-in defaults, an optional TOML file, then
//! `LEXIS_*` environment variables. Command-line flags are applied last by
//! the caller.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use lexis_scrape::{DEFAULT_BASE_URL, ScraperConfig};
use serde::Deserialize;

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/lexis/config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file.
  pub database:             PathBuf,
  /// Fetch inflection charts on import.
  pub scrape:               bool,
  pub wiktionary_url:       String,
  pub request_timeout_secs: u64,
  /// Log file; logs go to stderr when unset.
  pub log_file:             Option<PathBuf>,
}

impl Settings {
  /// Read settings from `file` (missing is fine) and the environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    Self::load_with_env(file, config::Environment::with_prefix("LEXIS"))
  }

  fn load_with_env(
    file: &Path,
    env: config::Environment,
  ) -> anyhow::Result<Self> {
    let file = expand_tilde(file);
    let settings = config::Config::builder()
      .set_default("database", "~/.local/share/lexis/lexis.db")?
      .set_default("scrape", true)?
      .set_default("wiktionary_url", DEFAULT_BASE_URL)?
      .set_default("request_timeout_secs", 30_i64)?
      .add_source(config::File::from(file.as_path()).required(false))
      .add_source(env)
      .build()
      .with_context(|| format!("failed to read settings from {}", file.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.database = expand_tilde(&settings.database);
    settings.log_file = settings.log_file.as_deref().map(expand_tilde);
    Ok(settings)
  }

  pub fn scraper_config(&self) -> ScraperConfig {
    ScraperConfig {
      base_url: self.wiktionary_url.clone(),
      timeout:  Duration::from_secs(self.request_timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let source: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    config::Environment::with_prefix("LEXIS").source(Some(source))
  }

  #[test]
  fn defaults_apply_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load_with_env(&dir.path().join("absent.toml"), env(&[])).unwrap();
    assert!(s.scrape);
    assert_eq!(s.wiktionary_url, DEFAULT_BASE_URL);
    assert_eq!(s.request_timeout_secs, 30);
    assert!(s.log_file.is_none());
    assert!(s.database.ends_with("lexis/lexis.db"));
  }

  #[test]
  fn file_then_environment_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
      &path,
      "database = \"/tmp/words.db\"\nscrape = false\nrequest_timeout_secs = 5\n",
    )
    .unwrap();

    let s = Settings::load_with_env(&path, env(&[("LEXIS_REQUEST_TIMEOUT_SECS", "9")]))
      .unwrap();
    assert_eq!(s.database, PathBuf::from("/tmp/words.db"));
    assert!(!s.scrape);
    assert_eq!(s.request_timeout_secs, 9);
    assert_eq!(s.scraper_config().timeout, Duration::from_secs(9));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
