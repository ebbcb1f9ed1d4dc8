//! `lexis`: a spaced-repetition vocabulary trainer.
//!
//! # Usage
//!
//! ```text
//! lexis import verbs.toml nouns.toml
//! lexis list --json
//! lexis search house
//! lexis export verbs ~/backup/
//! lexis study verbs
//! lexis reset --yes
//! lexis
//! ```

mod app;
mod commands;
mod settings;
mod ui;

use std::{
  fs::File,
  io,
  path::PathBuf,
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lexis_scrape::Scraper;
use lexis_store_sqlite::SqliteStore;
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::{DEFAULT_CONFIG_PATH, Settings, expand_tilde};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lexis", about = "Spaced-repetition vocabulary trainer")]
struct Cli {
  /// Path to the TOML settings file.
  #[arg(short, long, env = "LEXIS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
  config: PathBuf,

  /// SQLite database file; overrides the settings file.
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List imported sets.
  List {
    /// Print every set as JSON instead of bare names.
    #[arg(long)]
    json: bool,
  },
  /// Import (or re-import) set files.
  Import {
    #[arg(required = true, value_name = "FILE")]
    files:     Vec<PathBuf>,
    /// Skip fetching inflection charts.
    #[arg(long)]
    no_scrape: bool,
  },
  /// Delete a set by name.
  Delete { name: String },
  /// Study the named sets, or pick interactively when none are given.
  Study { names: Vec<String> },
  /// Find words whose text or definition contains QUERY.
  Search {
    query: String,
    /// Print matches as JSON.
    #[arg(long)]
    json:  bool,
  },
  /// Write a set back out as a word file.
  Export {
    name: String,
    /// Destination file, or a directory to write `<name>.toml` into.
    #[arg(value_name = "PATH")]
    dest: PathBuf,
  },
  /// Delete every set and all study progress.
  Reset {
    /// Confirm the reset.
    #[arg(long)]
    yes: bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(db) = &cli.database {
    settings.database = expand_tilde(db);
  }
  init_tracing(&settings)?;

  if let Some(parent) = settings.database.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  let store = SqliteStore::open(&settings.database)
    .await
    .with_context(|| format!("opening {}", settings.database.display()))?;
  tracing::debug!(path = %settings.database.display(), "store opened");

  run_command(store, cli.command, &settings, lexis_core::today()).await
}

/// Run one subcommand, then close the store whether or not it succeeded.
async fn run_command(
  store: SqliteStore,
  command: Option<Command>,
  settings: &Settings,
  today: NaiveDate,
) -> Result<()> {
  let mut stdout = io::stdout();
  let result = match command {
    Some(Command::List { json }) => commands::list(&store, json, &mut stdout).await,
    Some(Command::Import { files, no_scrape }) => {
      let scraper = if settings.scrape && !no_scrape {
        Scraper::new(settings.scraper_config()).map(Some)
      } else {
        Ok(None)
      };
      match scraper {
        Ok(scraper) => {
          commands::import(&store, scraper.as_ref(), &files, today, &mut stdout).await
        }
        Err(err) => Err(anyhow::Error::new(err).context("building scraper")),
      }
    }
    Some(Command::Delete { name }) => commands::delete(&store, &name, &mut stdout).await,
    Some(Command::Search { query, json }) => {
      commands::search(&store, &query, json, &mut stdout).await
    }
    Some(Command::Export { name, dest }) => {
      commands::export(&store, &name, &expand_tilde(&dest), &mut stdout).await
    }
    Some(Command::Reset { yes }) => commands::reset(&store, yes, &mut stdout).await,
    Some(Command::Study { names }) => run_tui(App::new(store.clone(), today), names).await,
    None => run_tui(App::new(store.clone(), today), Vec::new()).await,
  };

  let closed = store.close().await.context("closing store");
  result.and(closed)
}

/// Log to the configured file, or stderr. `RUST_LOG` overrides the level.
fn init_tracing(settings: &Settings) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::WARN.into())
    .from_env_lossy();

  match &settings.log_file {
    Some(path) => {
      let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
  }
  Ok(())
}

// ─── Terminal UI ──────────────────────────────────────────────────────────────

fn restore_terminal() {
  disable_raw_mode().ok();
  execute!(io::stdout(), LeaveAlternateScreen).ok();
}

async fn run_tui(mut app: App<SqliteStore>, names: Vec<String>) -> Result<()> {
  // Leave the alternate screen before a panic message is printed.
  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    restore_terminal();
    default_hook(info);
  }));

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Load initial data, then run; restore the terminal even on error.
  let mut run_result = app.load_sets().await;
  if run_result.is_ok() && !names.is_empty() {
    run_result = app.start_study(names).await;
  }
  if run_result.is_ok() {
    run_result = run_event_loop(&mut terminal, &mut app).await;
  }
  let shutdown_result = app.shutdown().await;

  restore_terminal();
  terminal.show_cursor().ok();

  run_result.and(shutdown_result)
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<SqliteStore>,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
