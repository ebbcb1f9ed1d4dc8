//! Wiktionary scraping for lexis: concurrent article fetches and
//! inflection-chart extraction.
//!
//! Extraction is pure and lives in [`extract_charts`]; [`Scraper`] adds the
//! HTTP side on top of it.

mod client;
mod extract;
mod html;

pub mod error;

pub use client::{DEFAULT_BASE_URL, ScrapeReport, Scraper, ScraperConfig};
pub use error::{Error, Result};
pub use extract::extract_charts;
