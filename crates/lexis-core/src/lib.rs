//! Core types for the lexis vocabulary trainer: words and sets, the
//! spaced-repetition scheduler, the study-session queue and the
//! `SetRepository` trait.
//!
//! This crate is free of database, HTTP and terminal dependencies. All other
//! crates depend on it.

pub mod entry;
pub mod error;
pub mod language;
pub mod schedule;
pub mod session;
pub mod store;

use chrono::{Local, NaiveDate};

pub use entry::{Chart, Config, Entry, RepetitionState};
pub use error::{Error, Result};
pub use language::Language;
pub use schedule::Grade;
pub use session::{Membership, SessionQueue};
pub use store::{FlashcardSet, ScrapedCharts, SearchHit, SetId, SetRepository};

/// The local calendar date, against which due dates are compared.
pub fn today() -> NaiveDate { Local::now().date_naive() }
