//! The scheduling engine: SM-2 style intervals plus a same-sitting repeat
//! flag.
//!
//! Grades run from 0 to 5:
//! - 0–2: recall failed; the word restarts and repeats this sitting.
//! - 3: recalled with difficulty; long-term success, but repeat this sitting.
//! - 4–5: recalled.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, entry::RepetitionState};

pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Lowest grade that counts as a successful recall.
const PASS: u8 = 3;

/// Lowest grade that clears the same-sitting repeat flag.
const CLEAR_REVIEW: u8 = 4;

// ─── Grade ───────────────────────────────────────────────────────────────────

/// A recall score in `0..=5`. Out-of-range scores are rejected on
/// construction, so every `Grade` is valid input to the engine.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
  pub const MAX: u8 = 5;

  pub fn new(score: u8) -> Result<Self> {
    if score > Self::MAX {
      return Err(Error::InvalidGrade(score));
    }
    Ok(Self(score))
  }

  pub fn value(self) -> u8 { self.0 }

  pub fn is_pass(self) -> bool { self.0 >= PASS }

  /// Button text for this grade.
  pub fn label(self) -> &'static str {
    match self.0 {
      0 => "No recall",
      1 => "Wrong, familiar",
      2 => "Wrong, easy to remember",
      3 => "Correct, hard",
      4 => "Correct, medium",
      _ => "Correct, easy",
    }
  }

  pub fn all() -> impl Iterator<Item = Grade> { (0..=Self::MAX).map(Grade) }
}

impl TryFrom<u8> for Grade {
  type Error = Error;

  fn try_from(score: u8) -> Result<Self> { Self::new(score) }
}

impl From<Grade> for u8 {
  fn from(grade: Grade) -> Self { grade.0 }
}

impl fmt::Display for Grade {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Long-term grading: compute the next interval and due date from `grade`.
pub fn grade(
  state: &RepetitionState,
  grade: Grade,
  today: NaiveDate,
) -> RepetitionState {
  let mut next = state.clone();
  let score = grade.value();

  if grade.is_pass() {
    next.in_n_days = match state.num_correct {
      0 => 1,
      1 => 6,
      _ => (f64::from(state.in_n_days) * state.easiness_factor).floor() as u32,
    };
    next.num_correct = state.num_correct.saturating_add(1);
    if score < CLEAR_REVIEW {
      next.should_review = true;
    }
  } else {
    next.num_correct = 0;
    next.in_n_days = 1;
    next.should_review = true;
  }
  next.date_of_next = add_days(today, next.in_n_days);

  let miss = f64::from(Grade::MAX - score);
  next.easiness_factor = (state.easiness_factor
    + (0.1 - miss * (0.08 + miss * 0.02)))
    .max(MIN_EASINESS_FACTOR);

  next
}

/// Same-sitting grading: clear the repeat flag on a good recall, otherwise
/// leave the word circulating. Never touches the long-term schedule.
pub fn review(state: &RepetitionState, grade: Grade) -> RepetitionState {
  let mut next = state.clone();
  if grade.value() >= CLEAR_REVIEW {
    next.should_review = false;
  }
  next
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
  date
    .checked_add_days(Days::new(u64::from(days)))
    .unwrap_or(NaiveDate::MAX)
}

impl RepetitionState {
  /// In-place form of [`grade`].
  pub fn grade(&mut self, score: Grade, today: NaiveDate) {
    *self = grade(self, score, today);
  }

  /// In-place form of [`review`].
  pub fn review(&mut self, score: Grade) { *self = review(self, score); }
}
