//! The in-memory queue for one study sitting.
//!
//! Entries are classified once, at build time, into a [`Membership`]. The
//! two queues hold indices into a shared arena, so an entry that is both due
//! and flagged for review is a single object referenced from both queues and
//! is counted twice by [`SessionQueue::flashcards_left`].

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDate;
use rand::{Rng, seq::SliceRandom};

use crate::{
  entry::Entry,
  schedule::{self, Grade},
};

// ─── Membership ──────────────────────────────────────────────────────────────

/// Which queues an entry starts the sitting in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
  /// Long-term due date has arrived.
  Scheduled,
  /// Flagged for repetition within a sitting.
  Review,
  /// Due and flagged; queued twice.
  Both,
}

impl Membership {
  /// `None` when the entry is neither due nor flagged.
  pub fn classify(entry: &Entry, today: NaiveDate) -> Option<Self> {
    let due = entry.repetition.is_due(today);
    let review = entry.repetition.should_review;
    match (due, review) {
      (true, true) => Some(Self::Both),
      (true, false) => Some(Self::Scheduled),
      (false, true) => Some(Self::Review),
      (false, false) => None,
    }
  }

  pub fn is_scheduled(self) -> bool { matches!(self, Self::Scheduled | Self::Both) }

  pub fn is_review(self) -> bool { matches!(self, Self::Review | Self::Both) }
}

// ─── SessionQueue ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
  Scheduled,
  Review,
}

/// Orders the entries of one sitting and routes grades to the scheduling
/// engine.
#[derive(Debug, Clone)]
pub struct SessionQueue {
  entries:     Vec<Entry>,
  memberships: Vec<Membership>,
  scheduled:   VecDeque<usize>,
  review:      VecDeque<usize>,
  complete:    Vec<usize>,
}

impl SessionQueue {
  /// Build a sitting from `entries`, shuffling with the thread RNG.
  pub fn new(entries: Vec<Entry>, today: NaiveDate) -> Self {
    Self::with_rng(entries, today, &mut rand::thread_rng())
  }

  /// Build a sitting from `entries` using the given RNG for shuffling.
  pub fn with_rng<R: Rng + ?Sized>(
    entries: Vec<Entry>,
    today: NaiveDate,
    rng: &mut R,
  ) -> Self {
    let mut arena = Vec::with_capacity(entries.len());
    let mut memberships = Vec::with_capacity(entries.len());
    let mut scheduled = Vec::new();
    let mut review = Vec::new();

    for entry in entries {
      let Some(membership) = Membership::classify(&entry, today) else {
        continue;
      };
      let idx = arena.len();
      if membership.is_scheduled() {
        scheduled.push(idx);
      }
      if membership.is_review() {
        review.push(idx);
      }
      arena.push(entry);
      memberships.push(membership);
    }

    scheduled.shuffle(rng);
    review.shuffle(rng);

    tracing::debug!(
      scheduled = scheduled.len(),
      review = review.len(),
      "built study session"
    );

    Self {
      entries: arena,
      memberships,
      scheduled: scheduled.into(),
      review: review.into(),
      complete: Vec::new(),
    }
  }

  /// Cards still to show, counting an entry once per queue it sits in.
  pub fn flashcards_left(&self) -> usize { self.scheduled.len() + self.review.len() }

  pub fn is_finished(&self) -> bool { self.flashcards_left() == 0 }

  /// The card to show next and whether it comes from the review queue.
  /// Scheduled cards are shown before review cards.
  pub fn current(&self) -> Option<(&Entry, bool)> {
    self
      .front()
      .map(|(source, idx)| (&self.entries[idx], source == Source::Review))
  }

  /// Membership the entry for `word` was given when the sitting was built.
  pub fn membership(&self, word: &str) -> Option<Membership> {
    self
      .entries
      .iter()
      .position(|e| e.word == word)
      .map(|idx| self.memberships[idx])
  }

  /// Grade the current card and advance.
  ///
  /// Review-queue cards go through [`schedule::review`]; scheduled cards go
  /// through [`schedule::grade`]. Returns `false`, changing nothing, when the
  /// sitting is already finished.
  pub fn grade(&mut self, score: Grade, today: NaiveDate) -> bool {
    let Some((source, idx)) = self.front() else {
      return false;
    };
    let repetition = &mut self.entries[idx].repetition;
    match source {
      Source::Review => repetition.review(score),
      Source::Scheduled => repetition.grade(score, today),
    }
    self.post_grade();
    true
  }

  /// Pop the current card; requeue it for review if it is still flagged,
  /// otherwise retire it for this sitting.
  pub fn post_grade(&mut self) {
    let Some((source, _)) = self.front() else {
      return;
    };
    let popped = match source {
      Source::Scheduled => self.scheduled.pop_front(),
      Source::Review => self.review.pop_front(),
    };
    let Some(idx) = popped else {
      return;
    };
    if self.entries[idx].repetition.should_review {
      self.review.push_back(idx);
    } else {
      self.complete.push(idx);
    }
  }

  /// Look up an entry of this sitting by word.
  pub fn entry(&self, word: &str) -> Option<&Entry> {
    self.entries.iter().find(|e| e.word == word)
  }

  /// Review, then scheduled, then complete entries, each yielded once.
  ///
  /// Used to flush the sitting's final state to the store.
  pub fn all_entries(&self) -> Vec<&Entry> {
    let mut seen = HashSet::with_capacity(self.entries.len());
    self
      .review
      .iter()
      .chain(self.scheduled.iter())
      .chain(self.complete.iter())
      .filter(|idx| seen.insert(**idx))
      .map(|idx| &self.entries[*idx])
      .collect()
  }

  fn front(&self) -> Option<(Source, usize)> {
    self
      .scheduled
      .front()
      .map(|idx| (Source::Scheduled, *idx))
      .or_else(|| self.review.front().map(|idx| (Source::Review, *idx)))
  }
}
