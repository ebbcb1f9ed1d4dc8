//! TUI rendering: header, active pane, status bar.

pub mod picker;
pub mod search;
pub mod study;

use lexis_core::SetRepository;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<R: SetRepository>(f: &mut Frame, app: &App<R>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Picker => picker::draw(f, rows[1], app),
    Screen::Study => study::draw(f, rows[1], app),
    Screen::Search => search::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<R: SetRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
  let date = app.today().format("%Y-%m-%d").to_string();

  let title = match (&app.screen, &app.study) {
    (Screen::Study, Some(study)) => format!(
      " lexis  {} graded, {} of {} left",
      study.graded,
      study.session.flashcards_left(),
      study.total
    ),
    _ => format!(" lexis  {} sets, {} selected", app.sets.len(), app.selected.len()),
  };
  let left = Span::styled(
    title,
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  // Simple left-right header: pad the middle.
  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<R: SetRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
  let (mode_label, hints) = match &app.screen {
    Screen::Picker if app.filter_active => {
      ("FILTER", "Type to filter  Esc cancel  Enter done")
    }
    Screen::Picker => (
      "SETS",
      "↑↓/jk move  space toggle  a all  / filter  s search words  d delete  Enter study  q quit",
    ),
    Screen::Search if app.search_active => {
      ("WORDS", "Type a word or definition  Enter search  Esc back")
    }
    Screen::Search => ("WORDS", "s new search  Esc back"),
    Screen::Study => (
      "STUDY",
      "f front  b back  u usage  c charts  0-5 grade  Esc finish",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
