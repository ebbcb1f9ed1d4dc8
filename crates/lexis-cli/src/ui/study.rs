//! Study card pane.

use lexis_core::{Chart, Entry, Grade, SetRepository};
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Face};

/// Render the current card into `area`.
pub fn draw<R: SetRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
  let Some(study) = &app.study else {
    return;
  };

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(0), Constraint::Length(30)])
    .split(area);

  let Some((entry, is_review)) = study.session.current() else {
    let block = Block::default()
      .title(" Finished ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(
      Paragraph::new("All done! Press Esc to return.")
        .alignment(Alignment::Center)
        .block(block),
      area,
    );
    return;
  };

  let title = match (study.face, is_review) {
    (Face::Front, false) => " Front ",
    (Face::Front, true) => " Front (review) ",
    (Face::Back, _) => " Back ",
    (Face::Usage, _) => " Usage ",
    (Face::Charts, _) => " Charts ",
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(cols[0]);
  f.render_widget(block, cols[0]);

  match study.face {
    Face::Front => draw_text(f, inner, entry.show_definition()),
    Face::Back => draw_text(f, inner, entry.show_word()),
    Face::Usage => draw_text(f, inner, entry.usage.clone().unwrap_or_default()),
    Face::Charts => draw_charts(f, inner, entry),
  }

  draw_grades(f, cols[1]);
}

fn draw_text(f: &mut Frame, area: Rect, text: String) {
  let line = Line::from(Span::styled(
    text,
    Style::default().add_modifier(Modifier::BOLD),
  ));
  f.render_widget(
    Paragraph::new(line)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true }),
    area,
  );
}

/// Stack every chart of the entry, one table each.
fn draw_charts(f: &mut Frame, area: Rect, entry: &Entry) {
  let constraints: Vec<Constraint> = entry
    .charts
    .iter()
    .map(|c| Constraint::Length(chart_height(c)))
    .chain(std::iter::once(Constraint::Min(0)))
    .collect();
  let areas = Layout::default()
    .direction(Direction::Vertical)
    .constraints(constraints)
    .split(area);

  for (chart, area) in entry.charts.iter().zip(areas.iter()) {
    f.render_widget(chart_table(chart), *area);
  }
}

/// Rows plus one line of spacing, clamped to what a terminal can address.
fn chart_height(chart: &Chart) -> u16 {
  u16::try_from(chart.rows().len())
    .unwrap_or(u16::MAX)
    .saturating_add(1)
}

fn chart_table(chart: &Chart) -> Table<'_> {
  let width = chart.width().max(1);
  let rows = chart.rows().iter().map(|row| {
    let mut cells: Vec<Cell> = row.iter().map(|c| Cell::from(c.as_str())).collect();
    cells.resize(width, Cell::from(""));
    Row::new(cells)
  });
  Table::new(rows, vec![Constraint::Fill(1); width]).column_spacing(2)
}

fn draw_grades(f: &mut Frame, area: Rect) {
  let block = Block::default()
    .title(" Grade ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let lines: Vec<Line> = Grade::all()
    .map(|g| {
      let color = if g.is_pass() { Color::Green } else { Color::Red };
      Line::from(vec![
        Span::styled(format!("{} ", g.value()), Style::default().fg(color)),
        Span::raw(g.label()),
      ])
    })
    .collect();
  f.render_widget(Paragraph::new(lines).block(block), area);
}
