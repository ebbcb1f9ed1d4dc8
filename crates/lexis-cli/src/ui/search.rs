//! Word search pane.

use lexis_core::SetRepository;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::app::App;

/// Render the query line and the matching words into `area`.
pub fn draw<R: SetRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(3), Constraint::Min(0)])
    .split(area);

  let query = if app.search_active {
    format!("{}_", app.search_query)
  } else {
    app.search_query.clone()
  };
  f.render_widget(
    Paragraph::new(query)
      .style(Style::default().fg(Color::Yellow))
      .block(
        Block::default()
          .title(" Search ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::DarkGray)),
      ),
    rows[0],
  );

  let block = Block::default()
    .title(format!(" Words ({}) ", app.search_hits.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = app
    .search_hits
    .iter()
    .map(|hit| {
      let mut spans = vec![
        Span::styled(hit.word.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}", hit.definition)),
      ];
      if let Some(usage) = &hit.usage {
        spans.push(Span::styled(
          format!("  ({usage})"),
          Style::default().fg(Color::Gray),
        ));
      }
      spans.push(Span::styled(
        format!("  [{}]", hit.set),
        Style::default().fg(Color::Cyan),
      ));
      ListItem::new(Line::from(spans))
    })
    .collect();

  f.render_widget(List::new(items).block(block), rows[1]);
}
