//! Set picker pane.

use lexis_core::SetRepository;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

/// Render the set list into `area`.
pub fn draw<R: SetRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
  let filtered = app.filtered_sets();
  let total = app.sets.len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Sets ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Sets ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|set| {
      let tick = if app.selected.contains(&set.name) { "[x] " } else { "[ ] " };
      let lang = set
        .language
        .map(|l| format!("{l}  "))
        .unwrap_or_else(|| "--  ".to_owned());
      ListItem::new(Line::from(vec![
        Span::styled(tick, Style::default().fg(Color::Green)),
        Span::styled(lang, Style::default().fg(Color::Cyan)),
        Span::raw(set.name.clone()),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if total == 0 {
    f.render_widget(
      Paragraph::new("No sets yet. Import one with `lexis import FILE`.")
        .style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  // If filter is active or set, show a filter bar at the bottom of the inner area.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  // Scrollable list with cursor tracking.
  let mut state = ListState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.list_cursor)
  });

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
