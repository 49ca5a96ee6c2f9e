//! Hierarchy tree pane (left panel).

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState},
};
use redil_core::org::HierarchyLevel;

use crate::{app::App, render::marker};

fn level_color(level: HierarchyLevel) -> Color {
  match level {
    HierarchyLevel::Union => Color::Magenta,
    HierarchyLevel::Association => Color::Blue,
    HierarchyLevel::Zone => Color::Cyan,
    HierarchyLevel::District => Color::Green,
    HierarchyLevel::Church => Color::Yellow,
    HierarchyLevel::SmallGroup => Color::White,
  }
}

/// Render the visible tree rows into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = app.rows();
  let block = Block::default()
    .title(format!(" Hierarchy ({}) ", rows.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = rows
    .iter()
    .map(|row| {
      let mut name = Style::default().fg(level_color(row.level));
      if app.summary_for == Some(row.id) {
        name = name.add_modifier(Modifier::UNDERLINED);
      }
      ListItem::new(Line::from(vec![
        Span::raw("  ".repeat(row.depth)),
        Span::styled(marker(row), Style::default().fg(Color::DarkGray)),
        Span::styled(row.name.to_owned(), name),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select((!rows.is_empty()).then_some(app.cursor));

  f.render_stateful_widget(
    List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      ),
    area,
    &mut state,
  );
}
