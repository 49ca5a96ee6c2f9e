//! Summary pane (right panel): totals for the selected node and one line per
//! direct child.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use redil_core::stats::Totals;

use crate::app::App;

fn cells(label: String, t: &Totals) -> Vec<Cell<'static>> {
  vec![
    Cell::from(label),
    Cell::from(t.total_attendance.to_string()),
    Cell::from(t.total_studies.to_string()),
    Cell::from(t.total_guests.to_string()),
    Cell::from(t.total_baptisms.to_string()),
  ]
}

/// Render the summary pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let title = app.summary_name().unwrap_or("Summary");
  let block = Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(summary) = &app.summary else {
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new(Line::from("Select a node and press Enter."))
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let bold = Style::default().add_modifier(Modifier::BOLD);
  let mut rows = vec![Row::new(cells("Total".into(), &summary.totals)).style(bold)];
  rows.extend(
    summary
      .breakdown
      .iter()
      .map(|child| Row::new(cells(format!("  {}", child.name), &child.totals))),
  );

  let header = Row::new(["", "Attendance", "Studies", "Guests", "Baptisms"])
    .style(Style::default().fg(Color::DarkGray));
  let widths = [
    Constraint::Min(16),
    Constraint::Length(11),
    Constraint::Length(8),
    Constraint::Length(7),
    Constraint::Length(9),
  ];

  f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
