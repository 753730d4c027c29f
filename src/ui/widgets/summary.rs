// src/ui/widgets/summary.rs

use super::severity_style;
use crate::app::ScanSummary;
use crate::core::models::Severity;
use crate::ui::layout;
use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Per-severity counts and the closing verdict.
pub fn render_summary(summary: &ScanSummary, width: u16) -> Buffer {
    let mut counts: Vec<Span> = Vec::new();
    for severity in [
        Severity::Critical,
        Severity::Warn,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        if !counts.is_empty() {
            counts.push(Span::raw("  "));
        }
        counts.push(Span::raw(format!("{}: ", severity)));
        counts.push(Span::styled(
            summary.count(severity).to_string(),
            severity_style(severity),
        ));
    }

    let verdict = if summary.actionable() == 0 {
        Line::from("Scan finished: no findings".bold().fg(Color::Green))
    } else {
        Line::from(
            format!("Scan finished with {} findings", summary.actionable())
                .bold()
                .fg(Color::Yellow),
        )
    };

    let mut lines = vec![Line::from(counts), verdict];
    if let Some(error) = &summary.error {
        let inner = usize::from(width.saturating_sub(2));
        lines.extend(
            layout::wrap(&format!("Error: {}", error), inner)
                .into_iter()
                .map(|l| Line::from(l).fg(Color::Red)),
        );
    }

    let area = layout::panel_area(width, lines.len());
    let mut buf = Buffer::empty(area);
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Summary".bold()))
        .render(area, &mut buf);
    buf
}
