// src/ui/widgets/remediation.rs

use crate::core::knowledge_base::FindingDetail;
use crate::ui::layout;
use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// "What it is / how to fix" notes, one block of lines per distinct subject.
pub fn render_remediation(entries: &[(String, &FindingDetail)], width: u16) -> Buffer {
    let inner = usize::from(width.saturating_sub(2));
    let mut lines: Vec<Line> = Vec::new();

    for (i, (subject, detail)) in entries.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(vec![
            Span::styled(subject.clone(), Style::default().fg(Color::Yellow).bold()),
            Span::styled(
                format!(" [{}] {}", detail.category, detail.title),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.extend(
            layout::wrap(detail.description, inner)
                .into_iter()
                .map(Line::from),
        );
        lines.extend(
            layout::wrap(&format!("Fix: {}", detail.remediation), inner)
                .into_iter()
                .map(|l| Line::from(l).fg(Color::Green)),
        );
    }

    let area = layout::panel_area(width, lines.len());
    let mut buf = Buffer::empty(area);
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Remediation".bold()))
        .render(area, &mut buf);
    buf
}
