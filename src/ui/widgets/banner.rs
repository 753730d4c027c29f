// src/ui/widgets/banner.rs

use crate::ui::layout;
use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

const NOTICE: &str = "Only scan systems you own or are explicitly authorized to test.";

/// The opening panel: tool name, protocol plan, target and the authorized-use notice.
pub fn render_banner(url: &str, protocol_note: &str, width: u16) -> Buffer {
    let inner = usize::from(width.saturating_sub(2));

    let mut lines = vec![Line::from(vec![
        "Security Scan".bold(),
        Span::raw(" "),
        Span::styled(protocol_note.to_string(), Style::default().fg(Color::DarkGray)),
    ])];
    lines.extend(
        layout::wrap(url, inner)
            .into_iter()
            .map(|l| Line::from(l).fg(Color::Cyan)),
    );
    lines.extend(
        layout::wrap(NOTICE, inner)
            .into_iter()
            .map(|l| Line::from(l).fg(Color::Yellow).italic()),
    );

    let area = layout::panel_area(width, lines.len());
    let mut buf = Buffer::empty(area);
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .render(area, &mut buf);
    buf
}
