// src/ui/widgets/table.rs

use crate::ui::layout::{self, COLUMN_SPACING};
use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Block, Borders, Cell, Row, Table},
};

/// Renders a bordered table sized to its content. Cells wrap inside their column.
pub fn render_table(
    title: &str,
    header: &[&str],
    rows: &[Vec<String>],
    row_styles: &[Style],
    width: u16,
) -> Buffer {
    let widths = layout::column_widths(header, rows, width.saturating_sub(2));

    let mut content_rows = 1;
    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells: Vec<Vec<String>> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| layout::wrap(cell, usize::from(*w)))
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(1);
            content_rows += height;

            let style = row_styles.get(i).copied().unwrap_or_default();
            Row::new(cells.into_iter().map(|lines| {
                Cell::from(Text::from(lines.into_iter().map(Line::from).collect::<Vec<_>>()))
            }))
            .height(u16::try_from(height).unwrap_or(u16::MAX))
            .style(style)
        })
        .collect();

    let area = layout::panel_area(width, content_rows);
    let mut buf = Buffer::empty(area);

    let table = Table::new(table_rows, widths.iter().map(|w| Constraint::Length(*w)))
        .header(Row::new(header.iter().copied()).style(Style::default().bold()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.bold()),
        )
        .column_spacing(COLUMN_SPACING);
    Widget::render(table, area, &mut buf);
    buf
}

/// Two-column key/value panel.
pub fn render_pairs(
    title: &str,
    header: [&str; 2],
    pairs: &[(String, String)],
    width: u16,
) -> Buffer {
    let rows: Vec<Vec<String>> = pairs
        .iter()
        .map(|(k, v)| vec![k.clone(), v.clone()])
        .collect();
    render_table(title, &header, &rows, &[], width)
}
