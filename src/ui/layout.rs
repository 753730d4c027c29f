// src/ui/layout.rs

use ratatui::layout::Rect;
use ratatui::text::Line;

pub const DEFAULT_WIDTH: u16 = 100;
const MIN_WIDTH: u16 = 48;
const MAX_WIDTH: u16 = 140;
const MIN_LAST_COLUMN: u16 = 16;
pub const COLUMN_SPACING: u16 = 1;

/// Width of the printed panels: the terminal's, clamped, or a fixed default
/// when stdout is not a terminal.
pub fn console_width() -> u16 {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols.clamp(MIN_WIDTH, MAX_WIDTH),
        _ => DEFAULT_WIDTH,
    }
}

/// Area of a bordered panel with `content_rows` lines inside.
pub fn panel_area(width: u16, content_rows: usize) -> Rect {
    let height = u16::try_from(content_rows)
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    Rect::new(0, 0, width, height)
}

/// Display width of `text` in terminal cells.
pub fn text_width(text: &str) -> usize {
    Line::raw(text).width()
}

/// Greedy word wrap. Words longer than `width` are split. Never returns an
/// empty vector.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while text_width(&word) > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current = word;
        } else if text_width(&current) + 1 + text_width(&word) <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Column widths for a table drawn inside `inner_width` cells.
///
/// Leading columns are sized to their widest cell (capped to a third of the
/// room); the last column takes whatever is left.
pub fn column_widths(header: &[&str], rows: &[Vec<String>], inner_width: u16) -> Vec<u16> {
    let columns = header.len();
    if columns == 0 {
        return Vec::new();
    }
    let spacing = COLUMN_SPACING * (columns as u16 - 1);
    let room = inner_width.saturating_sub(spacing);
    let cap = (room / 3).max(8);

    let mut widths: Vec<u16> = (0..columns - 1)
        .map(|i| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| text_width(cell))
                .chain(std::iter::once(text_width(header[i])))
                .max()
                .unwrap_or(0);
            u16::try_from(widest).unwrap_or(u16::MAX).min(cap)
        })
        .collect();

    let used: u16 = widths.iter().sum();
    widths.push(room.saturating_sub(used).max(MIN_LAST_COLUMN));
    widths
}
