// src/ui/widgets/findings.rs

use super::{kind_style, table::render_table};
use crate::core::models::Finding;
use ratatui::{buffer::Buffer, style::Style};

/// One row per finding: upper-cased kind, subject, detail. Rows are tinted by kind.
pub fn render_findings(title: &str, subject_label: &str, findings: &[Finding], width: u16) -> Buffer {
    let rows: Vec<Vec<String>> = findings
        .iter()
        .map(|f| {
            vec![
                f.kind.as_ref().to_ascii_uppercase(),
                f.subject.clone(),
                f.detail.clone(),
            ]
        })
        .collect();
    let styles: Vec<Style> = findings.iter().map(|f| kind_style(f.kind)).collect();

    render_table(title, &["Type", subject_label, "Detail"], &rows, &styles, width)
}
