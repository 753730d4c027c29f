// src/ui/widgets/mod.rs

pub mod banner;
pub mod findings;
pub mod remediation;
pub mod summary;
pub mod table;

use crate::core::models::{FindingKind, Severity};
use ratatui::style::{Color, Style, Stylize};

pub fn kind_style(kind: FindingKind) -> Style {
    match kind {
        FindingKind::Critical => Style::default().fg(Color::Red).bold(),
        FindingKind::Missing => Style::default().fg(Color::LightRed),
        FindingKind::Weak | FindingKind::Warn => Style::default().fg(Color::Yellow),
        FindingKind::Info => Style::default().fg(Color::Cyan),
    }
}

pub fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red).bold(),
        Severity::Warn => Style::default().fg(Color::Yellow).bold(),
        Severity::Medium => Style::default().fg(Color::LightRed),
        Severity::Low => Style::default().fg(Color::Yellow),
        Severity::Info => Style::default().fg(Color::Cyan),
    }
}
