// src/ui/mod.rs

use crate::app::ScanSummary;
use crate::core::knowledge_base::FindingDetail;
use crate::core::models::Finding;
use crossterm::style::{Attribute, ContentStyle, Stylize};
use ratatui::buffer::Buffer;
use ratatui::style::{Color, Modifier};
use std::io::{self, Stdout, Write};

pub mod layout;
pub mod widgets;

/// Flavour of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
    Info,
}

/// Progressive, human-readable scan output.
///
/// Each panel is a ratatui widget rendered into an offscreen [`Buffer`] of the
/// console width and printed line by line, so the output scrolls like a
/// regular CLI and can be piped or captured.
pub struct Console<W: Write> {
    out: W,
    color: bool,
    width: u16,
}

impl Console<Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color, layout::console_width())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool, width: u16) -> Self {
        Self { out, color, width }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, url: &str, protocol_note: &str) -> io::Result<()> {
        let buf = widgets::banner::render_banner(url, protocol_note, self.width);
        self.emit(&buf)
    }

    pub fn findings(&mut self, title: &str, subject_label: &str, findings: &[Finding]) -> io::Result<()> {
        let buf = widgets::findings::render_findings(title, subject_label, findings, self.width);
        self.emit(&buf)
    }

    pub fn pairs(&mut self, title: &str, header: [&str; 2], pairs: &[(String, String)]) -> io::Result<()> {
        let buf = widgets::table::render_pairs(title, header, pairs, self.width);
        self.emit(&buf)
    }

    pub fn remediation(&mut self, entries: &[(String, &FindingDetail)]) -> io::Result<()> {
        let buf = widgets::remediation::render_remediation(entries, self.width);
        self.emit(&buf)
    }

    pub fn summary(&mut self, summary: &ScanSummary) -> io::Result<()> {
        let buf = widgets::summary::render_summary(summary, self.width);
        self.emit(&buf)
    }

    pub fn status(&mut self, tone: Tone, message: &str) -> io::Result<()> {
        let (icon, style) = match tone {
            Tone::Success => ("✓", ContentStyle::new().green()),
            Tone::Warning => ("!", ContentStyle::new().yellow()),
            Tone::Error => ("✗", ContentStyle::new().red()),
            Tone::Info => (">", ContentStyle::new().cyan()),
        };
        let text = format!("{} {}", icon, message);
        if self.color {
            writeln!(self.out, "{}", style.apply(text))?;
        } else {
            writeln!(self.out, "{}", text)?;
        }
        self.out.flush()
    }

    /// Prints every row of `buf`, trailing blanks trimmed, styles grouped into runs.
    fn emit(&mut self, buf: &Buffer) -> io::Result<()> {
        let area = buf.area;
        for y in area.top()..area.bottom() {
            let last = (area.left()..area.right())
                .rev()
                .find(|&x| !buf[(x, y)].symbol().trim().is_empty());
            let Some(last) = last else {
                writeln!(self.out)?;
                continue;
            };

            let mut run = String::new();
            let mut run_key = (Color::Reset, Modifier::empty());
            for x in area.left()..=last {
                let cell = &buf[(x, y)];
                if cell.skip {
                    continue;
                }
                let key = (cell.fg, cell.modifier);
                if key != run_key && !run.is_empty() {
                    self.write_run(&run, run_key)?;
                    run.clear();
                }
                run_key = key;
                run.push_str(cell.symbol());
            }
            self.write_run(&run, run_key)?;
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn write_run(&mut self, text: &str, (fg, modifier): (Color, Modifier)) -> io::Result<()> {
        if !self.color || (fg == Color::Reset && modifier.is_empty()) {
            return write!(self.out, "{}", text);
        }
        let mut style = ContentStyle::new();
        style.foreground_color = crossterm_color(fg);
        for (flag, attribute) in [
            (Modifier::BOLD, Attribute::Bold),
            (Modifier::DIM, Attribute::Dim),
            (Modifier::ITALIC, Attribute::Italic),
            (Modifier::UNDERLINED, Attribute::Underlined),
        ] {
            if modifier.contains(flag) {
                style.attributes.set(attribute);
            }
        }
        write!(self.out, "{}", style.apply(text))
    }
}

fn crossterm_color(color: Color) -> Option<crossterm::style::Color> {
    use crossterm::style::Color as C;
    Some(match color {
        Color::Reset => return None,
        Color::Black => C::Black,
        Color::Red => C::DarkRed,
        Color::Green => C::DarkGreen,
        Color::Yellow => C::DarkYellow,
        Color::Blue => C::DarkBlue,
        Color::Magenta => C::DarkMagenta,
        Color::Cyan => C::DarkCyan,
        Color::Gray => C::Grey,
        Color::DarkGray => C::DarkGrey,
        Color::LightRed => C::Red,
        Color::LightGreen => C::Green,
        Color::LightYellow => C::Yellow,
        Color::LightBlue => C::Blue,
        Color::LightMagenta => C::Magenta,
        Color::LightCyan => C::Cyan,
        Color::White => C::White,
        Color::Rgb(r, g, b) => C::Rgb { r, g, b },
        Color::Indexed(i) => C::AnsiValue(i),
    })
}
