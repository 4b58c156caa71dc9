//! Text rendering of decoded lines.

use core::fmt::Write as _;

use crate::line::{Line, ReportLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Spaces per nesting level.
    pub indent: usize,
}

/// Widest accepted indent; larger values are clamped.
pub const MAX_INDENT: usize = 32;

impl Default for RenderOptions {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

/// Renders lines with the default options.
pub fn render(lines: &[ReportLine]) -> String {
    render_with(lines, &RenderOptions::default())
}

pub fn render_with(lines: &[ReportLine], options: &RenderOptions) -> String {
    let mut out = String::new();
    for line in lines {
        let width = line.depth.saturating_mul(options.indent.min(MAX_INDENT));
        let _ = writeln!(out, "{:width$}{}", "", format_line(&line.line));
    }
    out
}

/// Formats one line without indentation.
pub fn format_line(line: &Line) -> String {
    match line {
        Line::Record { tag, length } => format!("{tag} ({length} bytes payload)"),
        Line::Word(word) => {
            let bytes = word.to_le_bytes();
            format!("{} {:>10} {}", hex::encode(bytes), word, quote_bytes(&bytes))
        }
        Line::Empty => "<empty>".to_owned(),
        Line::Text(text) => text.clone(),
        Line::Field { label, value } => format!("{label}: {value}"),
        Line::Hex(words) => words
            .iter()
            .map(|w| format!("{w:#x}"))
            .collect::<Vec<_>>()
            .join(" "),
        Line::ObjectRow(row) => row
            .iter()
            .rev()
            .map(|w| format!("{w:08x}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Quotes the bytes of a word: single quotes unless the bytes hold a `'` and
/// no `"`. Only the active quote is escaped.
fn quote_bytes(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(bytes.len() * 4 + 2);
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            _ if char::from(b) == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push(quote);
    out
}
