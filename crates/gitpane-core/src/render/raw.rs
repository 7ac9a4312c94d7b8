use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::DiffViewport;
use super::theme::DiffTheme;
use crate::text::{apply_horizontal_offset, sanitize_terminal_text, truncate_line};

fn prefix_style(line: &str, theme: &DiffTheme) -> Style {
    if line.starts_with("+++ ") || line.starts_with("--- ") {
        theme.file_header
    } else if line.starts_with('+') {
        theme.add
    } else if line.starts_with('-') {
        theme.remove
    } else if line.starts_with("@@") {
        theme.hunk_header
    } else if line.starts_with("diff --git") || line.starts_with("index ") {
        theme.file_header
    } else {
        theme.context
    }
}

/// Diff text coloured by line prefix only. Used when the text does not parse.
pub fn render_raw_diff(text: &str, viewport: DiffViewport, theme: &DiffTheme) -> Vec<Line<'static>> {
    text.lines()
        .skip(viewport.start_line)
        .take(viewport.max_lines)
        .map(|raw| {
            let cleaned = sanitize_terminal_text(raw);
            let style = prefix_style(&cleaned, theme);
            let visible = apply_horizontal_offset(&cleaned, viewport.horiz_offset);
            Line::from(Span::styled(truncate_line(&visible, viewport.width), style))
        })
        .collect()
}
