use ratatui::text::{Line, Span};

use super::theme::DiffTheme;
use super::{DiffViewport, content_spans, header_row};
use crate::diff::{DiffLine, ParsedDiff};

const MIN_GUTTER: usize = 4;
/// Space between the two numbers plus the ` │ ` separator.
const GUTTER_CHROME: usize = 4;

pub fn gutter_width(diff: &ParsedDiff) -> usize {
    diff.max_line_number().to_string().len().max(MIN_GUTTER)
}

fn line_number(no: u32, width: usize) -> String {
    if no == 0 {
        " ".repeat(width)
    } else {
        format!("{no:>width$}")
    }
}

enum Row<'a> {
    Header(&'a str),
    Body(&'a DiffLine),
}

/// Unified view: each hunk header on its own row, then one row per body line
/// as `old new │ content`.
pub fn render_line_diff(
    diff: &ParsedDiff,
    viewport: DiffViewport,
    theme: &DiffTheme,
) -> Vec<Line<'static>> {
    let gutter = gutter_width(diff);
    let content_width = viewport.width.saturating_sub(2 * gutter + GUTTER_CHROME);

    let rows = diff.hunks.iter().flat_map(|hunk| {
        std::iter::once(Row::Header(hunk.header.as_str())).chain(hunk.lines.iter().map(Row::Body))
    });

    rows.skip(viewport.start_line)
        .take(viewport.max_lines)
        .map(|row| match row {
            Row::Header(header) => header_row(header, viewport.width, theme),
            Row::Body(line) => {
                let mut spans = vec![
                    Span::styled(
                        format!(
                            "{} {}",
                            line_number(line.old_line_no, gutter),
                            line_number(line.new_line_no, gutter)
                        ),
                        theme.gutter,
                    ),
                    Span::styled(" │ ", theme.separator),
                ];
                spans.extend(content_spans(line, content_width, viewport.horiz_offset, theme));
                Line::from(spans)
            }
        })
        .collect()
}
