use ratatui::text::{Line, Span};

use super::theme::DiffTheme;
use super::{DiffViewport, blank, content_spans, header_row};
use crate::diff::{DiffLine, LineKind, ParsedDiff};
use crate::text::pad_right;

const SEPARATOR: &str = " │ ";
const NUMBER_WIDTH: usize = 5;
/// Line number plus the two spaces after it.
const PANEL_GUTTER: usize = NUMBER_WIDTH + 2;

/// One visual row of the side-by-side view. Either side may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideBySidePair<'a> {
    pub left: Option<&'a DiffLine>,
    pub right: Option<&'a DiffLine>,
}

/// Pair hunk lines for two-column display. Context lines sit on both sides;
/// a run of removals followed by additions is zipped index-wise with the
/// shorter side padded by `None`.
pub fn group_lines_for_side_by_side(lines: &[DiffLine]) -> Vec<SideBySidePair<'_>> {
    let mut pairs = Vec::with_capacity(lines.len());
    let mut idx = 0;
    while idx < lines.len() {
        match lines[idx].kind {
            LineKind::Context => {
                pairs.push(SideBySidePair {
                    left: Some(&lines[idx]),
                    right: Some(&lines[idx]),
                });
                idx += 1;
            }
            LineKind::Add => {
                pairs.push(SideBySidePair {
                    left: None,
                    right: Some(&lines[idx]),
                });
                idx += 1;
            }
            LineKind::Remove => {
                let removes_start = idx;
                while idx < lines.len() && lines[idx].kind == LineKind::Remove {
                    idx += 1;
                }
                let adds_start = idx;
                while idx < lines.len() && lines[idx].kind == LineKind::Add {
                    idx += 1;
                }
                let removes = &lines[removes_start..adds_start];
                let adds = &lines[adds_start..idx];
                for offset in 0..removes.len().max(adds.len()) {
                    pairs.push(SideBySidePair {
                        left: removes.get(offset),
                        right: adds.get(offset),
                    });
                }
            }
        }
    }
    pairs
}

fn panel_cell(
    line: Option<&DiffLine>,
    number: impl Fn(&DiffLine) -> u32,
    panel_width: usize,
    horiz_offset: usize,
    theme: &DiffTheme,
) -> Vec<Span<'static>> {
    let Some(line) = line else {
        return vec![blank(panel_width, theme.muted)];
    };
    let content_width = panel_width.saturating_sub(PANEL_GUTTER);
    let mut spans = vec![Span::styled(
        format!("{:>NUMBER_WIDTH$}  ", number(line)),
        theme.gutter,
    )];
    let content = content_spans(line, content_width, horiz_offset, theme);
    let used: usize = content.iter().map(|s| s.width()).sum();
    spans.extend(content);
    if used < content_width {
        spans.push(Span::raw(pad_right("", content_width - used)));
    }
    spans
}

/// Two panels of `(width - 3) / 2` columns separated by ` │ `, old file on
/// the left. Hunk headers span the full width.
pub fn render_side_by_side(
    diff: &ParsedDiff,
    viewport: DiffViewport,
    theme: &DiffTheme,
) -> Vec<Line<'static>> {
    let panel_width = viewport.width.saturating_sub(3) / 2;

    let mut out = Vec::new();
    let mut row = 0usize;
    let window = viewport.start_line..viewport.start_line.saturating_add(viewport.max_lines);
    'hunks: for hunk in &diff.hunks {
        if row >= window.end {
            break;
        }
        if window.contains(&row) {
            out.push(header_row(&hunk.header, viewport.width, theme));
        }
        row += 1;

        for pair in group_lines_for_side_by_side(&hunk.lines) {
            if row >= window.end {
                break 'hunks;
            }
            if window.contains(&row) {
                let mut spans =
                    panel_cell(pair.left, |l| l.old_line_no, panel_width, viewport.horiz_offset, theme);
                spans.push(Span::styled(SEPARATOR, theme.separator));
                spans.extend(panel_cell(
                    pair.right,
                    |l| l.new_line_no,
                    panel_width,
                    viewport.horiz_offset,
                    theme,
                ));
                out.push(Line::from(spans));
            }
            row += 1;
        }
    }
    out
}
