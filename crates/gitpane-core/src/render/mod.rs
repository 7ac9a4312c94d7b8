//! Styled rendering of parsed diffs into ratatui lines.

pub mod graph;
pub mod raw;
pub mod side_by_side;
pub mod theme;
pub mod unified;

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use serde::{Deserialize, Serialize};

use crate::diff::{DiffLine, FileDiffInfo, LineKind, ParsedDiff, WordSegment};
use crate::text::{
    apply_horizontal_offset, char_len, pad_right, sanitize_terminal_text, truncate_line,
};

pub use side_by_side::{SideBySidePair, group_lines_for_side_by_side, render_side_by_side};
pub use theme::DiffTheme;
pub use unified::render_line_diff;

pub const BINARY_MESSAGE: &str = " Binary file differs";
pub const EMPTY_MESSAGE: &str = " No diff content";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffViewMode {
    #[default]
    Unified,
    SideBySide,
}

impl DiffViewMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Unified => Self::SideBySide,
            Self::SideBySide => Self::Unified,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::SideBySide => "side-by-side",
        }
    }
}

/// The window of a diff to draw: total width in columns, the first row to
/// show, the row budget and how many chars to skip at the start of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffViewport {
    pub width: usize,
    pub start_line: usize,
    pub max_lines: usize,
    pub horiz_offset: usize,
}

impl DiffViewport {
    pub fn new(width: usize, start_line: usize, max_lines: usize) -> Self {
        Self {
            width,
            start_line,
            max_lines,
            horiz_offset: 0,
        }
    }

    pub fn with_offset(mut self, horiz_offset: usize) -> Self {
        self.horiz_offset = horiz_offset;
        self
    }
}

/// Render a parsed diff, falling back to the binary and empty messages.
pub fn render_diff(
    diff: &ParsedDiff,
    mode: DiffViewMode,
    viewport: DiffViewport,
    theme: &DiffTheme,
) -> Vec<Line<'static>> {
    if diff.binary {
        return message_line(BINARY_MESSAGE, viewport, theme);
    }
    if diff.hunks.is_empty() {
        return message_line(EMPTY_MESSAGE, viewport, theme);
    }
    match mode {
        DiffViewMode::Unified => render_line_diff(diff, viewport, theme),
        DiffViewMode::SideBySide => render_side_by_side(diff, viewport, theme),
    }
}

/// Rows `render_diff` can produce before windowing.
pub fn rendered_row_count(diff: &ParsedDiff, mode: DiffViewMode) -> usize {
    if diff.binary || diff.hunks.is_empty() {
        return 1;
    }
    match mode {
        DiffViewMode::Unified => diff.unified_row_count(),
        DiffViewMode::SideBySide => diff
            .hunks
            .iter()
            .map(|h| group_lines_for_side_by_side(&h.lines).len() + 1)
            .sum(),
    }
}

fn message_line(text: &str, viewport: DiffViewport, theme: &DiffTheme) -> Vec<Line<'static>> {
    if viewport.start_line > 0 || viewport.max_lines == 0 {
        return Vec::new();
    }
    vec![Line::from(Span::styled(text.to_string(), theme.muted))]
}

pub fn file_header_line(info: &FileDiffInfo, width: usize, theme: &DiffTheme) -> Line<'static> {
    let mut label = info.display_name();
    if info.is_new {
        label.push_str(" (new)");
    } else if info.is_deleted {
        label.push_str(" (deleted)");
    }
    if let (Some(old), Some(new)) = (&info.old_mode, &info.new_mode)
        && old != new
    {
        label.push_str(&format!(" (mode {old} → {new})"));
    }
    Line::from(Span::styled(truncate_line(&label, width), theme.file_header))
}

pub(crate) fn header_row(header: &str, width: usize, theme: &DiffTheme) -> Line<'static> {
    Line::from(Span::styled(truncate_line(header, width), theme.hunk_header))
}

/// Styled spans for a line's content inside a cell of `width` chars. Lines
/// that fit use their word-level segments; longer ones are cut with `...`.
/// Content is sanitized first so tabs keep their width on screen.
pub(crate) fn content_spans(
    line: &DiffLine,
    width: usize,
    horiz_offset: usize,
    theme: &DiffTheme,
) -> Vec<Span<'static>> {
    let base = theme.line(line.kind);
    let content = sanitize_terminal_text(&line.content);
    let visible = apply_horizontal_offset(&content, horiz_offset);
    if char_len(&visible) > width {
        return vec![Span::styled(truncate_line(&visible, width), base)];
    }

    let mut spans = Vec::new();
    if line.kind != LineKind::Context && line.word_diff.iter().any(|s| s.is_change) {
        let segments: Vec<WordSegment> = line
            .word_diff
            .iter()
            .map(|s| WordSegment::new(sanitize_terminal_text(&s.text), s.is_change))
            .collect();
        for segment in offset_segments(&segments, horiz_offset) {
            let style = if segment.is_change {
                theme.emphasis(line.kind)
            } else {
                base
            };
            spans.push(Span::styled(segment.text, style));
        }
    } else {
        spans.push(Span::styled(visible.clone(), base));
    }
    let used = char_len(&visible);
    if used < width && line.kind != LineKind::Context {
        spans.push(Span::styled(pad_right("", width - used), base));
    }
    spans
}

fn offset_segments(segments: &[WordSegment], offset: usize) -> Vec<WordSegment> {
    let mut remaining = offset;
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let len = char_len(&segment.text);
        if remaining >= len {
            remaining -= len;
            continue;
        }
        out.push(WordSegment::new(
            apply_horizontal_offset(&segment.text, remaining),
            segment.is_change,
        ));
        remaining = 0;
    }
    out
}

pub(crate) fn blank(width: usize, style: Style) -> Span<'static> {
    Span::styled(" ".repeat(width), style)
}

/// Flatten styled lines to text, one line per row.
pub fn plain_text(lines: &[Line<'_>]) -> String {
    let mut out = String::new();
    for line in lines {
        for span in &line.spans {
            out.push_str(&span.content);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_unified_diff;

    #[test]
    fn binary_and_empty_messages() {
        let theme = DiffTheme::default();
        let viewport = DiffViewport::new(80, 0, 10);

        let binary = parse_unified_diff("Binary files a/img and b/img differ\n").expect("parse");
        let lines = render_diff(&binary, DiffViewMode::Unified, viewport, &theme);
        assert_eq!(plain_text(&lines), " Binary file differs\n");

        let empty = parse_unified_diff("").expect("parse");
        let lines = render_diff(&empty, DiffViewMode::SideBySide, viewport, &theme);
        assert_eq!(plain_text(&lines), " No diff content\n");
    }

    #[test]
    fn word_segments_respect_offset() {
        let segments = vec![
            WordSegment::new("let ", false),
            WordSegment::new("x", true),
            WordSegment::new(" = 1;", false),
        ];
        let shifted = offset_segments(&segments, 5);
        assert_eq!(shifted, vec![WordSegment::new(" = 1;", false)]);
        let shifted = offset_segments(&segments, 2);
        assert_eq!(shifted[0].text, "t ");
        assert!(shifted[1].is_change);
    }

    #[test]
    fn tab_indentation_survives_both_views() {
        let diff = parse_unified_diff("@@ -1 +1 @@\n-\tfoo()\n+\tbar()\n").expect("parse");
        let theme = DiffTheme::default();
        let viewport = DiffViewport::new(40, 0, 10);

        let unified = plain_text(&render_diff(&diff, DiffViewMode::Unified, viewport, &theme));
        let rows: Vec<&str> = unified.lines().collect();
        assert!(rows[1].starts_with("   1      │     foo()"), "{:?}", rows[1]);
        assert!(rows[2].starts_with("        1 │     bar()"), "{:?}", rows[2]);

        let split = plain_text(&render_diff(&diff, DiffViewMode::SideBySide, viewport, &theme));
        assert!(!split.contains('\t'));
        assert!(split.contains("    foo()"));
        assert!(split.contains("    bar()"));
    }

    #[test]
    fn toggles_view_mode() {
        assert_eq!(DiffViewMode::Unified.toggle(), DiffViewMode::SideBySide);
        assert_eq!(DiffViewMode::SideBySide.toggle().label(), "unified");
    }
}
