use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use super::{GitView, Notice, ViewMode};
use crate::history::{commit_summary, relative_time};
use crate::models::{CommitFile, StatusEntry};
use crate::render::graph::graph_spans;
use crate::render::raw::render_raw_diff;
use crate::render::{DiffViewport, render_diff};
use crate::text::{char_len, pad_right, sanitize_terminal_text};

const STATUS_HELP: &str = " j/k move  d diff  s stage  u unstage  h history  r refresh  q quit";
const HISTORY_HELP: &str = " j/k move  enter details  esc back";
const DETAIL_HELP: &str = " j/k move  enter diff  esc back";
const DIFF_HELP: &str = " j/k scroll  g/G top/bottom  v view  </> shift  esc back";
const DETAIL_HEADER_ROWS: usize = 10;

fn title_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Cut a row of spans to `width` chars.
fn clip(spans: Vec<Span<'static>>, width: usize) -> Line<'static> {
    let mut remaining = width;
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        if remaining == 0 {
            break;
        }
        let len = char_len(&span.content);
        if len <= remaining {
            remaining -= len;
            out.push(span);
        } else {
            let cut: String = span.content.chars().take(remaining).collect();
            out.push(Span::styled(cut, span.style));
            remaining = 0;
        }
    }
    Line::from(out)
}

/// Pad a clipped row to the full width and draw it reversed.
fn selected(mut line: Line<'static>, width: usize) -> Line<'static> {
    let used = line.width();
    if used < width {
        line.spans.push(Span::raw(pad_right("", width - used)));
    }
    line.patch_style(Style::default().add_modifier(Modifier::REVERSED))
}

fn text_row(text: impl Into<String>, style: Style, width: usize) -> Line<'static> {
    clip(vec![Span::styled(text.into(), style)], width)
}

fn counts(additions: Option<u32>, deletions: Option<u32>) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if let Some(added) = additions {
        spans.push(Span::styled(format!("  +{added}"), Style::default().fg(Color::Green)));
    }
    if let Some(deleted) = deletions {
        spans.push(Span::styled(format!(" -{deleted}"), Style::default().fg(Color::Red)));
    }
    spans
}

fn status_code_style(entry: &StatusEntry) -> Style {
    if entry.is_conflicted() {
        Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
    } else if entry.is_untracked() {
        muted()
    } else if entry.has_working_changes() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    }
}

fn path_label(path: &str, old_path: Option<&str>) -> String {
    match old_path {
        Some(old) if !old.is_empty() => format!(
            "{} → {}",
            sanitize_terminal_text(old),
            sanitize_terminal_text(path)
        ),
        _ => sanitize_terminal_text(path),
    }
}

fn commit_file_row(file: &CommitFile) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(file.status.code().to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::raw(path_label(&file.path, Some(file.old_path.as_str()))),
    ];
    if file.binary {
        spans.push(Span::styled("  bin", muted()));
    } else {
        spans.extend(counts(Some(file.additions), Some(file.deletions)));
    }
    spans
}

impl GitView {
    /// Draw the current mode as exactly `height` rows.
    pub fn view(&self) -> Text<'static> {
        let visible = self.visible_rows(self.mode);
        let (header, body, footer) = match self.mode {
            ViewMode::Status => self.draw_status(visible),
            ViewMode::History => self.draw_history(visible),
            ViewMode::CommitDetail => self.draw_detail(visible),
            ViewMode::Diff => self.draw_diff(visible),
        };

        let mut lines = header;
        let body_len = body.len().min(visible);
        lines.extend(body.into_iter().take(visible));
        lines.extend((body_len..visible).map(|_| Line::default()));
        lines.extend(footer);
        lines.truncate(self.height);
        Text::from(lines)
    }

    fn notice_line(&self) -> Line<'static> {
        match &self.notice {
            Some(Notice::Error(text)) => text_row(
                format!(" {text}"),
                Style::default().fg(Color::LightRed),
                self.width,
            ),
            Some(Notice::Info(text)) => {
                text_row(format!(" {text}"), Style::default().fg(Color::Yellow), self.width)
            }
            None => Line::default(),
        }
    }

    fn footer(&self, help: &str) -> Vec<Line<'static>> {
        vec![self.notice_line(), text_row(help, muted(), self.width)]
    }

    fn separator(&self) -> Line<'static> {
        text_row("─".repeat(self.width), muted(), self.width)
    }

    fn draw_status(&self, visible: usize) -> (Vec<Line<'static>>, Vec<Line<'static>>, Vec<Line<'static>>) {
        let title = if !self.status_loaded {
            " Loading status…".to_string()
        } else {
            let branch = self
                .snapshot
                .branch
                .as_deref()
                .map_or_else(|| "detached HEAD".to_string(), |b| format!("On branch {b}"));
            let changed = self.snapshot.entries.len();
            format!(" {branch} · {changed} changed")
        };
        let header = vec![text_row(title, title_style(), self.width), self.separator()];

        let body = if self.status_loaded && self.snapshot.entries.is_empty() {
            vec![text_row(" Working tree clean", muted(), self.width)]
        } else {
            self.snapshot
                .entries
                .iter()
                .enumerate()
                .skip(self.status_scroll)
                .take(visible)
                .map(|(idx, entry)| {
                    let mut spans = vec![
                        Span::raw(" "),
                        Span::styled(entry.short_code(), status_code_style(entry)),
                        Span::raw(" "),
                        Span::raw(path_label(&entry.path, entry.old_path.as_deref())),
                    ];
                    spans.extend(counts(entry.additions, entry.deletions));
                    let line = clip(spans, self.width);
                    if idx == self.status_cursor {
                        selected(line, self.width)
                    } else {
                        line
                    }
                })
                .collect()
        };
        (header, body, self.footer(STATUS_HELP))
    }

    fn draw_history(&self, visible: usize) -> (Vec<Line<'static>>, Vec<Line<'static>>, Vec<Line<'static>>) {
        let title = if self.history_loading {
            " Loading history…".to_string()
        } else {
            format!(" History · {} commits", self.commits.len())
        };
        let header = vec![text_row(title, title_style(), self.width)];

        let graph_width = self.history_rows.iter().map(|r| r.graph.width).max().unwrap_or(0);
        let body = self
            .history_rows
            .iter()
            .skip(self.history_scroll)
            .take(visible)
            .map(|row| {
                let mut spans = graph_spans(&row.graph);
                if row.graph.width < graph_width {
                    spans.push(Span::raw(pad_right("", graph_width - row.graph.width)));
                }
                let Some(idx) = row.commit else {
                    return clip(spans, self.width);
                };
                let commit = &self.commits[idx];
                spans.push(Span::raw(" "));
                spans.push(Span::styled(commit.short_hash.clone(), Style::default().fg(Color::Yellow)));
                spans.push(Span::raw(" "));
                spans.push(Span::raw(sanitize_terminal_text(&commit.subject)));
                spans.push(Span::styled(
                    format!("  {}", sanitize_terminal_text(&commit.author)),
                    Style::default().fg(Color::Cyan),
                ));
                spans.push(Span::styled(format!(" {}", relative_time(commit.date)), muted()));
                let line = clip(spans, self.width);
                if idx == self.history_cursor {
                    selected(line, self.width)
                } else {
                    line
                }
            })
            .collect();
        (header, body, self.footer(HISTORY_HELP))
    }

    fn draw_detail(&self, visible: usize) -> (Vec<Line<'static>>, Vec<Line<'static>>, Vec<Line<'static>>) {
        let mut header = Vec::with_capacity(DETAIL_HEADER_ROWS);
        let Some(commit) = &self.detail else {
            let short: String = self
                .detail_hash
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(7)
                .collect();
            header.push(text_row(format!(" Loading commit {short}…"), title_style(), self.width));
            header.resize(DETAIL_HEADER_ROWS, Line::default());
            return (header, Vec::new(), self.footer(DETAIL_HELP));
        };

        let parents = if commit.parent_hashes.is_empty() {
            "(root)".to_string()
        } else {
            commit
                .parent_hashes
                .iter()
                .map(|p| p.chars().take(7).collect::<String>())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let merge = if commit.is_merge { " (merge)" } else { "" };
        header.push(text_row(
            format!(" commit {}", commit.hash),
            Style::default().fg(Color::Yellow),
            self.width,
        ));
        header.push(text_row(
            format!(
                " Author:  {} <{}>",
                sanitize_terminal_text(&commit.author),
                sanitize_terminal_text(&commit.author_email)
            ),
            Style::default(),
            self.width,
        ));
        header.push(text_row(
            format!(
                " Date:    {} ({})",
                commit.date.format("%Y-%m-%d %H:%M:%S UTC"),
                relative_time(commit.date)
            ),
            Style::default(),
            self.width,
        ));
        header.push(text_row(format!(" Parents: {parents}{merge}"), muted(), self.width));
        header.push(Line::default());
        header.push(text_row(
            format!(" {}", sanitize_terminal_text(&commit.subject)),
            title_style(),
            self.width,
        ));
        let mut body_lines = commit.body.lines().filter(|l| !l.trim().is_empty());
        for _ in 0..2 {
            let row = body_lines
                .next()
                .map(|l| text_row(format!("   {}", sanitize_terminal_text(l)), muted(), self.width))
                .unwrap_or_default();
            header.push(row);
        }
        header.push(text_row(format!(" {}", commit_summary(commit)), Style::default(), self.width));
        header.push(self.separator());

        let body = commit
            .files
            .iter()
            .enumerate()
            .skip(self.detail_scroll)
            .take(visible)
            .map(|(idx, file)| {
                let line = clip(commit_file_row(file), self.width);
                if idx == self.detail_cursor {
                    selected(line, self.width)
                } else {
                    line
                }
            })
            .collect();
        (header, body, self.footer(DETAIL_HELP))
    }

    fn draw_diff(&self, visible: usize) -> (Vec<Line<'static>>, Vec<Line<'static>>, Vec<Line<'static>>) {
        let Some(state) = &self.diff else {
            return (vec![Line::default()], Vec::new(), vec![Line::default()]);
        };
        let mut title = format!(" {} ({})", sanitize_terminal_text(&state.target.title()), self.diff_view.label());
        if self.horiz_offset > 0 {
            title.push_str(&format!(" →{}", self.horiz_offset));
        }
        let header = vec![text_row(title, title_style(), self.width)];

        let viewport = DiffViewport::new(self.width, self.diff_scroll, visible).with_offset(self.horiz_offset);
        let body = match (&state.external, &state.parsed, &state.raw) {
            (_, _, None) => vec![text_row(" Loading diff…", muted(), self.width)],
            (Some(lines), _, _) => lines
                .iter()
                .skip(self.diff_scroll)
                .take(visible)
                .map(|line| clip(line.spans.clone(), self.width))
                .collect(),
            (None, Some(Ok(parsed)), _) => render_diff(parsed, self.diff_view, viewport, &self.theme),
            (None, _, Some(raw)) => render_raw_diff(raw, viewport, &self.theme),
        };

        let footer = if self.notice.is_some() {
            self.notice_line()
        } else {
            text_row(DIFF_HELP, muted(), self.width)
        };
        (header, body, vec![footer])
    }
}
