//! The four-mode git view: status, history, commit detail and diff.
//!
//! `GitView` is a plain state machine. Keys and load results arrive as
//! [`Msg`]s, and anything that needs git or an external process leaves as a
//! [`Command`] for the host to run. Results that no longer match what is on
//! screen are dropped when they arrive.

mod command;
mod draw;

use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};
use ratatui::text::Line;

pub use command::{Command, execute};

use crate::diff::{ParsedDiff, parse_unified_diff};
use crate::error::ParseError;
use crate::external::{DELTA_TIP, ExternalRenderer, ansi_to_lines};
use crate::graph::compute_graph;
use crate::models::{Commit, GraphLine, StatusEntry, StatusSnapshot};
use crate::render::{DiffTheme, DiffViewMode, rendered_row_count};
use crate::text::{ensure_cursor_visible, step_cursor};

const HORIZONTAL_STEP: usize = 10;
const DEFAULT_WIDTH: usize = 80;
const DEFAULT_HEIGHT: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Status,
    History,
    CommitDetail,
    Diff,
}

impl ViewMode {
    /// Rows taken by headers and footers in this mode.
    pub fn chrome(self) -> usize {
        match self {
            Self::Status => 4,
            Self::History => 3,
            Self::CommitDetail => 12,
            Self::Diff => 2,
        }
    }
}

/// What a diff was requested for; also the key used to recognise stale
/// results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    WorkTree {
        path: String,
        staged: bool,
        untracked: bool,
    },
    Commit {
        hash: String,
        path: String,
    },
}

impl DiffTarget {
    pub fn path(&self) -> &str {
        match self {
            Self::WorkTree { path, .. } | Self::Commit { path, .. } => path,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::WorkTree {
                path,
                staged: true,
                ..
            } => format!("{path} [staged]"),
            Self::WorkTree {
                path,
                untracked: true,
                ..
            } => format!("{path} [untracked]"),
            Self::WorkTree { path, .. } => path.clone(),
            Self::Commit { hash, path } => {
                format!("{path} @ {}", hash.chars().take(7).collect::<String>())
            }
        }
    }

    fn for_status_entry(entry: &StatusEntry) -> Self {
        Self::WorkTree {
            path: entry.path.clone(),
            staged: entry.staged.is_some() && !entry.has_working_changes(),
            untracked: entry.is_untracked(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    Key(KeyEvent),
    Resize {
        width: usize,
        height: usize,
    },
    StatusLoaded(StatusSnapshot),
    HistoryLoaded(Vec<Commit>),
    CommitDetailLoaded(Commit),
    DiffLoaded {
        target: DiffTarget,
        raw: String,
    },
    ExternalRendered {
        target: DiffTarget,
        mode: DiffViewMode,
        output: String,
    },
    StageCompleted,
    FilesChanged,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub history_limit: usize,
    pub diff_view: DiffViewMode,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            history_limit: 500,
            diff_view: DiffViewMode::Unified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Info(text) | Self::Error(text) => text,
        }
    }
}

#[derive(Debug)]
struct DiffState {
    target: DiffTarget,
    raw: Option<String>,
    parsed: Option<Result<ParsedDiff, ParseError>>,
    external: Option<Vec<Line<'static>>>,
}

/// One display row of the history list: a commit row or a graph connector.
#[derive(Debug, Clone)]
struct HistoryRow {
    commit: Option<usize>,
    graph: GraphLine,
}

#[derive(Debug, Clone, Copy)]
enum Jump {
    By(isize),
    Start,
    End,
}

fn jump(cursor: usize, to: Jump, len: usize) -> usize {
    match to {
        Jump::By(delta) => step_cursor(cursor, delta, len),
        Jump::Start => 0,
        Jump::End => len.saturating_sub(1),
    }
}

fn list_jump(key: &KeyEvent) -> Option<Jump> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Jump::By(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(Jump::By(-1)),
        KeyCode::Char('g') => Some(Jump::Start),
        KeyCode::Char('G') => Some(Jump::End),
        _ => None,
    }
}

#[derive(Debug)]
pub struct GitView {
    options: ViewOptions,
    external: Arc<ExternalRenderer>,
    theme: DiffTheme,
    mode: ViewMode,
    width: usize,
    height: usize,

    snapshot: StatusSnapshot,
    status_loaded: bool,
    status_cursor: usize,
    status_scroll: usize,

    commits: Vec<Commit>,
    history_rows: Vec<HistoryRow>,
    commit_rows: Vec<usize>,
    history_loading: bool,
    history_cursor: usize,
    history_scroll: usize,

    detail_hash: Option<String>,
    detail: Option<Commit>,
    detail_cursor: usize,
    detail_scroll: usize,

    diff: Option<DiffState>,
    diff_from: ViewMode,
    diff_scroll: usize,
    horiz_offset: usize,
    diff_view: DiffViewMode,

    notice: Option<Notice>,
    quit: bool,
}

impl GitView {
    pub fn new(options: ViewOptions, external: Arc<ExternalRenderer>) -> Self {
        Self {
            options,
            external,
            theme: DiffTheme::default(),
            mode: ViewMode::Status,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            snapshot: StatusSnapshot::default(),
            status_loaded: false,
            status_cursor: 0,
            status_scroll: 0,
            commits: Vec::new(),
            history_rows: Vec::new(),
            commit_rows: Vec::new(),
            history_loading: false,
            history_cursor: 0,
            history_scroll: 0,
            detail_hash: None,
            detail: None,
            detail_cursor: 0,
            detail_scroll: 0,
            diff: None,
            diff_from: ViewMode::Status,
            diff_scroll: 0,
            horiz_offset: 0,
            diff_view: options.diff_view,
            notice: None,
            quit: false,
        }
    }

    /// Commands to run once at start-up.
    pub fn init(&self) -> Vec<Command> {
        vec![Command::LoadStatus]
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn status_cursor(&self) -> usize {
        self.status_cursor
    }

    pub fn status_scroll(&self) -> usize {
        self.status_scroll
    }

    pub fn history_cursor(&self) -> usize {
        self.history_cursor
    }

    pub fn history_scroll(&self) -> usize {
        self.history_scroll
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn detail(&self) -> Option<&Commit> {
        self.detail.as_ref()
    }

    pub fn detail_cursor(&self) -> usize {
        self.detail_cursor
    }

    pub fn diff_target(&self) -> Option<&DiffTarget> {
        self.diff.as_ref().map(|d| &d.target)
    }

    pub fn diff_scroll(&self) -> usize {
        self.diff_scroll
    }

    pub fn horiz_offset(&self) -> usize {
        self.horiz_offset
    }

    pub fn diff_view(&self) -> DiffViewMode {
        self.diff_view
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.on_key(key),
            Msg::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.sync_scroll();
                self.external_render().into_iter().collect()
            }
            Msg::StatusLoaded(snapshot) => {
                self.snapshot = snapshot;
                self.status_loaded = true;
                self.status_cursor = jump(self.status_cursor, Jump::By(0), self.snapshot.entries.len());
                self.sync_scroll();
                Vec::new()
            }
            Msg::HistoryLoaded(commits) => {
                if self.mode != ViewMode::History || !self.history_loading {
                    warn!("dropping history result: view moved on");
                    return Vec::new();
                }
                self.set_history(commits);
                Vec::new()
            }
            Msg::CommitDetailLoaded(commit) => {
                let wanted = self.detail_hash.as_deref() == Some(commit.hash.as_str());
                if !wanted || !matches!(self.mode, ViewMode::CommitDetail | ViewMode::Diff) {
                    warn!("dropping commit detail for {}", commit.short_hash);
                    return Vec::new();
                }
                self.detail_cursor = jump(self.detail_cursor, Jump::By(0), commit.files.len());
                self.detail = Some(commit);
                self.sync_scroll();
                Vec::new()
            }
            Msg::DiffLoaded { target, raw } => self.on_diff_loaded(target, raw),
            Msg::ExternalRendered {
                target,
                mode,
                output,
            } => {
                if self.mode != ViewMode::Diff || self.diff_view != mode {
                    warn!("dropping external render for {}", target.path());
                    return Vec::new();
                }
                match self.diff.as_mut() {
                    Some(state) if state.target == target => {
                        if state.raw.as_deref() == Some(output.as_str()) {
                            debug!("external renderer returned its input; keeping built-in view");
                        } else {
                            state.external = Some(ansi_to_lines(&output));
                        }
                    }
                    _ => warn!("dropping external render for {}", target.path()),
                }
                Vec::new()
            }
            Msg::StageCompleted => vec![Command::LoadStatus],
            Msg::FilesChanged => {
                let mut commands = vec![Command::LoadStatus];
                if self.mode == ViewMode::Diff
                    && let Some(state) = &self.diff
                    && matches!(state.target, DiffTarget::WorkTree { .. })
                {
                    commands.push(Command::LoadDiff(state.target.clone()));
                }
                commands
            }
            Msg::Error(message) => {
                self.history_loading = false;
                if let Some(state) = self.diff.as_mut()
                    && state.raw.is_none()
                {
                    state.raw = Some(String::new());
                }
                self.notice = Some(Notice::Error(message));
                Vec::new()
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        self.notice = None;
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return Vec::new();
        }
        match self.mode {
            ViewMode::Status => self.status_key(key),
            ViewMode::History => self.history_key(key),
            ViewMode::CommitDetail => self.detail_key(key),
            ViewMode::Diff => self.diff_key(key),
        }
    }

    fn status_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if let Some(to) = list_jump(&key) {
            self.status_cursor = jump(self.status_cursor, to, self.snapshot.entries.len());
            self.sync_scroll();
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Char('d') | KeyCode::Enter => match self.selected_status_entry() {
                Some(entry) => {
                    let target = DiffTarget::for_status_entry(entry);
                    self.open_diff(target, ViewMode::Status)
                }
                None => Vec::new(),
            },
            KeyCode::Char('s') => self
                .selected_status_entry()
                .map(|e| vec![Command::Stage { path: e.path.clone() }])
                .unwrap_or_default(),
            KeyCode::Char('u') => self
                .selected_status_entry()
                .map(|e| vec![Command::Unstage { path: e.path.clone() }])
                .unwrap_or_default(),
            KeyCode::Char('r') => vec![Command::LoadStatus],
            KeyCode::Char('q') => {
                self.quit = true;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn history_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if let Some(to) = list_jump(&key) {
            self.history_cursor = jump(self.history_cursor, to, self.commits.len());
            self.sync_scroll();
            return Vec::new();
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') => {
                self.mode = ViewMode::Status;
                self.history_loading = false;
                self.set_history(Vec::new());
                Vec::new()
            }
            KeyCode::Enter | KeyCode::Char('d') => {
                let Some(commit) = self.commits.get(self.history_cursor) else {
                    return Vec::new();
                };
                let hash = commit.hash.clone();
                self.mode = ViewMode::CommitDetail;
                self.detail_hash = Some(hash.clone());
                self.detail = None;
                self.detail_cursor = 0;
                self.detail_scroll = 0;
                vec![Command::LoadCommitDetail { hash }]
            }
            _ => Vec::new(),
        }
    }

    fn detail_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let files = self.detail.as_ref().map_or(0, |c| c.files.len());
        if let Some(to) = list_jump(&key) {
            self.detail_cursor = jump(self.detail_cursor, to, files);
            self.sync_scroll();
            return Vec::new();
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = ViewMode::History;
                self.detail_hash = None;
                self.detail = None;
                Vec::new()
            }
            KeyCode::Enter | KeyCode::Char('d') => {
                let Some(commit) = &self.detail else {
                    return Vec::new();
                };
                let Some(file) = commit.files.get(self.detail_cursor) else {
                    return Vec::new();
                };
                let target = DiffTarget::Commit {
                    hash: commit.hash.clone(),
                    path: file.path.clone(),
                };
                self.open_diff(target, ViewMode::CommitDetail)
            }
            _ => Vec::new(),
        }
    }

    fn diff_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let half_page = (self.visible_rows(ViewMode::Diff) / 2).max(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.diff_scroll = self.diff_scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.diff_scroll = self.diff_scroll.saturating_sub(1),
            KeyCode::PageDown => self.diff_scroll = self.diff_scroll.saturating_add(half_page),
            KeyCode::PageUp => self.diff_scroll = self.diff_scroll.saturating_sub(half_page),
            KeyCode::Char('g') => self.diff_scroll = 0,
            KeyCode::Char('G') => {
                self.diff_scroll = self
                    .diff_line_count()
                    .saturating_sub(self.visible_rows(ViewMode::Diff));
            }
            KeyCode::Char('<') | KeyCode::Left => {
                self.horiz_offset = self.horiz_offset.saturating_sub(HORIZONTAL_STEP);
            }
            KeyCode::Char('>') | KeyCode::Right => {
                self.horiz_offset = self.horiz_offset.saturating_add(HORIZONTAL_STEP);
            }
            KeyCode::Char('v') => {
                self.diff_view = self.diff_view.toggle();
                self.horiz_offset = 0;
                if let Some(state) = self.diff.as_mut() {
                    state.external = None;
                }
                return self.external_render().into_iter().collect();
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = self.diff_from;
                self.diff = None;
                self.diff_scroll = 0;
                self.horiz_offset = 0;
            }
            _ => {}
        }
        Vec::new()
    }

    fn open_history(&mut self) -> Vec<Command> {
        self.mode = ViewMode::History;
        self.set_history(Vec::new());
        self.history_loading = true;
        vec![Command::LoadHistory {
            limit: self.options.history_limit,
        }]
    }

    fn open_diff(&mut self, target: DiffTarget, from: ViewMode) -> Vec<Command> {
        self.mode = ViewMode::Diff;
        self.diff_from = from;
        self.diff_scroll = 0;
        self.horiz_offset = 0;
        self.diff = Some(DiffState {
            target: target.clone(),
            raw: None,
            parsed: None,
            external: None,
        });
        if !self.external.should_use_delta() && self.external.should_show_tip() {
            self.notice = Some(Notice::Info(DELTA_TIP.to_string()));
        }
        vec![Command::LoadDiff(target)]
    }

    fn on_diff_loaded(&mut self, target: DiffTarget, raw: String) -> Vec<Command> {
        if self.mode != ViewMode::Diff {
            warn!("dropping diff for {}: diff view closed", target.path());
            return Vec::new();
        }
        let Some(state) = self.diff.as_mut().filter(|s| s.target == target) else {
            warn!("dropping diff for {}: superseded", target.path());
            return Vec::new();
        };
        let parsed = parse_unified_diff(&raw);
        if let Err(err) = &parsed {
            debug!("diff for {} did not parse ({err}); showing raw text", target.path());
        }
        state.parsed = Some(parsed);
        state.raw = Some(raw);
        state.external = None;
        self.external_render().into_iter().collect()
    }

    /// A re-render request for the current diff when delta is in use.
    fn external_render(&self) -> Option<Command> {
        if self.mode != ViewMode::Diff || !self.external.should_use_delta() {
            return None;
        }
        let state = self.diff.as_ref()?;
        let raw = state.raw.as_ref().filter(|raw| !raw.trim().is_empty())?;
        Some(Command::RenderExternal {
            target: state.target.clone(),
            raw: raw.clone(),
            width: self.width,
            mode: self.diff_view,
        })
    }

    fn set_history(&mut self, commits: Vec<Commit>) {
        let index: HashMap<&str, usize> = commits
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.hash.as_str(), idx))
            .collect();
        let mut rows = Vec::new();
        let mut commit_rows = vec![0; commits.len()];
        for graph_row in compute_graph(&commits) {
            if let Some(&idx) = index.get(graph_row.hash.as_str()) {
                commit_rows[idx] = rows.len();
                rows.push(HistoryRow {
                    commit: Some(idx),
                    graph: graph_row.line,
                });
            }
            rows.extend(graph_row.connectors.into_iter().map(|graph| HistoryRow {
                commit: None,
                graph,
            }));
        }
        self.history_rows = rows;
        self.commit_rows = commit_rows;
        self.commits = commits;
        self.history_loading = false;
        self.history_cursor = 0;
        self.history_scroll = 0;
    }

    fn selected_status_entry(&self) -> Option<&StatusEntry> {
        self.snapshot.entries.get(self.status_cursor)
    }

    fn visible_rows(&self, mode: ViewMode) -> usize {
        self.height.saturating_sub(mode.chrome())
    }

    fn sync_scroll(&mut self) {
        self.status_scroll = ensure_cursor_visible(
            self.status_cursor,
            self.status_scroll,
            self.visible_rows(ViewMode::Status),
        );
        let history_row = self.commit_rows.get(self.history_cursor).copied().unwrap_or(0);
        self.history_scroll = ensure_cursor_visible(
            history_row,
            self.history_scroll,
            self.visible_rows(ViewMode::History),
        );
        self.detail_scroll = ensure_cursor_visible(
            self.detail_cursor,
            self.detail_scroll,
            self.visible_rows(ViewMode::CommitDetail),
        );
    }

    /// Rows the diff body can show at the current view mode.
    fn diff_line_count(&self) -> usize {
        let Some(state) = &self.diff else {
            return 0;
        };
        if let Some(lines) = &state.external {
            return lines.len();
        }
        match (&state.parsed, &state.raw) {
            (Some(Ok(parsed)), _) => rendered_row_count(parsed, self.diff_view),
            (_, Some(raw)) => raw.lines().count(),
            _ => 0,
        }
    }
}
