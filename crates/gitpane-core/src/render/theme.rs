use ratatui::style::{Color, Modifier, Style};

use crate::diff::LineKind;

/// Lane colours for the commit graph, cycled by column index.
pub const LANE_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::LightBlue,
    Color::LightGreen,
    Color::Yellow,
    Color::Magenta,
    Color::LightRed,
    Color::LightCyan,
    Color::White,
];

pub fn lane_color(lane: usize) -> Color {
    LANE_COLORS[lane % LANE_COLORS.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffTheme {
    pub context: Style,
    pub add: Style,
    pub remove: Style,
    pub add_emphasis: Style,
    pub remove_emphasis: Style,
    pub hunk_header: Style,
    pub file_header: Style,
    pub gutter: Style,
    pub separator: Style,
    pub muted: Style,
}

impl Default for DiffTheme {
    fn default() -> Self {
        Self {
            context: Style::default().fg(Color::Gray),
            add: Style::default().fg(Color::Green),
            remove: Style::default().fg(Color::Red),
            add_emphasis: Style::default()
                .fg(Color::LightGreen)
                .bg(Color::Rgb(0x1f, 0x4d, 0x2b))
                .add_modifier(Modifier::BOLD),
            remove_emphasis: Style::default()
                .fg(Color::LightRed)
                .bg(Color::Rgb(0x5c, 0x1f, 0x24))
                .add_modifier(Modifier::BOLD),
            hunk_header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            file_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            gutter: Style::default().fg(Color::DarkGray),
            separator: Style::default().fg(Color::DarkGray),
            muted: Style::default().fg(Color::DarkGray),
        }
    }
}

impl DiffTheme {
    pub fn line(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::Context => self.context,
            LineKind::Add => self.add,
            LineKind::Remove => self.remove,
        }
    }

    pub fn emphasis(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::Context => self.context,
            LineKind::Add => self.add_emphasis,
            LineKind::Remove => self.remove_emphasis,
        }
    }
}
