use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use super::theme::lane_color;
use crate::models::GraphLine;

/// Colour a graph row lane by lane. Diagonals take the colour of the lane
/// they lead into.
pub fn graph_spans(line: &GraphLine) -> Vec<Span<'static>> {
    line.chars
        .iter()
        .enumerate()
        .map(|(idx, ch)| {
            let style = match ch {
                ' ' => Style::default(),
                '*' => Style::default()
                    .fg(lane_color(idx / 2))
                    .add_modifier(Modifier::BOLD),
                '|' => Style::default().fg(lane_color(idx / 2)),
                '\\' | '-' => Style::default().fg(lane_color(idx.div_ceil(2))),
                '/' | '_' => Style::default().fg(lane_color(idx / 2)),
                _ => Style::default().fg(Color::DarkGray),
            };
            Span::styled(ch.to_string(), style)
        })
        .collect()
}
