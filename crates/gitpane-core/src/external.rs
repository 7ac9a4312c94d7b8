//! Optional hand-off of diff rendering to `delta`.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use ansi_parser::{AnsiParser, AnsiSequence, Output};
use log::{debug, warn};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde::{Deserialize, Serialize};

use crate::error::{GitPaneError, Result};

pub const DELTA_TIP: &str =
    "Tip: install delta (https://github.com/dandavison/delta) for syntax-highlighted diffs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    #[default]
    Auto,
    Forced,
    Disabled,
}

/// Adapter around the `delta` binary. The host builds one per process and
/// shares it behind an `Arc`, which makes the one-shot tip process-wide.
#[derive(Debug)]
pub struct ExternalRenderer {
    mode: DeltaMode,
    program: String,
    binary: Option<PathBuf>,
    tip_shown: AtomicBool,
}

impl ExternalRenderer {
    /// Resolve `program` on `PATH` once; the result is fixed for the
    /// renderer's lifetime.
    pub fn new(mode: DeltaMode, program: impl Into<String>) -> Self {
        let program = program.into();
        let binary = match mode {
            DeltaMode::Disabled => None,
            DeltaMode::Auto | DeltaMode::Forced => which::which(&program).ok(),
        };
        debug!("delta mode {mode:?}, binary {binary:?}");
        Self::with_binary(mode, program, binary)
    }

    pub fn with_binary(mode: DeltaMode, program: impl Into<String>, binary: Option<PathBuf>) -> Self {
        Self {
            mode,
            program: program.into(),
            binary,
            tip_shown: AtomicBool::new(false),
        }
    }

    pub fn disabled() -> Self {
        Self::with_binary(DeltaMode::Disabled, "delta", None)
    }

    pub fn mode(&self) -> DeltaMode {
        self.mode
    }

    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    pub fn should_use_delta(&self) -> bool {
        match self.mode {
            DeltaMode::Forced => true,
            DeltaMode::Auto => self.is_available(),
            DeltaMode::Disabled => false,
        }
    }

    /// True the first time it is asked while the binary is missing, false
    /// ever after. Never true when delta is disabled.
    pub fn should_show_tip(&self) -> bool {
        if self.is_available() || self.mode == DeltaMode::Disabled {
            return false;
        }
        !self.tip_shown.swap(true, Ordering::Relaxed)
    }

    /// Pipe `raw` through delta. Any failure hands back `raw` unchanged.
    pub fn render(&self, raw: &str, width: usize, side_by_side: bool) -> String {
        match self.try_render(raw, width, side_by_side) {
            Ok(out) => out,
            Err(err) => {
                warn!("{err}");
                raw.to_string()
            }
        }
    }

    pub fn try_render(&self, raw: &str, width: usize, side_by_side: bool) -> Result<String> {
        let program = self
            .binary
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.program));
        let external = |message: String| GitPaneError::External {
            program: program.display().to_string(),
            message,
        };

        let mut cmd = Command::new(&program);
        cmd.arg(format!("--width={width}")).arg("--paging=never");
        if side_by_side {
            cmd.arg("--side-by-side");
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| external(format!("spawn failed: {e}")))?;

        // Feed stdin from a separate thread so a full stdout pipe cannot stall us.
        let input = raw.to_string();
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });
        let output = child
            .wait_with_output()
            .map_err(|e| external(format!("wait failed: {e}")))?;
        if let Some(handle) = writer
            && let Ok(Err(e)) = handle.join()
        {
            return Err(external(format!("writing input failed: {e}")));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(external(format!(
                "exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Convert ANSI-coloured text into styled lines. Unsupported escape
/// sequences are dropped; SGR state carries across line breaks.
pub fn ansi_to_lines(text: &str) -> Vec<Line<'static>> {
    let mut style = Style::default();
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut spans = Vec::new();
        for block in raw_line.ansi_parse() {
            match block {
                Output::TextBlock(chunk) => {
                    let chunk = chunk.replace('\t', "    ").replace('\r', "");
                    if !chunk.is_empty() {
                        spans.push(Span::styled(chunk, style));
                    }
                }
                Output::Escape(AnsiSequence::SetGraphicsMode(params)) => {
                    style = apply_sgr(style, &params[..]);
                }
                Output::Escape(_) => {}
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn apply_sgr(mut style: Style, params: &[u8]) -> Style {
    if params.is_empty() {
        return Style::default();
    }
    let mut idx = 0;
    while idx < params.len() {
        match params[idx] {
            0 => style = Style::default(),
            1 => style = style.add_modifier(Modifier::BOLD),
            2 => style = style.add_modifier(Modifier::DIM),
            3 => style = style.add_modifier(Modifier::ITALIC),
            4 => style = style.add_modifier(Modifier::UNDERLINED),
            7 => style = style.add_modifier(Modifier::REVERSED),
            22 => style = style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style = style.remove_modifier(Modifier::ITALIC),
            24 => style = style.remove_modifier(Modifier::UNDERLINED),
            27 => style = style.remove_modifier(Modifier::REVERSED),
            code @ 30..=37 => style = style.fg(Color::Indexed(code - 30)),
            code @ 40..=47 => style = style.bg(Color::Indexed(code - 40)),
            code @ 90..=97 => style = style.fg(Color::Indexed(code - 90 + 8)),
            code @ 100..=107 => style = style.bg(Color::Indexed(code - 100 + 8)),
            39 => style.fg = None,
            49 => style.bg = None,
            code @ (38 | 48) => {
                let (color, used) = extended_color(&params[idx + 1..]);
                if let Some(color) = color {
                    style = if code == 38 { style.fg(color) } else { style.bg(color) };
                }
                idx += used;
            }
            _ => {}
        }
        idx += 1;
    }
    style
}

/// `5;n` or `2;r;g;b` after a 38/48 code. Returns the colour and how many
/// parameters it consumed.
fn extended_color(rest: &[u8]) -> (Option<Color>, usize) {
    match rest {
        [5, n, ..] => (Some(Color::Indexed(*n)), 2),
        [2, r, g, b, ..] => (Some(Color::Rgb(*r, *g, *b)), 4),
        _ => (None, rest.len()),
    }
}
