//! Width, truncation and scrolling primitives shared by the renderer and the
//! view state machine.
//!
//! Lengths are counted in `char`s so that slicing never lands inside a UTF-8
//! sequence; for ASCII input this is the same as counting bytes.

use std::cmp::min;

const ELLIPSIS: &str = "...";

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `s` to at most `width` chars, marking the cut with `...` when there is
/// room for it.
pub fn truncate_line(s: &str, width: usize) -> String {
    if char_len(s) <= width {
        return s.to_string();
    }
    if width <= ELLIPSIS.len() {
        return s.chars().take(width).collect();
    }
    let mut out: String = s.chars().take(width - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Pad `s` with spaces up to `width`. Never truncates.
pub fn pad_right(s: &str, width: usize) -> String {
    let len = char_len(s);
    if len >= width {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + (width - len));
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

/// Drop the first `offset` chars of `s`.
pub fn apply_horizontal_offset(s: &str, offset: usize) -> String {
    if offset == 0 {
        return s.to_string();
    }
    match s.char_indices().nth(offset) {
        Some((idx, _)) => s[idx..].to_string(),
        None => String::new(),
    }
}

/// Number of newline-separated lines; the empty string counts as one line.
pub fn count_lines(s: &str) -> usize {
    s.matches('\n').count() + 1
}

/// Scroll offset that keeps `cursor` inside a window of `visible` rows,
/// moving the window as little as possible.
pub fn ensure_cursor_visible(cursor: usize, scroll: usize, visible: usize) -> usize {
    if visible == 0 {
        return cursor;
    }
    if cursor < scroll {
        return cursor;
    }
    let window_last = scroll.saturating_add(visible - 1);
    if cursor > window_last {
        return cursor + 1 - visible;
    }
    scroll
}

/// Move `cursor` by `delta` inside `0..len`, saturating at both ends.
pub fn step_cursor(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = if delta < 0 {
        cursor.saturating_sub(delta.unsigned_abs())
    } else {
        cursor.saturating_add(delta as usize)
    };
    min(moved, len - 1)
}

/// Strip terminal escape sequences and control characters; tabs become four
/// spaces.
pub fn sanitize_terminal_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_escape = false;
    let mut in_csi = false;

    for ch in input.chars() {
        if in_escape {
            if ch == '[' {
                in_csi = true;
                in_escape = false;
            } else {
                in_escape = false;
            }
            continue;
        }
        if in_csi {
            if ('@'..='~').contains(&ch) {
                in_csi = false;
            }
            continue;
        }

        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }
        if ch == '\t' {
            out.push_str("    ");
            continue;
        }
        if ch.is_control() {
            continue;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_line("hello world", 8), "hello...");
        assert_eq!(truncate_line("hello", 5), "hello");
        assert_eq!(truncate_line("hello", 3), "hel");
        assert_eq!(truncate_line("hello", 0), "");
    }

    #[test]
    fn truncation_bounds_hold_for_all_widths() {
        let samples = ["", "a", "abc", "abcd", "ünïcödé text", "a much longer line of text"];
        for s in samples {
            for w in 0..32 {
                let out = truncate_line(s, w);
                assert!(char_len(&out) <= w, "{s:?} @ {w} -> {out:?}");
                assert_eq!(out == s, char_len(s) <= w, "{s:?} @ {w}");
            }
        }
    }

    #[test]
    fn pad_right_is_idempotent() {
        for s in ["", "ab", "abcdef"] {
            for w in 0..10 {
                let once = pad_right(s, w);
                assert_eq!(pad_right(&once, w), once);
                assert_eq!(char_len(&once), char_len(s).max(w));
            }
        }
    }

    #[test]
    fn horizontal_offsets_compose() {
        let s = "0123456789abcdef";
        for a in 0..20 {
            for b in 0..20 {
                assert_eq!(
                    apply_horizontal_offset(&apply_horizontal_offset(s, a), b),
                    apply_horizontal_offset(s, a + b)
                );
            }
        }
        assert_eq!(apply_horizontal_offset("abc", 3), "");
        assert_eq!(apply_horizontal_offset("abc", 1), "bc");
    }

    #[test]
    fn counts_lines() {
        assert_eq!(count_lines(""), 1);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\ntwo"), 2);
        assert_eq!(count_lines("one\ntwo\n"), 3);
    }

    #[test]
    fn keeps_cursor_in_window() {
        assert_eq!(ensure_cursor_visible(0, 0, 5), 0);
        assert_eq!(ensure_cursor_visible(4, 0, 5), 0);
        assert_eq!(ensure_cursor_visible(5, 0, 5), 1);
        assert_eq!(ensure_cursor_visible(2, 4, 5), 2);
        assert_eq!(ensure_cursor_visible(9, 3, 5), 5);
    }

    #[test]
    fn steps_cursor_with_clamping() {
        assert_eq!(step_cursor(0, -1, 3), 0);
        assert_eq!(step_cursor(2, 1, 3), 2);
        assert_eq!(step_cursor(1, 1, 3), 2);
        assert_eq!(step_cursor(5, 0, 0), 0);
    }

    #[test]
    fn sanitizes_escapes_and_tabs() {
        assert_eq!(sanitize_terminal_text("\u{1b}[31mred\u{1b}[0m"), "red");
        assert_eq!(sanitize_terminal_text("a\tb"), "a    b");
        assert_eq!(sanitize_terminal_text("bell\u{7}"), "bell");
    }
}
