//! Intra-line (word level) highlighting between paired removed/added lines.

use similar::{ChangeTag, TextDiff};

use super::model::{DiffLine, LineKind, WordSegment};

/// Lines longer than this are marked as changed wholesale instead of diffed.
const MAX_WORD_DIFF_BYTES: usize = 4_096;

/// Token-level difference between `old` and `new`. Tokens are runs of
/// non-whitespace and runs of whitespace, so each side's segments concatenate
/// back to its input.
pub fn word_diff(old: &str, new: &str) -> (Vec<WordSegment>, Vec<WordSegment>) {
    if old.len() > MAX_WORD_DIFF_BYTES || new.len() > MAX_WORD_DIFF_BYTES {
        return (whole(old, true), whole(new, true));
    }

    let diff = TextDiff::from_words(old, new);
    let mut old_segments = Vec::new();
    let mut new_segments = Vec::new();
    for change in diff.iter_all_changes() {
        let text = change.value();
        match change.tag() {
            ChangeTag::Equal => {
                push_segment(&mut old_segments, text, false);
                push_segment(&mut new_segments, text, false);
            }
            ChangeTag::Delete => push_segment(&mut old_segments, text, true),
            ChangeTag::Insert => push_segment(&mut new_segments, text, true),
        }
    }
    (old_segments, new_segments)
}

/// Fill `word_diff` for every add/remove line in a hunk body.
///
/// A run of removals directly followed by a run of additions is paired
/// index-wise; paired lines get a token diff, everything else gets a single
/// unchanged segment. Context lines are left without segments.
pub fn attach_word_diffs(lines: &mut [DiffLine]) {
    let mut idx = 0;
    while idx < lines.len() {
        match lines[idx].kind {
            LineKind::Context => idx += 1,
            LineKind::Add => {
                lines[idx].word_diff = whole(&lines[idx].content, false);
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
                let removes = adds_start - removes_start;
                let adds = idx - adds_start;
                for offset in 0..removes.max(adds) {
                    match (offset < removes, offset < adds) {
                        (true, true) => {
                            let (old, new) = word_diff(
                                &lines[removes_start + offset].content,
                                &lines[adds_start + offset].content,
                            );
                            lines[removes_start + offset].word_diff = old;
                            lines[adds_start + offset].word_diff = new;
                        }
                        (true, false) => {
                            let line = &mut lines[removes_start + offset];
                            line.word_diff = whole(&line.content, false);
                        }
                        (false, true) => {
                            let line = &mut lines[adds_start + offset];
                            line.word_diff = whole(&line.content, false);
                        }
                        (false, false) => {}
                    }
                }
            }
        }
    }
}

fn whole(text: &str, is_change: bool) -> Vec<WordSegment> {
    vec![WordSegment::new(text, is_change)]
}

fn push_segment(segments: &mut Vec<WordSegment>, text: &str, is_change: bool) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = segments.last_mut()
        && last.is_change == is_change
    {
        last.text.push_str(text);
        return;
    }
    segments.push(WordSegment::new(text, is_change));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(segments: &[WordSegment]) -> String {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn marks_only_changed_tokens() {
        let (old, new) = word_diff("let x = old_value;", "let x = new_value;");
        assert_eq!(joined(&old), "let x = old_value;");
        assert_eq!(joined(&new), "let x = new_value;");
        assert_eq!(old[0], WordSegment::new("let x = ", false));
        assert_eq!(old[1], WordSegment::new("old_value;", true));
        assert_eq!(new[1], WordSegment::new("new_value;", true));
    }

    #[test]
    fn identical_lines_have_no_changes() {
        let (old, new) = word_diff("same text", "same text");
        assert!(old.iter().all(|s| !s.is_change));
        assert!(new.iter().all(|s| !s.is_change));
    }

    #[test]
    fn pairs_removals_with_following_additions() {
        let mut lines = vec![
            DiffLine::remove("old one", 1),
            DiffLine::remove("old two", 2),
            DiffLine::add("new one", 1),
            DiffLine::context("ctx", 3, 2),
            DiffLine::add("lonely", 3),
        ];
        attach_word_diffs(&mut lines);

        assert!(lines[0].word_diff.iter().any(|s| s.is_change));
        assert!(lines[2].word_diff.iter().any(|s| s.is_change));
        assert_eq!(lines[1].word_diff, vec![WordSegment::new("old two", false)]);
        assert!(lines[3].word_diff.is_empty());
        assert_eq!(lines[4].word_diff, vec![WordSegment::new("lonely", false)]);
        for line in &lines {
            if !line.word_diff.is_empty() {
                assert_eq!(joined(&line.word_diff), line.content);
            }
        }
    }

    #[test]
    fn oversized_lines_are_marked_whole() {
        let long = "x ".repeat(MAX_WORD_DIFF_BYTES);
        let (old, new) = word_diff(&long, "short");
        assert_eq!(old.len(), 1);
        assert!(old[0].is_change);
        assert_eq!(new, vec![WordSegment::new("short", true)]);
    }
}
