//! Splits concatenated `git diff` output into per-file parsed diffs.

use super::model::{FileDiff, FileDiffInfo, MultiFileDiff};
use super::parser::{clean_path, is_dev_null, parse_at, split_git_paths};
use crate::error::ParseError;

const FILE_BOUNDARY: &str = "diff --git ";

/// Parse a diff that may cover several files. Each `diff --git` line starts a
/// new record; text without any such line is treated as a single file.
pub fn parse_multi_file_diff(text: &str) -> Result<MultiFileDiff, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with(FILE_BOUNDARY))
        .map(|(idx, _)| idx)
        .collect();
    if starts.is_empty() {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        starts.push(0);
    }

    let mut files = Vec::with_capacity(starts.len());
    for (pos, &start) in starts.iter().enumerate() {
        let end = starts.get(pos + 1).copied().unwrap_or(lines.len());
        let segment = &lines[start..end];
        let info = parse_file_info(segment);
        let diff = parse_at(&segment.join("\n"), start)?;
        files.push(FileDiff { info, diff });
    }
    Ok(files)
}

/// Read the extended header of one record (everything before its first hunk).
pub fn parse_file_info(lines: &[&str]) -> FileDiffInfo {
    let mut info = FileDiffInfo::default();
    for line in lines {
        if line.starts_with("@@") {
            break;
        }
        if let Some(rest) = line.strip_prefix(FILE_BOUNDARY) {
            if let Some((old, new)) = split_git_paths(rest) {
                info.old_file = old;
                info.new_file = new;
            }
        } else if let Some(rest) = line.strip_prefix("--- ") {
            let path = clean_path(rest);
            if is_dev_null(&path) {
                info.is_new = true;
            }
            info.old_file = path;
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            let path = clean_path(rest);
            if is_dev_null(&path) {
                info.is_deleted = true;
            }
            info.new_file = path;
        } else if let Some(rest) = line.strip_prefix("rename from ") {
            info.is_rename = true;
            info.old_file = rest.trim().trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("rename to ") {
            info.is_rename = true;
            info.new_file = rest.trim().trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("copy from ") {
            info.is_copy = true;
            info.old_file = rest.trim().trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("copy to ") {
            info.is_copy = true;
            info.new_file = rest.trim().trim_matches('"').to_string();
        } else if let Some(mode) = line.strip_prefix("new file mode ") {
            info.is_new = true;
            info.new_mode = Some(mode.trim().to_string());
        } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
            info.is_deleted = true;
            info.old_mode = Some(mode.trim().to_string());
        } else if let Some(mode) = line.strip_prefix("old mode ") {
            info.old_mode = Some(mode.trim().to_string());
        } else if let Some(mode) = line.strip_prefix("new mode ") {
            info.new_mode = Some(mode.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("similarity index ") {
            info.similarity = rest.trim().trim_end_matches('%').parse().ok();
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    const TWO_FILES: &str = "diff --git a/src/main.rs b/src/main.rs
index abc123..def456 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@ fn main()
 fn main() {
     println!(\"Hello\");
+    println!(\"World\");
 }
diff --git a/src/lib.rs b/src/lib.rs
index 111222..333444 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,3 +10,2 @@ impl Foo {
 impl Foo {
-    // old comment
     fn bar(&self) {}
";

    #[test]
    fn splits_on_file_boundaries() {
        let files = parse_multi_file_diff(TWO_FILES).expect("parses");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].info.new_file, "src/main.rs");
        assert_eq!(files[0].diff.additions(), 1);
        assert_eq!(files[1].info.new_file, "src/lib.rs");
        assert_eq!(files[1].diff.deletions(), 1);
        assert_eq!(files[1].diff.hunks[0].old_start, 10);
    }

    #[test]
    fn detects_new_and_deleted_files() {
        let text = "diff --git a/new.rs b/new.rs
new file mode 100644
index 0000000..abc1234
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,2 @@
+fn a() {}
+fn b() {}
diff --git a/old.rs b/old.rs
deleted file mode 100644
index abc1234..0000000
--- a/old.rs
+++ /dev/null
@@ -1 +0,0 @@
-fn gone() {}
";
        let files = parse_multi_file_diff(text).expect("parses");
        assert!(files[0].info.is_new);
        assert_eq!(files[0].info.new_mode.as_deref(), Some("100644"));
        assert!(files[1].info.is_deleted);
        assert_eq!(files[1].info.old_mode.as_deref(), Some("100644"));
        assert_eq!(files[1].info.display_name(), "old.rs");
    }

    #[test]
    fn detects_renames_and_binary_records() {
        let text = "diff --git a/old_name.rs b/new_name.rs
similarity index 95%
rename from old_name.rs
rename to new_name.rs
diff --git a/logo.png b/logo.png
index 1111111..2222222 100644
Binary files a/logo.png and b/logo.png differ
";
        let files = parse_multi_file_diff(text).expect("parses");
        assert_eq!(files.len(), 2);
        assert!(files[0].info.is_rename);
        assert_eq!(files[0].info.old_file, "old_name.rs");
        assert_eq!(files[0].info.new_file, "new_name.rs");
        assert_eq!(files[0].info.similarity, Some(95));
        assert!(files[0].diff.is_empty());
        assert!(files[1].diff.binary);
    }

    #[test]
    fn reports_errors_with_absolute_line_numbers() {
        let text = "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/y b/y\n--- a/y\n+++ b/y\n@@ bogus @@\n";
        let err = parse_multi_file_diff(text).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedHunk);
        assert_eq!(err.line, 10);
    }

    #[test]
    fn plain_diff_without_git_header_is_one_file() {
        let files = parse_multi_file_diff("--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n").expect("parses");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].info.old_file, "f");
        assert!(parse_multi_file_diff("  \n").expect("empty").is_empty());
    }
}
