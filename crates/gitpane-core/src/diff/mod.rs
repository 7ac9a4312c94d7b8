//! Unified diff parsing: single file, multi-file and word-level highlights.

pub mod model;
pub mod multi;
pub mod parser;
pub mod word;

pub use model::{
    DiffLine, FileDiff, FileDiffInfo, Hunk, LineKind, MultiFileDiff, ParsedDiff, WordSegment,
};
pub use multi::parse_multi_file_diff;
pub use parser::parse_unified_diff;
pub use word::word_diff;
