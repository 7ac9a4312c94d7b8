pub mod config;
pub mod diff;
pub mod error;
pub mod external;
pub mod git;
pub mod graph;
pub mod history;
pub mod log_parser;
pub mod models;
pub mod render;
pub mod service;
pub mod status;
pub mod text;
pub mod view;

pub use config::{ConfigStore, GitPaneConfig};
pub use diff::{
    DiffLine, FileDiff, FileDiffInfo, Hunk, LineKind, MultiFileDiff, ParsedDiff, WordSegment,
    parse_multi_file_diff, parse_unified_diff,
};
pub use error::{GitPaneError, ParseError, ParseErrorKind, Result};
pub use external::{DeltaMode, ExternalRenderer};
pub use git::{GitOutput, GitRunner};
pub use graph::{GraphEngine, compute_graph};
pub use models::{
    Commit, CommitFile, CommitStats, FileStatus, GraphColumn, GraphLine, GraphRow, NumstatEntry,
    StatusEntry, StatusSnapshot,
};
pub use render::{DiffTheme, DiffViewMode, DiffViewport, render_diff};
pub use service::GitService;
pub use view::{Command, DiffTarget, GitView, Msg, ViewMode, ViewOptions};
