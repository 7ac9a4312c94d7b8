use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use gitpane_core::render::{file_header_line, plain_text};
use gitpane_core::{
    ConfigStore, DeltaMode, DiffTheme, DiffViewMode, DiffViewport, ExternalRenderer,
    GitPaneConfig, GitRunner, GitService, ViewOptions, compute_graph, parse_multi_file_diff,
    render_diff,
};
use log::{LevelFilter, info, warn};

mod logger;
mod tui;
mod watcher;

const DEFAULT_DIFF_WIDTH: usize = 120;

#[derive(Debug, Parser)]
#[command(name = "gitpane")]
#[command(about = "Git status, history and diff viewer for the terminal", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    repo: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevelArg>,
    #[command(flatten)]
    overrides: ConfigOverrides,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Default, Args)]
struct ConfigOverrides {
    /// Git binary to run.
    #[arg(long, global = true)]
    git: Option<String>,
    #[arg(long, global = true, value_enum)]
    delta: Option<DeltaArg>,
    #[arg(long, global = true)]
    side_by_side: bool,
    /// Commits to load into the history view.
    #[arg(long, global = true)]
    limit: Option<usize>,
    #[arg(long, global = true)]
    no_watch: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Tui,
    Diff(DiffCmd),
    Graph,
    Status(StatusCmd),
}

#[derive(Debug, Args)]
struct DiffCmd {
    #[arg(long)]
    cached: bool,
    #[arg(long)]
    commit: Option<String>,
    #[arg(long)]
    file: Option<String>,
    /// Read diff text from a file, or `-` for stdin, instead of running git.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    width: Option<usize>,
}

#[derive(Debug, Args)]
struct StatusCmd {
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DeltaArg {
    Auto,
    Forced,
    Disabled,
}

impl From<DeltaArg> for DeltaMode {
    fn from(arg: DeltaArg) -> Self {
        match arg {
            DeltaArg::Auto => Self::Auto,
            DeltaArg::Forced => Self::Forced,
            DeltaArg::Disabled => Self::Disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Off => Self::Off,
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
            LogLevelArg::Trace => Self::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    match logger::init(cli.log_level.map(LevelFilter::from)) {
        Ok(path) => info!("logging to {}", path.display()),
        Err(err) => eprintln!("warning: logging disabled: {err:#}"),
    }

    let store = match cli.config {
        Some(path) => ConfigStore::at(path),
        None => ConfigStore::default_store().context("failed to resolve config path")?,
    };
    let mut config = store
        .load()
        .with_context(|| format!("failed to load config from {}", store.path().display()))?;
    apply_overrides(&mut config, &cli.overrides);

    let service = GitService::new(GitRunner::new(config.git_binary.clone()))
        .with_context_lines(config.context_lines);
    let repo_arg = cli.repo;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let repo = resolve_repo(&service, repo_arg)?;
            let external = Arc::new(ExternalRenderer::new(config.delta, config.delta_binary.clone()));
            tui::run(
                service,
                external,
                tui::TuiConfig {
                    repo: repo.clone(),
                    options: ViewOptions {
                        history_limit: config.history_limit,
                        diff_view: config.diff_view,
                    },
                    watch: config.watch,
                },
            )
            .with_context(|| format!("failed running TUI for {}", repo.display()))?;
        }
        Commands::Diff(cmd) => {
            let text = match &cmd.input {
                Some(path) => read_input(path)?,
                None => {
                    let repo = resolve_repo(&service, repo_arg)?;
                    let path = cmd.file.as_deref().unwrap_or(".");
                    match &cmd.commit {
                        Some(hash) => service.commit_file_diff(&repo, hash, path),
                        None => service.file_diff(&repo, path, cmd.cached),
                    }
                    .with_context(|| format!("failed to load diff for {}", repo.display()))?
                }
            };
            let width = cmd
                .width
                .or_else(|| crossterm::terminal::size().ok().map(|(w, _)| usize::from(w)))
                .unwrap_or(DEFAULT_DIFF_WIDTH);
            print!("{}", render_diff_text(&text, config.diff_view, width));
        }
        Commands::Graph => {
            let repo = resolve_repo(&service, repo_arg)?;
            let commits = service
                .commit_history(&repo, config.history_limit, 0)
                .with_context(|| format!("failed to load history for {}", repo.display()))?;
            let rows = compute_graph(&commits);
            let graph_width = rows
                .iter()
                .flat_map(|r| std::iter::once(&r.line).chain(&r.connectors))
                .map(|l| l.width)
                .max()
                .unwrap_or(0);
            for (commit, row) in commits.iter().zip(&rows) {
                println!(
                    "{:<graph_width$} {} {}",
                    row.line.as_string(),
                    commit.short_hash,
                    commit.subject
                );
                for connector in &row.connectors {
                    println!("{}", connector.as_string().trim_end());
                }
            }
        }
        Commands::Status(cmd) => {
            let repo = resolve_repo(&service, repo_arg)?;
            let snapshot = service
                .status_snapshot(&repo)
                .with_context(|| format!("failed to read status of {}", repo.display()))?;
            let json = if cmd.pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

fn apply_overrides(config: &mut GitPaneConfig, overrides: &ConfigOverrides) {
    if let Some(git) = &overrides.git {
        config.git_binary = git.clone();
    }
    if let Some(delta) = overrides.delta {
        config.delta = delta.into();
    }
    if overrides.side_by_side {
        config.diff_view = DiffViewMode::SideBySide;
    }
    if let Some(limit) = overrides.limit {
        config.history_limit = limit;
    }
    if overrides.no_watch {
        config.watch = false;
    }
}

fn resolve_repo(service: &GitService, cli_repo: Option<PathBuf>) -> Result<PathBuf> {
    let start = match cli_repo {
        Some(repo) => repo,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    service.discover_repo_root(&start).map_err(|err| {
        anyhow!(
            "{} is not inside a git repository (pass --repo, or run `gitpane` inside a git repo): {}",
            start.display(),
            err.summary()
        )
    })
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read diff from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read diff from {}", path.display()))
}

/// Plain-text rendering of one or more file diffs. Text that does not parse
/// is passed through unchanged.
fn render_diff_text(text: &str, mode: DiffViewMode, width: usize) -> String {
    let files = match parse_multi_file_diff(text) {
        Ok(files) => files,
        Err(err) => {
            warn!("diff did not parse ({err}); printing it unchanged");
            return text.to_string();
        }
    };
    let theme = DiffTheme::default();
    let mut out = String::new();
    for file in &files {
        out.push_str(&plain_text(&[file_header_line(&file.info, width, &theme)]));
        let lines = render_diff(&file.diff, mode, DiffViewport::new(width, 0, usize::MAX), &theme);
        out.push_str(&plain_text(&lines));
    }
    out
}
