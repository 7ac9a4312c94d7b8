use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use gitpane_core::view::execute as execute_command;
use gitpane_core::{Command, ExternalRenderer, GitService, GitView, Msg, ViewOptions};
use log::{debug, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::Paragraph;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::watcher;

const POLL_RATE: Duration = Duration::from_millis(33);
const REFRESH_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct TuiConfig {
    pub repo: PathBuf,
    pub options: ViewOptions,
    pub watch: bool,
}

/// Runs view commands on blocking worker threads and posts the resulting
/// messages back to the UI loop.
struct Dispatcher {
    handle: Handle,
    sender: UnboundedSender<Msg>,
    repo: Arc<PathBuf>,
    service: Arc<GitService>,
    external: Arc<ExternalRenderer>,
}

impl Dispatcher {
    fn dispatch(&self, commands: Vec<Command>) {
        for command in commands {
            debug!("dispatch {command:?}");
            let sender = self.sender.clone();
            let repo = Arc::clone(&self.repo);
            let service = Arc::clone(&self.service);
            let external = Arc::clone(&self.external);
            self.handle.spawn_blocking(move || {
                let msg = execute_command(command, &repo, &service, &external);
                let _ = sender.send(msg);
            });
        }
    }
}

pub fn run(service: GitService, external: Arc<ExternalRenderer>, config: TuiConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("gitpane-worker")
        .build()
        .context("failed to start worker runtime")?;
    let (sender, receiver) = unbounded_channel();
    let dispatcher = Dispatcher {
        handle: runtime.handle().clone(),
        sender: sender.clone(),
        repo: Arc::new(config.repo.clone()),
        service: Arc::new(service),
        external: Arc::clone(&external),
    };
    let _watcher = if config.watch {
        watcher::start(&config.repo, sender)
    } else {
        None
    };
    info!("opening {}", config.repo.display());

    let mut view = GitView::new(config.options, external);
    let mut terminal = setup_terminal().context("failed to initialize terminal")?;
    let run_result = event_loop(&mut terminal, &mut view, &dispatcher, receiver);
    let restore_result = restore_terminal(terminal);
    shutdown(runtime);
    run_result.and(restore_result)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    view: &mut GitView,
    dispatcher: &Dispatcher,
    mut receiver: UnboundedReceiver<Msg>,
) -> Result<()> {
    let size = terminal.size().context("failed to read terminal size")?;
    view.update(Msg::Resize {
        width: usize::from(size.width),
        height: usize::from(size.height),
    });
    dispatcher.dispatch(view.init());

    let mut needs_redraw = true;
    let mut pending_refresh: Option<Instant> = None;
    loop {
        if needs_redraw {
            let text = view.view();
            terminal
                .draw(|f| f.render_widget(Paragraph::new(text), f.area()))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        if event::poll(POLL_RATE).context("failed to poll terminal events")? {
            loop {
                let msg = match event::read().context("failed to read terminal event")? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(Msg::Key(key)),
                    Event::Resize(width, height) => Some(Msg::Resize {
                        width: usize::from(width),
                        height: usize::from(height),
                    }),
                    _ => None,
                };
                if let Some(msg) = msg {
                    dispatcher.dispatch(view.update(msg));
                    needs_redraw = true;
                }
                if view.should_quit() {
                    return Ok(());
                }
                if !event::poll(Duration::from_millis(0))
                    .context("failed to poll queued terminal events")?
                {
                    break;
                }
            }
        }

        while let Ok(msg) = receiver.try_recv() {
            if matches!(msg, Msg::FilesChanged) {
                pending_refresh = Some(Instant::now());
                continue;
            }
            dispatcher.dispatch(view.update(msg));
            needs_redraw = true;
        }

        if let Some(since) = pending_refresh
            && since.elapsed() >= REFRESH_DEBOUNCE
        {
            pending_refresh = None;
            dispatcher.dispatch(view.update(Msg::FilesChanged));
        }
    }
}

/// Workers may still be inside a git call; do not wait for them.
fn shutdown(runtime: Runtime) {
    runtime.shutdown_background();
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")?;
    Ok(())
}
