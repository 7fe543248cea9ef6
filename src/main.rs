use std::{
    io::{self, stdin},
    path::PathBuf,
    time::SystemTime,
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use sketchtimer::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    format::{format_clock, format_hms},
    items::ItemSet,
    logging,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    tracker::{ClearFilesPolicy, SessionClock},
    ui,
};

/// terminal sketch practice timer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Browse a batch of reference images one at a time while the timer tracks how long you spend on each, with pause/resume and a running session total."
)]
pub struct Cli {
    /// image files or folders to practice with (jpg, jpeg, png)
    paths: Vec<PathBuf>,

    /// descend into sub-folders when loading folders
    #[clap(short = 'r', long)]
    recursive: bool,

    /// shuffle the loaded images
    #[clap(long)]
    shuffle: bool,

    /// start with the timer paused
    #[clap(long)]
    paused: bool,

    /// redraw interval of the live counters, in milliseconds
    #[clap(long)]
    tick_ms: Option<u64>,

    /// how the session total is measured
    #[clap(long, value_enum)]
    session_clock: Option<SessionClock>,

    /// what clearing the images does to the recorded times
    #[clap(long, value_enum)]
    clear_files: Option<ClearFilesPolicy>,

    /// store the resulting settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags given on the command line win over the stored config
    fn apply_to(&self, mut config: Config) -> Config {
        if self.recursive {
            config.recursive = true;
        }
        if self.shuffle {
            config.shuffle = true;
        }
        if self.paused {
            config.start_running = false;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(clock) = self.session_clock {
            config.session_clock = clock;
        }
        if let Some(policy) = self.clear_files {
            config.clear_files = policy;
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        // logging is best effort; the timer works without it
        let _ = logging::init(&log_path);
    }

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
        info!(path = %store.path().display(), "saved config");
    }

    let items = if cli.paths.is_empty() {
        ItemSet::default()
    } else {
        ItemSet::from_paths(cli.paths.as_slice(), &config.load_options())
            .context("loading images")?
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let ticker = FixedTicker::from_millis(config.tick_ms);
    let mut app = App::new(items, config, SystemTime::now());

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), ticker);
    let result = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        warn!(%err, "exited with error");
    }
    result?;

    print_summary(&app);
    Ok(())
}

fn run_app<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app, SystemTime::now()))?;

        match runner.step() {
            AppEvent::Tick | AppEvent::Resize => {}
            AppEvent::Key(key) => app.handle_key(key, SystemTime::now()),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_summary(app: &App) {
    let tracker = app.tracker();
    if tracker.records().is_empty() {
        return;
    }
    if let Some(total) = tracker.display_session_elapsed(SystemTime::now()) {
        println!("session {}", format_hms(total));
    }
    for (name, secs) in tracker.records().iter() {
        println!("{:>9}  {name}", format_clock(secs));
    }
}
