use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::BaseDirs;
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::config::Config;
use crate::export::save_records;
use crate::items::ItemSet;
use crate::tracker::{Navigation, SessionTracker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Help,
    /// typing a path to load; holds the input so far
    Load(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Next,
    Prev,
    ToggleRun,
    ClearRecords,
    ClearFiles,
    OpenLoadPrompt,
    PromptInput(char),
    PromptBackspace,
    CancelPrompt,
    LoadBatch(String),
    Export,
    OpenInViewer,
    ToggleHelp,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub mode: Mode,
    pub status: Option<String>,
    pub should_quit: bool,
    tracker: SessionTracker,
    dims: Option<(PathBuf, Option<(u32, u32)>)>,
}

impl App {
    pub fn new(items: ItemSet, config: Config, now: SystemTime) -> Self {
        let tracker = SessionTracker::new(items, config.initial_run_state(), config.session_clock);
        let mut app = Self {
            config,
            mode: Mode::Browse,
            status: None,
            should_quit: false,
            tracker,
            dims: None,
        };
        app.settle(now);
        app
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn current_dimensions(&self) -> Option<(u32, u32)> {
        self.dims.as_ref().and_then(|(_, dims)| *dims)
    }

    pub fn action_for_key(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        match &self.mode {
            Mode::Load(input) => match key.code {
                KeyCode::Esc => Some(Action::CancelPrompt),
                KeyCode::Enter => Some(Action::LoadBatch(input.clone())),
                KeyCode::Backspace => Some(Action::PromptBackspace),
                KeyCode::Char(c) => Some(Action::PromptInput(c)),
                _ => None,
            },
            Mode::Help => match key.code {
                KeyCode::Char('q') => Some(Action::Quit),
                _ => Some(Action::ToggleHelp),
            },
            Mode::Browse => match key.code {
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => Some(Action::Next),
                KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => Some(Action::Prev),
                KeyCode::Char(' ') => Some(Action::ToggleRun),
                KeyCode::Char('c') => Some(Action::ClearRecords),
                KeyCode::Char('x') => Some(Action::ClearFiles),
                KeyCode::Char('u') => Some(Action::OpenLoadPrompt),
                KeyCode::Char('e') => Some(Action::Export),
                KeyCode::Char('o') => Some(Action::OpenInViewer),
                KeyCode::Char('?') => Some(Action::ToggleHelp),
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: SystemTime) {
        if let Some(action) = self.action_for_key(key) {
            self.apply(action, now);
        }
    }

    pub fn apply(&mut self, action: Action, now: SystemTime) {
        match action {
            Action::Next => self.navigate(1, now),
            Action::Prev => self.navigate(-1, now),
            Action::ToggleRun => {
                let next = self.tracker.run_state().flipped();
                self.tracker.toggle_run(next, now);
                self.status = None;
            }
            Action::ClearRecords => {
                self.tracker.reset_records();
                self.status = Some("records cleared".to_string());
                info!("records cleared");
            }
            Action::ClearFiles => {
                self.tracker.clear_items(self.config.clear_files, now);
                self.status = Some("files cleared".to_string());
                info!(policy = %self.config.clear_files, "files cleared");
            }
            Action::OpenLoadPrompt => {
                self.mode = Mode::Load(String::new());
                self.status = None;
            }
            Action::PromptInput(c) => {
                if let Mode::Load(input) = &mut self.mode {
                    input.push(c);
                }
            }
            Action::PromptBackspace => {
                if let Mode::Load(input) = &mut self.mode {
                    input.pop();
                }
            }
            Action::CancelPrompt => {
                self.mode = Mode::Browse;
                self.status = None;
            }
            Action::LoadBatch(input) => self.load_batch(&input, now),
            Action::Export => self.export(now),
            Action::OpenInViewer => self.open_in_viewer(),
            Action::ToggleHelp => {
                self.mode = match self.mode {
                    Mode::Help => Mode::Browse,
                    _ => Mode::Help,
                };
            }
            Action::Quit => {
                self.tracker.finish(now);
                self.should_quit = true;
            }
        }

        if !self.should_quit {
            self.settle(now);
        }
    }

    /// Per-interaction bookkeeping: keep the index valid and start timing the shown item.
    fn settle(&mut self, now: SystemTime) {
        self.tracker.clamp_index();
        if self.tracker.current_item().is_some() {
            self.tracker.begin_segment_if_running(now);
        }
        self.refresh_dimensions();
    }

    fn refresh_dimensions(&mut self) {
        let Some(item) = self.tracker.current_item() else {
            self.dims = None;
            return;
        };
        let stale = self
            .dims
            .as_ref()
            .map_or(true, |(path, _)| path.as_path() != item.path());
        if stale {
            self.dims = Some((item.path().to_path_buf(), item.dimensions()));
        }
    }

    fn navigate(&mut self, delta: isize, now: SystemTime) {
        self.status = match self.tracker.navigate(delta, now) {
            Navigation::Moved { .. } => None,
            Navigation::Rejected if self.tracker.items().is_empty() => {
                Some("no images loaded".to_string())
            }
            Navigation::Rejected if delta < 0 => Some("already at the first image".to_string()),
            Navigation::Rejected => Some("already at the last image".to_string()),
        };
    }

    fn load_batch(&mut self, input: &str, now: SystemTime) {
        let input = input.trim();
        if input.is_empty() {
            self.status = Some("enter a file or directory path".to_string());
            return;
        }

        let path = expand_home(input);
        match ItemSet::from_paths(&[&path], &self.config.load_options()) {
            Ok(items) => {
                let count = items.len();
                self.tracker.replace_items(items, now);
                self.mode = Mode::Browse;
                self.status = Some(format!("loaded {count} images"));
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "load failed");
                self.status = Some(err.to_string());
            }
        }
    }

    fn export(&mut self, now: SystemTime) {
        let Some(dir) = self.config.export_dir() else {
            self.status = Some("no export directory available".to_string());
            return;
        };
        let path = dir.join(AppDirs::export_file_name(DateTime::<Local>::from(now)));
        let records = self.tracker.snapshot(now);
        let total = self.tracker.display_session_elapsed(now);

        self.status = match save_records(&path, &records, total) {
            Ok(()) => {
                info!(path = %path.display(), rows = records.len(), "exported records");
                Some(format!("exported to {}", path.display()))
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "export failed");
                Some(format!("export failed: {err}"))
            }
        };
    }

    fn open_in_viewer(&mut self) {
        let Some(item) = self.tracker.current_item() else {
            self.status = Some("no images loaded".to_string());
            return;
        };
        let path = item
            .path()
            .canonicalize()
            .unwrap_or_else(|_| item.path().to_path_buf());
        let target = format!("file://{}", path.display());

        self.status = match webbrowser::open(&target) {
            Ok(()) => None,
            Err(err) => {
                warn!(%target, %err, "could not open viewer");
                Some(format!("could not open viewer: {err}"))
            }
        };
    }
}

fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    Path::new(input).to_path_buf()
}
