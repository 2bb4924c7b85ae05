//! Main TUI application: the sampling and refresh loop.
//!
//! The loop owns the whole lifecycle: it discovers devices once at startup,
//! then repeats {poll -> record history -> compose -> draw} on a fixed
//! period until a stop is requested, and releases the backend exactly once
//! on the way out. Polling, history mutation and rendering run strictly
//! sequentially within one cycle; the only input from outside is the event
//! stream.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, warn};

use crate::collector::{BackendError, TelemetrySource};
use crate::history::HistoryStore;

use super::event::{Event, EventHandler};
use super::input::{KeyAction, handle_key};
use super::render::render;
use super::state::AppState;

/// Refresh loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Initializing,
    Running,
    Draining,
    Stopped,
}

/// Error terminating a session.
#[derive(Debug)]
pub enum AppError {
    /// Device discovery failed; no partial UI is shown.
    Backend(BackendError),
    /// Terminal I/O failed.
    Io(io::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Backend(e) => write!(f, "{}", e),
            AppError::Io(e) => write!(f, "terminal error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e)
    }
}

/// Main TUI application.
pub struct App {
    source: Box<dyn TelemetrySource>,
    state: AppState,
    history_capacity: usize,
    loop_state: LoopState,
}

impl App {
    /// Creates a new App over the given telemetry source.
    pub fn new(source: Box<dyn TelemetrySource>, history_capacity: usize) -> Self {
        let backend = source.backend_name();
        Self {
            source,
            state: AppState::new(backend),
            history_capacity,
            loop_state: LoopState::Initializing,
        }
    }

    /// Runs the dashboard until quit. Returns `AppError::Backend` when no
    /// device can be enumerated at startup.
    pub fn run(mut self, period: Duration) -> Result<(), AppError> {
        self.initialize().map_err(AppError::Backend)?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let events = EventHandler::new(period);

        // First cycle before the first tick so the screen is never empty.
        self.cycle();

        while self.loop_state == LoopState::Running {
            terminal.draw(|frame| render(frame, &self.state))?;

            match events.next() {
                Ok(Event::Tick) => self.cycle(),
                Ok(Event::Key(key)) => match handle_key(key) {
                    KeyAction::Quit => self.loop_state = LoopState::Draining,
                    // Extra cycle now; the periodic phase is untouched.
                    KeyAction::Refresh => self.cycle(),
                    KeyAction::None => {}
                },
                Ok(Event::Resize) => {}
                Err(_) => self.loop_state = LoopState::Draining,
            }
        }

        self.drain();

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Discovers devices and sizes the history store. Without at least one
    /// device there is nothing to render and the session must not start.
    fn initialize(&mut self) -> Result<usize, BackendError> {
        let count = self.source.discover()?;
        debug!("discovered {} device(s)", count);

        self.state.history = HistoryStore::new(count, self.history_capacity);
        self.state.system = self.source.system_info();
        self.loop_state = LoopState::Running;
        Ok(count)
    }

    /// One sampling cycle: poll, record history, refresh the view state.
    ///
    /// A failed poll surfaces as an inline error for this cycle only; the
    /// previous device data stays on screen underneath the next cycle.
    fn cycle(&mut self) {
        match self.source.poll() {
            Ok(mut sample) => {
                sample.devices.sort_by_key(|snapshot| snapshot.index);
                for snapshot in &sample.devices {
                    self.state.history.record(
                        snapshot.index,
                        snapshot.utilization,
                        snapshot.memory_percent(),
                        snapshot.temperature,
                    );
                }
                self.state.devices = sample.devices;
                self.state.processes = sample.processes;
                self.state.updated = Some(Local::now());
                self.state.cycle_error = None;
            }
            Err(e) => {
                warn!("poll failed: {}", e);
                self.state.cycle_error = Some(e.to_string());
            }
        }
    }

    /// One best-effort backend release, then the loop is done for good.
    fn drain(&mut self) {
        if self.loop_state == LoopState::Stopped {
            return;
        }
        self.loop_state = LoopState::Draining;
        self.source.shutdown();
        self.loop_state = LoopState::Stopped;
    }
}
