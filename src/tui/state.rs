//! Shared view state for the dashboard.

use chrono::{DateTime, Local};

use crate::collector::{DeviceSnapshot, ProcessEntry, SystemInfo};
use crate::history::{DEFAULT_CAPACITY, HistoryStore};

/// Everything the renderer needs for one frame. Rebuilt fields are replaced
/// wholesale each cycle; nothing is mutated in place across cycles.
pub struct AppState {
    /// Latest snapshots, device index ascending.
    pub devices: Vec<DeviceSnapshot>,
    /// Latest process list, backend order.
    pub processes: Vec<ProcessEntry>,
    pub system: SystemInfo,
    /// Backend name shown in the system panel.
    pub backend: &'static str,
    /// Wall-clock time of the last successful cycle.
    pub updated: Option<DateTime<Local>>,
    /// Inline error from the current cycle, cleared on the next success.
    pub cycle_error: Option<String>,
    pub history: HistoryStore,
}

impl AppState {
    pub fn new(backend: &'static str) -> Self {
        Self {
            devices: Vec::new(),
            processes: Vec::new(),
            system: SystemInfo::default(),
            backend,
            updated: None,
            cycle_error: None,
            history: HistoryStore::new(0, DEFAULT_CAPACITY),
        }
    }
}
