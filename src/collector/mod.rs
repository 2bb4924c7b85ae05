//! Telemetry acquisition layer.
//!
//! The [`TelemetrySource`] trait abstracts over the two concrete backends
//! (the native NVML bindings and the `nvidia-smi` query tool) so the refresh
//! loop never branches on which one is active. Both backends return the same
//! structured snapshot per device plus a process list.

pub mod mock;
pub mod nvml;
pub mod smi;

pub use mock::MockSource;
pub use nvml::NvmlSource;
pub use smi::SmiSource;

use std::time::Duration;

/// Metrics for a single device from one poll round.
///
/// Built once per poll and never mutated afterwards. Optional metrics the
/// device does not report (power, clocks, fan) carry a zero sentinel instead
/// of failing the round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    /// Stable zero-based ordinal assigned by backend enumeration order.
    pub index: usize,
    pub name: String,
    /// GPU engine utilization, 0-100.
    pub utilization: f64,
    /// Memory controller utilization, 0-100.
    pub memory_utilization: f64,
    /// Framebuffer memory used, bytes.
    pub memory_used: u64,
    /// Framebuffer memory total, bytes.
    pub memory_total: u64,
    /// Core temperature, degrees Celsius.
    pub temperature: f64,
    /// Power draw in watts, 0 when unknown.
    pub power_draw: f64,
    /// Power limit in watts, 0 when unknown.
    pub power_limit: f64,
    /// Graphics clock, MHz.
    pub graphics_clock: u32,
    /// Memory clock, MHz.
    pub memory_clock: u32,
    /// Fan speed percentage; 0 also means "not reported" on some devices.
    pub fan_speed: f64,
}

impl DeviceSnapshot {
    /// Memory usage as a percentage of total; 0 when the total is unknown.
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total == 0 {
            0.0
        } else {
            self.memory_used as f64 / self.memory_total as f64 * 100.0
        }
    }

    /// Power draw as a percentage of the limit; 0 when the limit is unknown.
    pub fn power_percent(&self) -> f64 {
        if self.power_limit <= 0.0 {
            0.0
        } else {
            self.power_draw / self.power_limit * 100.0
        }
    }
}

/// One process currently using a device. Rebuilt every poll; rows carry no
/// identity across polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub device_index: usize,
    pub pid: u32,
    /// Final path component of the reported executable path.
    pub name: String,
    /// Device memory used by this process, bytes.
    pub memory_used: u64,
}

/// Static session metadata, best-effort.
#[derive(Debug, Clone, Default)]
pub struct SystemInfo {
    pub driver_version: String,
    /// Reported by the native backend only.
    pub cuda_version: Option<String>,
    pub device_count: usize,
}

/// One poll round: snapshots in device index order plus the process list.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub devices: Vec<DeviceSnapshot>,
    pub processes: Vec<ProcessEntry>,
}

/// Fatal startup failure: the backend cannot enumerate any device.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Native library missing or failed to initialize.
    Init(String),
    /// Query tool missing, not executable, or unusable.
    Tool(String),
    /// Backend initialized but reported zero devices.
    NoDevices,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Init(msg) => write!(f, "telemetry library unavailable: {}", msg),
            BackendError::Tool(msg) => write!(f, "query tool unavailable: {}", msg),
            BackendError::NoDevices => write!(f, "no devices detected"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Recoverable failure of a single poll round. The refresh loop shows it
/// inline for one cycle and keeps going.
#[derive(Debug, Clone)]
pub enum SampleError {
    /// Native API call failed.
    Query(String),
    /// Subprocess could not be launched or exited non-zero.
    Subprocess(String),
    /// Subprocess did not finish within the per-call timeout.
    Timeout(Duration),
    /// Output contained no usable device data.
    Parse(String),
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Query(msg) => write!(f, "query failed: {}", msg),
            SampleError::Subprocess(msg) => write!(f, "subprocess failed: {}", msg),
            SampleError::Timeout(d) => write!(f, "query timed out after {:.0?}", d),
            SampleError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for SampleError {}

/// A concrete telemetry acquisition strategy.
///
/// The device count returned by `discover` is fixed for the process lifetime;
/// hot-plug is not handled. `poll` must be safe to call repeatedly and must
/// not fail for partial data - per-field unavailability is absorbed at the
/// point of acquisition.
pub trait TelemetrySource {
    /// Enumerates devices. Called once at session start; idempotent.
    fn discover(&mut self) -> Result<usize, BackendError>;

    /// Collects one snapshot for every visible device plus the process list.
    fn poll(&mut self) -> Result<Sample, SampleError>;

    /// Static metadata for the system panel, best-effort.
    fn system_info(&self) -> SystemInfo;

    /// Releases backend resources. Idempotent; errors are swallowed.
    fn shutdown(&mut self);

    /// Short name shown in the system panel.
    fn backend_name(&self) -> &'static str;
}

/// Final path component of a reported executable path.
///
/// The query tool reports Windows-style paths on Windows hosts, so both
/// separators are honored.
pub(crate) fn display_name(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_percent_handles_unknown_total() {
        let snap = DeviceSnapshot {
            memory_used: 1024,
            memory_total: 0,
            ..DeviceSnapshot::default()
        };
        assert_eq!(snap.memory_percent(), 0.0);

        let snap = DeviceSnapshot {
            memory_used: 512,
            memory_total: 1024,
            ..DeviceSnapshot::default()
        };
        assert_eq!(snap.memory_percent(), 50.0);
    }

    #[test]
    fn power_percent_handles_unknown_limit() {
        let snap = DeviceSnapshot {
            power_draw: 120.0,
            power_limit: 0.0,
            ..DeviceSnapshot::default()
        };
        assert_eq!(snap.power_percent(), 0.0);

        let snap = DeviceSnapshot {
            power_draw: 150.0,
            power_limit: 300.0,
            ..DeviceSnapshot::default()
        };
        assert_eq!(snap.power_percent(), 50.0);
    }

    #[test]
    fn display_name_strips_both_separator_styles() {
        assert_eq!(display_name("/usr/bin/python3"), "python3");
        assert_eq!(display_name("C:\\Games\\game.exe"), "game.exe");
        assert_eq!(display_name("bare"), "bare");
    }
}
