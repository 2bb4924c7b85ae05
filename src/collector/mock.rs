//! Scripted telemetry source for tests and GPU-less development.
//!
//! Returns a fixed device set with deterministic per-poll variation, and can
//! inject poll failures to exercise the refresh loop's error handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    BackendError, DeviceSnapshot, ProcessEntry, Sample, SampleError, SystemInfo, TelemetrySource,
};

/// Telemetry source returning synthetic data.
pub struct MockSource {
    devices: Vec<DeviceSnapshot>,
    processes: Vec<ProcessEntry>,
    /// Number of upcoming polls that will fail.
    pending_failures: usize,
    /// Completed poll rounds, also used to vary synthetic load.
    polls: usize,
    animate: bool,
    shutdowns: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new(devices: Vec<DeviceSnapshot>) -> Self {
        Self {
            devices,
            processes: Vec::new(),
            pending_failures: 0,
            polls: 0,
            animate: false,
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Two plausible devices with drifting load, for `--backend mock`.
    pub fn typical_system() -> Self {
        let devices = vec![
            DeviceSnapshot {
                index: 0,
                name: "Mock GPU 0".to_string(),
                utilization: 35.0,
                memory_utilization: 20.0,
                memory_used: 3 * 1024 * 1024 * 1024,
                memory_total: 12 * 1024 * 1024 * 1024,
                temperature: 52.0,
                power_draw: 120.0,
                power_limit: 250.0,
                graphics_clock: 1410,
                memory_clock: 7000,
                fan_speed: 30.0,
            },
            DeviceSnapshot {
                index: 1,
                name: "Mock GPU 1".to_string(),
                utilization: 88.0,
                memory_utilization: 60.0,
                memory_used: 10 * 1024 * 1024 * 1024,
                memory_total: 12 * 1024 * 1024 * 1024,
                temperature: 74.0,
                power_draw: 230.0,
                power_limit: 250.0,
                graphics_clock: 1890,
                memory_clock: 7000,
                fan_speed: 65.0,
            },
        ];
        let processes = vec![
            ProcessEntry {
                device_index: 1,
                pid: 4321,
                name: "python3".to_string(),
                memory_used: 8 * 1024 * 1024 * 1024,
            },
            ProcessEntry {
                device_index: 0,
                pid: 990,
                name: "Xorg".to_string(),
                memory_used: 256 * 1024 * 1024,
            },
        ];

        let mut source = Self::new(devices);
        source.processes = processes;
        source.animate = true;
        source
    }

    pub fn with_processes(mut self, processes: Vec<ProcessEntry>) -> Self {
        self.processes = processes;
        self
    }

    /// Makes exactly the next `count` polls fail.
    pub fn fail_next_polls(mut self, count: usize) -> Self {
        self.pending_failures = count;
        self
    }

    /// Handle observing how many times `shutdown` has run.
    pub fn shutdown_probe(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.shutdowns)
    }

    /// Deterministic sawtooth so the mock dashboard visibly moves.
    fn drift(&self, base: f64) -> f64 {
        let step = (self.polls % 20) as f64;
        (base + step - 10.0).clamp(0.0, 100.0)
    }
}

impl TelemetrySource for MockSource {
    fn discover(&mut self) -> Result<usize, BackendError> {
        if self.devices.is_empty() {
            return Err(BackendError::NoDevices);
        }
        Ok(self.devices.len())
    }

    fn poll(&mut self) -> Result<Sample, SampleError> {
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(SampleError::Query("injected failure".to_string()));
        }

        let mut devices = self.devices.clone();
        if self.animate {
            for snap in &mut devices {
                snap.utilization = self.drift(snap.utilization);
                snap.temperature = self.drift(snap.temperature);
            }
        }
        self.polls += 1;

        Ok(Sample {
            devices,
            processes: self.processes.clone(),
        })
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            driver_version: "000.00".to_string(),
            cuda_version: None,
            device_count: self.devices.len(),
        }
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
