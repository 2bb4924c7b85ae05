//! Native backend: the vendor telemetry library via `nvml-wrapper`.
//!
//! The library context is initialized once at discovery and released exactly
//! once at shutdown. Dropping the context also releases it, so the library is
//! cleaned up even on abnormal exit paths.

use nvml_wrapper::Nvml;
use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
use nvml_wrapper::enums::device::UsedGpuMemory;
use tracing::{debug, warn};

use super::{
    BackendError, DeviceSnapshot, ProcessEntry, Sample, SampleError, SystemInfo, TelemetrySource,
    display_name,
};

/// Telemetry source backed by the native NVML bindings.
pub struct NvmlSource {
    nvml: Option<Nvml>,
    device_count: usize,
}

impl NvmlSource {
    pub fn new() -> Self {
        Self {
            nvml: None,
            device_count: 0,
        }
    }

    /// Process name for a PID, read the way the kernel reports it.
    /// Decode failure degrades to a placeholder rather than failing the poll.
    fn process_name(pid: u32) -> String {
        std::fs::read_to_string(format!("/proc/{}/comm", pid))
            .map(|s| display_name(s.trim()))
            .unwrap_or_else(|_| "Unknown".to_string())
    }
}

impl Default for NvmlSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for NvmlSource {
    fn discover(&mut self) -> Result<usize, BackendError> {
        if self.nvml.is_some() {
            return Ok(self.device_count);
        }

        let nvml = Nvml::init().map_err(|e| BackendError::Init(e.to_string()))?;
        let count = nvml
            .device_count()
            .map_err(|e| BackendError::Init(e.to_string()))? as usize;
        if count == 0 {
            return Err(BackendError::NoDevices);
        }

        debug!("NVML initialized, {} device(s)", count);
        self.device_count = count;
        self.nvml = Some(nvml);
        Ok(count)
    }

    fn poll(&mut self) -> Result<Sample, SampleError> {
        let nvml = self
            .nvml
            .as_ref()
            .ok_or_else(|| SampleError::Query("library not initialized".to_string()))?;

        let mut devices = Vec::with_capacity(self.device_count);
        let mut processes = Vec::new();

        for index in 0..self.device_count {
            let device = nvml
                .device_by_index(index as u32)
                .map_err(|e| SampleError::Query(format!("device {}: {}", index, e)))?;

            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            let util = device
                .utilization_rates()
                .map_err(|e| SampleError::Query(format!("device {} utilization: {}", index, e)))?;
            let mem = device
                .memory_info()
                .map_err(|e| SampleError::Query(format!("device {} memory: {}", index, e)))?;
            let temp = device
                .temperature(TemperatureSensor::Gpu)
                .map_err(|e| SampleError::Query(format!("device {} temperature: {}", index, e)))?;

            // Best-effort fields: zero when the device does not report them.
            let (power_draw, power_limit) =
                match (device.power_usage(), device.power_management_limit()) {
                    (Ok(draw), Ok(limit)) => (draw as f64 / 1000.0, limit as f64 / 1000.0),
                    _ => (0.0, 0.0),
                };
            let graphics_clock = device.clock_info(Clock::Graphics).unwrap_or(0);
            let memory_clock = device.clock_info(Clock::Memory).unwrap_or(0);
            let fan_speed = device.fan_speed(0).map(f64::from).unwrap_or(0.0);

            devices.push(DeviceSnapshot {
                index,
                name,
                utilization: f64::from(util.gpu),
                memory_utilization: f64::from(util.memory),
                memory_used: mem.used,
                memory_total: mem.total,
                temperature: f64::from(temp),
                power_draw,
                power_limit,
                graphics_clock,
                memory_clock,
                fan_speed,
            });

            match device.running_compute_processes() {
                Ok(procs) => {
                    for proc in procs {
                        let memory_used = match proc.used_gpu_memory {
                            UsedGpuMemory::Used(bytes) => bytes,
                            UsedGpuMemory::Unavailable => 0,
                        };
                        processes.push(ProcessEntry {
                            device_index: index,
                            pid: proc.pid,
                            name: Self::process_name(proc.pid),
                            memory_used,
                        });
                    }
                }
                Err(e) => {
                    // Process list is best-effort; the device row still renders.
                    warn!("device {} process list: {}", index, e);
                }
            }
        }

        Ok(Sample { devices, processes })
    }

    fn system_info(&self) -> SystemInfo {
        let Some(nvml) = self.nvml.as_ref() else {
            return SystemInfo::default();
        };

        let driver_version = nvml
            .sys_driver_version()
            .unwrap_or_else(|_| "Unknown".to_string());
        let cuda_version = nvml
            .sys_cuda_driver_version()
            .ok()
            .map(|v| format!("{}.{}", v / 1000, (v % 1000) / 10));

        SystemInfo {
            driver_version,
            cuda_version,
            device_count: self.device_count,
        }
    }

    fn shutdown(&mut self) {
        if self.nvml.take().is_some() {
            debug!("NVML released");
        }
    }

    fn backend_name(&self) -> &'static str {
        "nvml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_before_discover_is_a_sample_error() {
        let mut source = NvmlSource::new();
        assert!(matches!(source.poll(), Err(SampleError::Query(_))));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut source = NvmlSource::new();
        source.shutdown();
        source.shutdown();
    }

    #[test]
    fn system_info_is_empty_before_discover() {
        let source = NvmlSource::new();
        let info = source.system_info();
        assert_eq!(info.device_count, 0);
        assert!(info.cuda_version.is_none());
    }
}
