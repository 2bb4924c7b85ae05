//! Subprocess backend: shells out to the vendor query tool (`nvidia-smi`).
//!
//! One invocation per poll requests every device field in a single
//! comma-separated batch, so poll latency stays bounded and independent of
//! device count. A second invocation fetches the process list. Each
//! invocation carries a hard timeout so one stuck call cannot wedge the
//! refresh loop.

use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{
    BackendError, DeviceSnapshot, ProcessEntry, Sample, SampleError, SystemInfo, TelemetrySource,
    display_name,
};

/// Device fields requested from the query tool, in output order.
const DEVICE_FIELDS: &str = "index,name,utilization.gpu,utilization.memory,memory.used,\
memory.total,temperature.gpu,power.draw,power.limit,clocks.gr,clocks.mem,fan.speed";
const DEVICE_FIELD_COUNT: usize = 12;

/// Process fields requested from the query tool, in output order.
const PROCESS_FIELDS: &str = "gpu_uuid,pid,process_name,used_memory";
const PROCESS_FIELD_COUNT: usize = 4;

/// Per-invocation deadline.
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);
/// Child poll interval while waiting for exit.
const WAIT_STEP: Duration = Duration::from_millis(10);

const MIB: u64 = 1024 * 1024;

/// Telemetry source backed by the vendor command-line query tool.
pub struct SmiSource {
    program: String,
    /// UUID to device index, captured at discovery. Process rows are keyed
    /// by UUID and mapped through this table.
    uuid_index: HashMap<String, usize>,
    device_count: usize,
    driver_version: String,
}

impl SmiSource {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            uuid_index: HashMap::new(),
            device_count: 0,
            driver_version: "Unknown".to_string(),
        }
    }

    /// Runs one query invocation and returns its stdout, killing the child
    /// if it outlives the deadline.
    fn run_query(&self, args: &[&str]) -> Result<String, SampleError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SampleError::Subprocess(format!("{}: {}", self.program, e)))?;

        let deadline = Instant::now() + QUERY_TIMEOUT;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut out = String::new();
                    if let Some(mut stdout) = child.stdout.take() {
                        stdout
                            .read_to_string(&mut out)
                            .map_err(|e| SampleError::Subprocess(e.to_string()))?;
                    }
                    if !status.success() {
                        return Err(SampleError::Subprocess(format!(
                            "{} exited with {}",
                            self.program, status
                        )));
                    }
                    return Ok(out);
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SampleError::Timeout(QUERY_TIMEOUT));
                    }
                    thread::sleep(WAIT_STEP);
                }
                Err(e) => return Err(SampleError::Subprocess(e.to_string())),
            }
        }
    }

    fn query_processes(&self) -> Result<Vec<ProcessEntry>, SampleError> {
        let query = format!("--query-compute-apps={}", PROCESS_FIELDS);
        let out = self.run_query(&[query.as_str(), "--format=csv,noheader,nounits"])?;

        let mut processes = Vec::new();
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            let Some(entry) = parse_process_line(line, &self.uuid_index) else {
                warn!("skipping unparseable process line: {}", line);
                continue;
            };
            processes.push(entry);
        }
        Ok(processes)
    }
}

impl TelemetrySource for SmiSource {
    fn discover(&mut self) -> Result<usize, BackendError> {
        if !self.uuid_index.is_empty() {
            return Ok(self.device_count);
        }

        let out = self
            .run_query(&["--query-gpu=index,uuid", "--format=csv,noheader"])
            .map_err(|e| BackendError::Tool(e.to_string()))?;

        let mut uuid_index = HashMap::new();
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            let mut parts = line.split(',').map(str::trim);
            let index = parts.next().and_then(|p| p.parse::<usize>().ok());
            let uuid = parts.next();
            if let (Some(index), Some(uuid)) = (index, uuid) {
                uuid_index.insert(uuid.to_string(), index);
            }
        }
        if uuid_index.is_empty() {
            return Err(BackendError::NoDevices);
        }

        // Driver version is static for the session; fetch it once.
        if let Ok(out) = self.run_query(&["--query-gpu=driver_version", "--format=csv,noheader"])
            && let Some(first) = out.lines().find(|l| !l.trim().is_empty())
        {
            self.driver_version = first.trim().to_string();
        }

        debug!("query tool found {} device(s)", uuid_index.len());
        self.device_count = uuid_index.len();
        self.uuid_index = uuid_index;
        Ok(self.device_count)
    }

    fn poll(&mut self) -> Result<Sample, SampleError> {
        let query = format!("--query-gpu={}", DEVICE_FIELDS);
        let out = self.run_query(&[query.as_str(), "--format=csv,noheader,nounits"])?;

        let mut devices: Vec<DeviceSnapshot> = out
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|line| {
                let parsed = parse_device_line(line);
                if parsed.is_none() {
                    warn!("skipping malformed device line: {}", line);
                }
                parsed
            })
            .collect();
        if devices.is_empty() {
            return Err(SampleError::Parse("no device lines in query output".to_string()));
        }
        devices.sort_by_key(|d| d.index);

        // The process list degrades to empty rather than failing the round.
        let processes = match self.query_processes() {
            Ok(p) => p,
            Err(e) => {
                debug!("process query failed: {}", e);
                Vec::new()
            }
        };

        Ok(Sample { devices, processes })
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            driver_version: self.driver_version.clone(),
            cuda_version: None,
            device_count: self.device_count,
        }
    }

    fn shutdown(&mut self) {
        // Nothing held between invocations.
    }

    fn backend_name(&self) -> &'static str {
        "nvidia-smi"
    }
}

/// Parses one numeric field, mapping the tool's `[N/A]`-style sentinels
/// (and anything else unparseable) to zero.
fn numeric_field(raw: &str) -> f64 {
    if raw.is_empty() || raw.starts_with('[') || raw == "N/A" {
        return 0.0;
    }
    raw.parse().unwrap_or(0.0)
}

/// Parses one device line of `csv,noheader,nounits` output.
///
/// A field-count mismatch is a recoverable failure for that line only.
/// Memory fields arrive in MiB and are converted to bytes.
fn parse_device_line(line: &str) -> Option<DeviceSnapshot> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < DEVICE_FIELD_COUNT {
        return None;
    }

    Some(DeviceSnapshot {
        index: parts[0].parse().ok()?,
        name: parts[1].to_string(),
        utilization: numeric_field(parts[2]),
        memory_utilization: numeric_field(parts[3]),
        memory_used: numeric_field(parts[4]) as u64 * MIB,
        memory_total: numeric_field(parts[5]) as u64 * MIB,
        temperature: numeric_field(parts[6]),
        power_draw: numeric_field(parts[7]),
        power_limit: numeric_field(parts[8]),
        graphics_clock: numeric_field(parts[9]) as u32,
        memory_clock: numeric_field(parts[10]) as u32,
        fan_speed: numeric_field(parts[11]),
    })
}

/// Parses one process line. The process name sits between fixed head fields
/// (uuid, pid) and the trailing memory field, so embedded commas in the
/// executable path are rejoined rather than truncated.
fn parse_process_line(line: &str, uuid_index: &HashMap<String, usize>) -> Option<ProcessEntry> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < PROCESS_FIELD_COUNT {
        return None;
    }

    let device_index = *uuid_index.get(parts[0].trim())?;
    let pid = parts[1].trim().parse().ok()?;
    // Middle fields are rejoined untrimmed so spacing inside the path
    // survives; only the outer edges are trimmed.
    let name = display_name(parts[2..parts.len() - 1].join(",").trim());
    let memory_used = numeric_field(parts[parts.len() - 1].trim()) as u64 * MIB;

    Some(ProcessEntry {
        device_index,
        pid,
        name,
        memory_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid_table() -> HashMap<String, usize> {
        HashMap::from([("GPU-aaaa".to_string(), 0), ("GPU-bbbb".to_string(), 1)])
    }

    #[test]
    fn parses_full_device_line() {
        let line = "0, NVIDIA GeForce RTX 3080, 72, 41, 4096, 10240, 67, 210.5, 320.0, 1710, 9501, 55";
        let snap = parse_device_line(line).expect("line parses");

        assert_eq!(snap.index, 0);
        assert_eq!(snap.name, "NVIDIA GeForce RTX 3080");
        assert_eq!(snap.utilization, 72.0);
        assert_eq!(snap.memory_utilization, 41.0);
        assert_eq!(snap.memory_used, 4096 * MIB);
        assert_eq!(snap.memory_total, 10240 * MIB);
        assert_eq!(snap.temperature, 67.0);
        assert_eq!(snap.power_draw, 210.5);
        assert_eq!(snap.power_limit, 320.0);
        assert_eq!(snap.graphics_clock, 1710);
        assert_eq!(snap.memory_clock, 9501);
        assert_eq!(snap.fan_speed, 55.0);
    }

    #[test]
    fn sentinels_map_to_zero() {
        let line = "1, Tesla T4, 5, 2, 100, 15360, 40, [N/A], [N/A], 585, 5001, [Unknown Error]";
        let snap = parse_device_line(line).expect("line parses");

        assert_eq!(snap.power_draw, 0.0);
        assert_eq!(snap.power_limit, 0.0);
        assert_eq!(snap.fan_speed, 0.0);
    }

    #[test]
    fn short_device_line_is_skipped_not_fatal() {
        assert!(parse_device_line("0, Broken GPU, 10").is_none());
        assert!(parse_device_line("").is_none());
    }

    #[test]
    fn non_numeric_index_is_skipped() {
        let line = "x, GPU, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10";
        assert!(parse_device_line(line).is_none());
    }

    #[test]
    fn numeric_field_sentinels() {
        assert_eq!(numeric_field("[N/A]"), 0.0);
        assert_eq!(numeric_field("[Unknown Error]"), 0.0);
        assert_eq!(numeric_field("N/A"), 0.0);
        assert_eq!(numeric_field(""), 0.0);
        assert_eq!(numeric_field("42.5"), 42.5);
    }

    #[test]
    fn process_line_maps_uuid_and_strips_path() {
        let line = "GPU-bbbb, 4242, /usr/bin/python3, 1024";
        let entry = parse_process_line(line, &uuid_table()).expect("line parses");

        assert_eq!(entry.device_index, 1);
        assert_eq!(entry.pid, 4242);
        assert_eq!(entry.name, "python3");
        assert_eq!(entry.memory_used, 1024 * MIB);
    }

    #[test]
    fn process_line_with_unknown_uuid_is_skipped() {
        let line = "GPU-cccc, 1, proc, 10";
        assert!(parse_process_line(line, &uuid_table()).is_none());
    }

    #[test]
    fn process_name_with_embedded_comma_survives() {
        let line = "GPU-aaaa, 7, C:\\Apps\\odd, name.exe, 256";
        let entry = parse_process_line(line, &uuid_table()).expect("line parses");
        assert_eq!(entry.name, "odd, name.exe");
        assert_eq!(entry.memory_used, 256 * MIB);
    }
}
