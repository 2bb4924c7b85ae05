//! Bounded rolling history feeding the trend sparklines.
//!
//! Each device owns three fixed-capacity ring buffers (utilization, memory
//! percent, temperature). Buffers are created at device discovery, appended
//! to every poll, and discarded only at process exit - there is no device
//! hot-remove handling and no persistence across runs.

use std::collections::VecDeque;

/// Default ring capacity. At the default 0.5s cycle this covers 30 seconds
/// of trend, enough to see a spike-and-recover pattern.
pub const DEFAULT_CAPACITY: usize = 60;

/// Fixed-capacity FIFO ring of numeric samples, oldest first.
///
/// Pre-filled with zeros at creation so a freshly discovered device renders
/// a full-width flat trend instead of a growing one.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl MetricSeries {
    fn new(capacity: usize) -> Self {
        let mut samples = VecDeque::with_capacity(capacity);
        samples.extend(std::iter::repeat(0.0).take(capacity));
        Self { samples, capacity }
    }

    /// Appends one sample, evicting the oldest when the ring is full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Current contents, oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest sample currently in the ring; 0 for an all-zero series.
    pub fn max(&self) -> f64 {
        self.samples.iter().copied().fold(0.0, f64::max)
    }
}

/// The three metric series tracked per device.
#[derive(Debug, Clone)]
pub struct DeviceSeries {
    pub utilization: MetricSeries,
    pub memory: MetricSeries,
    pub temperature: MetricSeries,
}

impl DeviceSeries {
    fn new(capacity: usize) -> Self {
        Self {
            utilization: MetricSeries::new(capacity),
            memory: MetricSeries::new(capacity),
            temperature: MetricSeries::new(capacity),
        }
    }
}

/// Per-device rolling history for the whole session.
///
/// The number of series triples equals the device count determined at
/// startup and never changes afterwards.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    devices: Vec<DeviceSeries>,
    capacity: usize,
}

impl HistoryStore {
    /// Creates one series triple per device, all rings sharing `capacity`.
    pub fn new(device_count: usize, capacity: usize) -> Self {
        Self {
            devices: (0..device_count).map(|_| DeviceSeries::new(capacity)).collect(),
            capacity,
        }
    }

    /// Appends one sample to each of the device's three series. Samples for
    /// indices outside the discovered range are dropped.
    pub fn record(&mut self, device: usize, utilization: f64, memory_percent: f64, temperature: f64) {
        if let Some(series) = self.devices.get_mut(device) {
            series.utilization.push(utilization);
            series.memory.push(memory_percent);
            series.temperature.push(temperature);
        }
    }

    pub fn device(&self, index: usize) -> Option<&DeviceSeries> {
        self.devices.get(index)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_never_exceeds_capacity() {
        let mut series = MetricSeries::new(5);
        for i in 0..100 {
            series.push(i as f64);
            assert!(series.len() <= 5);
        }
    }

    #[test]
    fn series_keeps_most_recent_values_in_order() {
        let mut series = MetricSeries::new(4);
        for i in 0..10 {
            series.push(i as f64);
        }
        let values: Vec<f64> = series.iter().collect();
        assert_eq!(values, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn series_starts_zero_filled() {
        let series = MetricSeries::new(3);
        assert_eq!(series.len(), 3);
        assert_eq!(series.max(), 0.0);
        assert!(series.iter().all(|v| v == 0.0));
    }

    #[test]
    fn record_appends_to_all_three_series() {
        let mut store = HistoryStore::new(2, 4);
        store.record(1, 75.0, 40.0, 68.0);

        let series = store.device(1).expect("device 1 exists");
        assert_eq!(series.utilization.iter().last(), Some(75.0));
        assert_eq!(series.memory.iter().last(), Some(40.0));
        assert_eq!(series.temperature.iter().last(), Some(68.0));

        // Device 0 untouched.
        let other = store.device(0).expect("device 0 exists");
        assert_eq!(other.utilization.max(), 0.0);
    }

    #[test]
    fn record_ignores_unknown_device() {
        let mut store = HistoryStore::new(1, 4);
        store.record(7, 99.0, 99.0, 99.0);
        assert_eq!(store.device_count(), 1);
        assert!(store.device(7).is_none());
    }

    #[test]
    fn store_tracks_fixed_device_count() {
        let store = HistoryStore::new(3, DEFAULT_CAPACITY);
        assert_eq!(store.device_count(), 3);
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
        assert!(store.device(2).is_some());
        assert!(store.device(3).is_none());
    }
}
