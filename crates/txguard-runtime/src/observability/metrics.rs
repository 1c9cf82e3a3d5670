//! Assessment metrics
//!
//! In-process counters and latency histograms for the scoring path. Names:
//! - `assessments_total`
//! - `decisions_approve`, `decisions_review`, `decisions_block`
//! - `degraded_<factor>` (one per analyzer)
//! - `fail_safe_total`
//! - `assess_duration` (seconds)

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use txguard_core::{Action, RiskFactor};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Monotonic counter
#[derive(Debug)]
pub struct Counter {
    name: String,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Samples kept per histogram for percentiles
pub const HISTOGRAM_SAMPLE_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct HistogramState {
    count: u64,
    sum: f64,

    /// Most recent observations, oldest first
    samples: VecDeque<f64>,
}

/// Histogram of observed values
///
/// Count and sum cover every observation. Percentiles are computed over the
/// most recent samples only, so memory stays bounded on a long-running engine.
#[derive(Debug)]
pub struct Histogram {
    name: String,
    capacity: usize,
    state: RwLock<HistogramState>,
}

impl Histogram {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, HISTOGRAM_SAMPLE_CAPACITY)
    }

    /// Histogram retaining at most `capacity` samples (at least one)
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            state: RwLock::new(HistogramState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observe(&self, value: f64) {
        let mut state = write(&self.state);
        state.count += 1;
        state.sum += value;
        if state.samples.len() == self.capacity {
            state.samples.pop_front();
        }
        state.samples.push_back(value);
    }

    /// Observe a duration in seconds
    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64());
    }

    /// Observations since creation or the last reset
    pub fn count(&self) -> u64 {
        read(&self.state).count
    }

    pub fn sum(&self) -> f64 {
        read(&self.state).sum
    }

    pub fn avg(&self) -> f64 {
        let state = read(&self.state);
        if state.count == 0 {
            0.0
        } else {
            state.sum / state.count as f64
        }
    }

    /// Samples currently retained for percentiles
    pub fn sample_len(&self) -> usize {
        read(&self.state).samples.len()
    }

    /// Nearest-rank percentile over the retained samples, `p` in 0..=100
    pub fn percentile(&self, p: f64) -> f64 {
        let mut values: Vec<f64> = read(&self.state).samples.iter().copied().collect();
        if values.is_empty() {
            return 0.0;
        }

        values.sort_by(f64::total_cmp);
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64).round() as usize;
        values[rank]
    }

    pub fn reset(&self) {
        *write(&self.state) = HistogramState::default();
    }
}

/// Recording seam for the scoring path
pub trait Metrics: Send + Sync {
    fn counter(&self, name: &str) -> Arc<Counter>;

    fn histogram(&self, name: &str) -> Arc<Histogram>;

    /// Count a completed assessment and its action, and time it
    fn record_assessment(&self, action: Action, duration: Duration) {
        self.counter("assessments_total").inc();
        self.counter(&format!("decisions_{}", action.as_str().to_ascii_lowercase()))
            .inc();
        self.histogram("assess_duration").observe_duration(duration);
    }

    /// Count an analyzer that fell back to its degraded penalty
    fn record_degraded(&self, factor: RiskFactor) {
        self.counter(&format!("degraded_{}", factor.as_str())).inc();
    }

    fn record_fail_safe(&self) {
        self.counter("fail_safe_total").inc();
    }
}

/// Default in-process collector
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter values keyed by name
    pub fn counter_values(&self) -> BTreeMap<String, u64> {
        read(&self.counters)
            .iter()
            .map(|(name, counter)| (name.clone(), counter.get()))
            .collect()
    }

    pub fn histogram_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.histograms).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn reset_all(&self) {
        for counter in read(&self.counters).values() {
            counter.reset();
        }
        for histogram in read(&self.histograms).values() {
            histogram.reset();
        }
    }
}

impl Metrics for MetricsCollector {
    fn counter(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = read(&self.counters).get(name) {
            return counter.clone();
        }
        write(&self.counters)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Counter::new(name)))
            .clone()
    }

    fn histogram(&self, name: &str) -> Arc<Histogram> {
        if let Some(histogram) = read(&self.histograms).get(name) {
            return histogram.clone();
        }
        write(&self.histograms)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Histogram::new(name)))
            .clone()
    }
}
