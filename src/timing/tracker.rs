//! Time tracker
//!
//! Keeps the most recent durations per label and reports totals and
//! averages through `tracing` at debug level.

use chrono::Local;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Samples kept per label unless configured otherwise.
pub const DEFAULT_MAX_COUNT: usize = 6;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Aggregate for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub label: String,
    pub count: usize,
    pub total: Duration,
    pub average: Duration,
}

#[derive(Debug, Clone)]
pub struct TimeTracker {
    times: HashMap<String, VecDeque<Duration>>,
    max_count: usize,
}

impl TimeTracker {
    /// Create a tracker keeping at most `max_count` samples per label (minimum 1).
    pub fn new(max_count: usize) -> Self {
        Self { times: HashMap::new(), max_count: max_count.max(1) }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Run `f` and record how long it took under `label`.
    pub fn track<F, R>(&mut self, label: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = self.start();
        let result = f();
        self.record(label, start);
        result
    }

    /// Await `fut` and record how long it took under `label`.
    pub async fn track_async<Fut>(&mut self, label: &str, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        let start = self.start();
        let result = fut.await;
        self.record(label, start);
        result
    }

    /// Time the rest of the enclosing scope; the sample is recorded on drop.
    ///
    /// ```ignore
    /// {
    ///     let _timer = tracker.time_block("load");
    ///     load_everything();
    /// }
    /// ```
    pub fn time_block(&mut self, label: impl Into<String>) -> BlockTimer<'_> {
        let start = self.start();
        BlockTimer { tracker: self, label: label.into(), start, finished: false }
    }

    /// Current instant, logged with wall-clock time.
    pub fn start(&self) -> Instant {
        debug!("Start time: {}", Local::now().format(TIMESTAMP_FORMAT));
        Instant::now()
    }

    /// Record the time elapsed since `start` under `label` and return it.
    pub fn record(&mut self, label: &str, start: Instant) -> Duration {
        let elapsed = start.elapsed();
        debug!("{} took {:.6} seconds to execute", label, elapsed.as_secs_f64());
        self.store(label, elapsed);
        elapsed
    }

    fn store(&mut self, label: &str, elapsed: Duration) {
        let samples = self.times.entry(label.to_string()).or_default();
        samples.push_back(elapsed);
        while samples.len() > self.max_count {
            samples.pop_front();
        }
    }

    /// Retained samples for `label`, oldest first.
    pub fn samples(&self, label: &str) -> Option<&VecDeque<Duration>> {
        self.times.get(label)
    }

    /// Sum of retained samples; zero (with a warning) for an unknown label.
    pub fn total_time(&self, label: &str, log_time: bool) -> Duration {
        match self.times.get(label) {
            Some(samples) => {
                let total: Duration = samples.iter().sum();
                if log_time {
                    debug!(
                        "Total time for '{}': {:.6} seconds ({})",
                        label,
                        total.as_secs_f64(),
                        Local::now().format(TIMESTAMP_FORMAT)
                    );
                }
                total
            }
            None => {
                warn!("No data found for function: {}", label);
                Duration::ZERO
            }
        }
    }

    pub fn average_time(&self, label: &str) -> Option<Duration> {
        self.times.get(label).and_then(|samples| summarize(label, samples)).map(|s| s.average)
    }

    /// One entry per label, sorted by label.
    pub fn summary(&self) -> Vec<TimingSummary> {
        let mut out: Vec<TimingSummary> = self
            .times
            .iter()
            .filter_map(|(label, samples)| summarize(label, samples))
            .collect();
        out.sort_by(|a, b| a.label.cmp(&b.label));
        out
    }

    pub fn log_all_times(&self, title: &str) {
        debug!("~~~~~~~~~~~~~~~~~~~~ {} --> Summary ~~~~~~~~~~~~~~~~~~~~", title);
        for entry in self.summary() {
            log_summary(&entry);
        }
        debug!("==============================================================");
    }

    pub fn log_single_time(&self, label: &str) {
        match self.times.get(label).and_then(|samples| summarize(label, samples)) {
            Some(entry) => log_summary(&entry),
            None => warn!("No data found for function: {}", label),
        }
    }

    pub fn clear(&mut self) {
        self.times.clear();
    }
}

impl Default for TimeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COUNT)
    }
}

fn summarize(label: &str, samples: &VecDeque<Duration>) -> Option<TimingSummary> {
    if samples.is_empty() {
        return None;
    }
    let total: Duration = samples.iter().sum();
    let count = samples.len();
    Some(TimingSummary {
        label: label.to_string(),
        count,
        total,
        average: total / count as u32,
    })
}

fn log_summary(entry: &TimingSummary) {
    debug!(
        "Function: {:<20} | Total Time: {:.6}s | Average Time: {:.6}s",
        entry.label,
        entry.total.as_secs_f64(),
        entry.average.as_secs_f64()
    );
}

/// Scope guard returned by [`TimeTracker::time_block`].
pub struct BlockTimer<'a> {
    tracker: &'a mut TimeTracker,
    label: String,
    start: Instant,
    finished: bool,
}

impl BlockTimer<'_> {
    /// Stop timing now and return the recorded duration.
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        self.tracker.record(&self.label, self.start)
    }
}

impl Drop for BlockTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.record(&self.label, self.start);
        }
    }
}
