// ============================================
// TIMING UTILITY - Performance Measurement
// ============================================
// Usage:
//   1. Manual tracking: let timer = Timer::start("name"); ... timer.stop();
//   2. Threshold: Timer::start_with_threshold("name", 500) only logs slow runs
//   3. Batches: AggregateTimer::new("tickers") + record() + summary()
// ============================================

use std::time::{Duration, Instant};
use tracing::info;

/// Timer for measuring execution time, logged through tracing
pub struct Timer {
    name: String,
    start: Instant,
    threshold_ms: u128,
    logged: bool,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self::start_with_threshold(name, 0)
    }

    /// Only logs if execution exceeds `threshold_ms`
    pub fn start_with_threshold(name: impl Into<String>, threshold_ms: u128) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            threshold_ms,
            logged: false,
        }
    }

    /// Stop the timer and log the result
    pub fn stop(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.log_duration(duration);
        duration
    }

    fn log_duration(&mut self, duration: Duration) {
        if self.logged {
            return;
        }
        self.logged = true;

        let ms = duration.as_millis();
        if ms < self.threshold_ms {
            return;
        }

        if ms < 1000 {
            info!(timer = %self.name, elapsed_ms = ms as u64, "{} - {}ms", self.name, ms);
        } else {
            info!(
                timer = %self.name,
                elapsed_ms = ms as u64,
                "{} - {:.2}s",
                self.name,
                duration.as_secs_f64()
            );
        }
    }
}

// Log on drop if stop() was never called
impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.log_duration(duration);
    }
}

// ============================================
// AGGREGATE TIMING FOR BATCH OPERATIONS
// ============================================

/// Aggregate timer for tracking multiple operations
#[derive(Debug, Clone)]
pub struct AggregateTimer {
    name: String,
    count: usize,
    total_duration: Duration,
    min_duration: Option<Duration>,
    max_duration: Option<Duration>,
}

impl AggregateTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: None,
            max_duration: None,
        }
    }

    /// Record a single operation duration
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = Some(self.min_duration.map_or(duration, |min| min.min(duration)));
        self.max_duration = Some(self.max_duration.map_or(duration, |max| max.max(duration)));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn avg_duration(&self) -> Option<Duration> {
        if self.count == 0 {
            None
        } else {
            Some(self.total_duration / self.count as u32)
        }
    }

    pub fn min_duration(&self) -> Option<Duration> {
        self.min_duration
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    /// Log summary statistics
    pub fn summary(&self) {
        if self.count == 0 {
            info!(timer = %self.name, "no operations recorded");
            return;
        }

        info!(
            timer = %self.name,
            count = self.count,
            total_ms = self.total_duration.as_millis() as u64,
            avg_ms = self.avg_duration().map(|d| d.as_millis() as u64).unwrap_or(0),
            min_ms = self.min_duration.map(|d| d.as_millis() as u64).unwrap_or(0),
            max_ms = self.max_duration.map(|d| d.as_millis() as u64).unwrap_or(0),
            "timing summary"
        );
    }
}
