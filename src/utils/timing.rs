use std::time::{Duration, Instant};
use log::{debug, info};

/// Running totals for a repeated, expensive operation (atlas builds).
#[derive(Debug)]
pub struct TimingStats {
    pub name: String,
    pub total_time: Duration,
    pub max_time: Duration,
    pub count: u32,
}

impl TimingStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total_time: Duration::ZERO,
            max_time: Duration::ZERO,
            count: 0,
        }
    }

    pub fn add_measurement(&mut self, duration: Duration) {
        self.total_time += duration;
        self.max_time = self.max_time.max(duration);
        self.count += 1;

        info!("{} - Current: {:.2}ms, Avg: {:.2}ms, Max: {:.2}ms, Count: {}",
            self.name,
            duration.as_secs_f64() * 1000.0,
            self.average_ms(),
            self.max_time.as_secs_f64() * 1000.0,
            self.count
        );
    }

    pub fn average_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_time.as_secs_f64() * 1000.0) / self.count as f64
        }
    }
}

/// Records the time between construction and drop into `stats`.
pub struct ScopedTimer<'a> {
    start: Instant,
    stats: &'a mut TimingStats,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(stats: &'a mut TimingStats) -> Self {
        debug!("{} - started", stats.name);
        Self {
            start: Instant::now(),
            stats,
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.stats.add_measurement(duration);
    }
}
