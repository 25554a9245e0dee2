use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use parking_lot::Mutex;

use crate::shard::ShardError;

/// Operation metrics collector for a shard manager
#[derive(Debug)]
pub struct MetricsCollector {
    // Operation counts
    /// Number of successful create operations
    create_count: AtomicUsize,
    /// Number of get operations
    get_count: AtomicUsize,
    /// Number of list operations
    list_count: AtomicUsize,
    /// Number of seal operations
    seal_count: AtomicUsize,

    // Rejections
    /// Operations rejected for an unknown placement group
    unknown_pg_count: AtomicUsize,
    /// Operations rejected for an unknown shard
    unknown_shard_count: AtomicUsize,
    /// Operations failed with an internal error
    internal_error_count: AtomicUsize,

    // Data metrics
    /// Total shard entries returned by list operations
    listed_entries: AtomicUsize,

    // Timing metrics
    /// Total create duration in nanoseconds
    create_duration_ns: AtomicU64,
    /// Total list duration in nanoseconds
    list_duration_ns: AtomicU64,
    /// Total seal duration in nanoseconds
    seal_duration_ns: AtomicU64,
    /// Longest time spent holding the write guard
    max_write_hold: Mutex<Duration>,

    // Internal state
    /// Start time of the metrics collector
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            create_count: AtomicUsize::new(0),
            get_count: AtomicUsize::new(0),
            list_count: AtomicUsize::new(0),
            seal_count: AtomicUsize::new(0),

            unknown_pg_count: AtomicUsize::new(0),
            unknown_shard_count: AtomicUsize::new(0),
            internal_error_count: AtomicUsize::new(0),

            listed_entries: AtomicUsize::new(0),

            create_duration_ns: AtomicU64::new(0),
            list_duration_ns: AtomicU64::new(0),
            seal_duration_ns: AtomicU64::new(0),
            max_write_hold: Mutex::new(Duration::from_secs(0)),

            start_time: Instant::now(),
        }
    }

    // Operation count methods

    /// Increment create count
    pub fn increment_creates(&self) {
        self.create_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardmeta_shards_created_total");
    }

    /// Increment get count
    pub fn increment_gets(&self) {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardmeta_shard_lookups_total");
    }

    /// Increment list count
    pub fn increment_lists(&self) {
        self.list_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardmeta_shard_lists_total");
    }

    /// Increment seal count
    pub fn increment_seals(&self) {
        self.seal_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardmeta_shards_sealed_total");
    }

    /// Record a rejected operation
    pub fn record_error(&self, err: &ShardError) {
        let counter = match err {
            ShardError::UnknownPg(_) => &self.unknown_pg_count,
            ShardError::UnknownShard(_) => &self.unknown_shard_count,
            ShardError::Internal(_) => &self.internal_error_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardmeta_errors_total", "code" => err.code());
    }

    /// Add entries returned by a list
    pub fn add_listed_entries(&self, count: usize) {
        self.listed_entries.fetch_add(count, Ordering::Relaxed);
    }

    // Timing metrics methods

    /// Record a create operation duration
    pub fn record_create_duration(&self, duration: Duration) {
        self.create_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a list operation duration
    pub fn record_list_duration(&self, duration: Duration) {
        self.list_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a seal operation duration
    pub fn record_seal_duration(&self, duration: Duration) {
        self.seal_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record how long the write guard was held
    pub fn record_write_hold(&self, duration: Duration) {
        let mut max = self.max_write_hold.lock();
        if duration > *max {
            *max = duration;
        }
    }

    // Getters

    /// Get number of successful creates
    pub fn get_create_count(&self) -> usize {
        self.create_count.load(Ordering::Relaxed)
    }

    /// Get number of gets
    pub fn get_get_count(&self) -> usize {
        self.get_count.load(Ordering::Relaxed)
    }

    /// Get number of lists
    pub fn get_list_count(&self) -> usize {
        self.list_count.load(Ordering::Relaxed)
    }

    /// Get number of seals
    pub fn get_seal_count(&self) -> usize {
        self.seal_count.load(Ordering::Relaxed)
    }

    /// Get number of unknown placement group rejections
    pub fn get_unknown_pg_count(&self) -> usize {
        self.unknown_pg_count.load(Ordering::Relaxed)
    }

    /// Get number of unknown shard rejections
    pub fn get_unknown_shard_count(&self) -> usize {
        self.unknown_shard_count.load(Ordering::Relaxed)
    }

    /// Get number of internal errors
    pub fn get_internal_error_count(&self) -> usize {
        self.internal_error_count.load(Ordering::Relaxed)
    }

    /// Get total entries returned by lists
    pub fn get_listed_entries(&self) -> usize {
        self.listed_entries.load(Ordering::Relaxed)
    }

    /// Get total create duration
    pub fn get_create_duration(&self) -> Duration {
        Duration::from_nanos(self.create_duration_ns.load(Ordering::Relaxed))
    }

    /// Get total list duration
    pub fn get_list_duration(&self) -> Duration {
        Duration::from_nanos(self.list_duration_ns.load(Ordering::Relaxed))
    }

    /// Get total seal duration
    pub fn get_seal_duration(&self) -> Duration {
        Duration::from_nanos(self.seal_duration_ns.load(Ordering::Relaxed))
    }

    /// Get the longest write guard hold
    pub fn get_max_write_hold(&self) -> Duration {
        *self.max_write_hold.lock()
    }

    /// Get average entries per list (0.0 when nothing was listed)
    pub fn get_avg_list_size(&self) -> f64 {
        let lists = self.list_count.load(Ordering::Relaxed);
        if lists == 0 {
            return 0.0;
        }

        self.listed_entries.load(Ordering::Relaxed) as f64 / lists as f64
    }

    /// Get uptime of the metrics collector
    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.create_count.store(0, Ordering::Relaxed);
        self.get_count.store(0, Ordering::Relaxed);
        self.list_count.store(0, Ordering::Relaxed);
        self.seal_count.store(0, Ordering::Relaxed);

        self.unknown_pg_count.store(0, Ordering::Relaxed);
        self.unknown_shard_count.store(0, Ordering::Relaxed);
        self.internal_error_count.store(0, Ordering::Relaxed);

        self.listed_entries.store(0, Ordering::Relaxed);

        self.create_duration_ns.store(0, Ordering::Relaxed);
        self.list_duration_ns.store(0, Ordering::Relaxed);
        self.seal_duration_ns.store(0, Ordering::Relaxed);
        *self.max_write_hold.lock() = Duration::from_secs(0);
    }

    /// Get a report of all metrics
    pub fn get_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Shard Manager Metrics Report ===\n\n");

        let uptime = self.get_uptime();
        report.push_str(&format!("Uptime: {:?}\n\n", uptime));

        report.push_str("Operation Counts:\n");
        report.push_str(&format!("  Creates: {}\n", self.get_create_count()));
        report.push_str(&format!("  Gets: {}\n", self.get_get_count()));
        report.push_str(&format!("  Lists: {}\n", self.get_list_count()));
        report.push_str(&format!("  Seals: {}\n\n", self.get_seal_count()));

        report.push_str("Rejections:\n");
        report.push_str(&format!("  Unknown PG: {}\n", self.get_unknown_pg_count()));
        report.push_str(&format!("  Unknown Shard: {}\n", self.get_unknown_shard_count()));
        report.push_str(&format!("  Internal: {}\n\n", self.get_internal_error_count()));

        report.push_str("Performance Metrics:\n");
        if self.get_create_count() > 0 {
            let avg_create = self.get_create_duration().as_micros() / self.get_create_count() as u128;
            report.push_str(&format!("  Avg. Create Time: {}µs\n", avg_create));
        }
        if self.get_seal_count() > 0 {
            let avg_seal = self.get_seal_duration().as_micros() / self.get_seal_count() as u128;
            report.push_str(&format!("  Avg. Seal Time: {}µs\n", avg_seal));
        }
        report.push_str(&format!("  Avg. Entries per List: {:.2}\n", self.get_avg_list_size()));
        report.push_str(&format!("  Max Write Guard Hold: {:?}\n", self.get_max_write_hold()));

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_basic_recording() {
        let metrics = MetricsCollector::new();

        metrics.increment_creates();
        metrics.increment_gets();
        metrics.increment_lists();
        metrics.increment_seals();

        assert_eq!(metrics.get_create_count(), 1);
        assert_eq!(metrics.get_get_count(), 1);
        assert_eq!(metrics.get_list_count(), 1);
        assert_eq!(metrics.get_seal_count(), 1);
    }

    #[test]
    fn test_metrics_error_recording() {
        let metrics = MetricsCollector::new();

        metrics.record_error(&ShardError::unknown_pg(1));
        metrics.record_error(&ShardError::unknown_pg(2));
        metrics.record_error(&ShardError::unknown_shard(9));
        metrics.record_error(&ShardError::internal("collision"));

        assert_eq!(metrics.get_unknown_pg_count(), 2);
        assert_eq!(metrics.get_unknown_shard_count(), 1);
        assert_eq!(metrics.get_internal_error_count(), 1);
    }

    #[test]
    fn test_metrics_timing_recording() {
        let metrics = MetricsCollector::new();

        let duration = Duration::from_millis(5);
        metrics.record_create_duration(duration);
        metrics.record_list_duration(duration);
        metrics.record_seal_duration(duration);
        metrics.record_write_hold(Duration::from_micros(3));
        metrics.record_write_hold(Duration::from_micros(1));

        assert_eq!(metrics.get_create_duration(), duration);
        assert_eq!(metrics.get_list_duration(), duration);
        assert_eq!(metrics.get_seal_duration(), duration);
        assert_eq!(metrics.get_max_write_hold(), Duration::from_micros(3));
    }

    #[test]
    fn test_metrics_list_size() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.get_avg_list_size(), 0.0);

        metrics.increment_lists();
        metrics.add_listed_entries(10);
        metrics.increment_lists();
        metrics.add_listed_entries(20);

        assert_eq!(metrics.get_avg_list_size(), 15.0);
    }

    #[test]
    fn test_metrics_report_and_reset() {
        let metrics = MetricsCollector::new();

        metrics.increment_creates();
        metrics.record_create_duration(Duration::from_micros(10));
        metrics.record_error(&ShardError::unknown_shard(3));

        let report = metrics.get_report();
        assert!(report.contains("Operation Counts:"));
        assert!(report.contains("Rejections:"));
        assert!(report.contains("Unknown Shard: 1"));

        metrics.reset();
        assert_eq!(metrics.get_create_count(), 0);
        assert_eq!(metrics.get_unknown_shard_count(), 0);
        assert_eq!(metrics.get_create_duration(), Duration::from_secs(0));
    }

    #[test]
    fn test_metrics_thread_safety() {
        let metrics = Arc::new(MetricsCollector::new());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let metrics_clone = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    metrics_clone.increment_creates();
                    metrics_clone.add_listed_entries(2);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.get_create_count(), 1000);
        assert_eq!(metrics.get_listed_entries(), 2000);
    }
}
