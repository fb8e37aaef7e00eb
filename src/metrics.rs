// Audit metrics module
//
// Provides lightweight counters for monitoring audit batches

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session-wide audit metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Counters are
/// shared by the audit service across batches and logged on shutdown.
#[derive(Debug)]
pub struct AuditMetrics {
    /// Batches that ran the detector
    pub batches_run: AtomicUsize,

    /// Batches aborted before detection (unsupported game, no installation, nothing to check)
    pub batches_skipped: AtomicUsize,

    /// Archive headers read
    pub archives_checked: AtomicUsize,

    /// Mismatching archives reported
    pub issues_found: AtomicUsize,

    /// Reported archives whose header could not be read
    pub unreadable_archives: AtomicUsize,

    /// Total detector time in milliseconds
    pub total_check_time_ms: AtomicU64,

    start_time: Instant,
}

impl AuditMetrics {
    pub fn new() -> Self {
        Self {
            batches_run: AtomicUsize::new(0),
            batches_skipped: AtomicUsize::new(0),
            archives_checked: AtomicUsize::new(0),
            issues_found: AtomicUsize::new(0),
            unreadable_archives: AtomicUsize::new(0),
            total_check_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed detector batch
    pub fn record_batch(
        &self,
        archives: usize,
        issues: usize,
        unreadable: usize,
        duration: Duration,
    ) {
        self.batches_run.fetch_add(1, Ordering::Relaxed);
        self.archives_checked.fetch_add(archives, Ordering::Relaxed);
        self.issues_found.fetch_add(issues, Ordering::Relaxed);
        self.unreadable_archives
            .fetch_add(unreadable, Ordering::Relaxed);
        self.total_check_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record a batch that stopped before detection
    pub fn record_batch_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average header read time in milliseconds
    pub fn avg_check_time_ms(&self) -> f64 {
        let total = self.total_check_time_ms.load(Ordering::Relaxed);
        let count = self.archives_checked.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Audit Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Batches: {} run, {} skipped",
            self.batches_run.load(Ordering::Relaxed),
            self.batches_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Archives: {} checked, {} mismatched, {} unreadable",
            self.archives_checked.load(Ordering::Relaxed),
            self.issues_found.load(Ordering::Relaxed),
            self.unreadable_archives.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total check time: {:.2}s (avg: {:.2}ms per archive)",
            self.total_check_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_check_time_ms()
        );
    }
}

impl Default for AuditMetrics {
    fn default() -> Self {
        Self::new()
    }
}
