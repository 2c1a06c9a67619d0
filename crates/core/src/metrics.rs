use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct AuditMetrics {
    audits_started: AtomicU64,
    audits_completed: AtomicU64,
    audits_failed: AtomicU64,
    audits_declined: AtomicU64,
    starts_rejected: AtomicU64,
    preparations: AtomicU64,
    preparation_failures: AtomicU64,
    tool_runs: AtomicU64,
    tool_failures: AtomicU64,
}

impl AuditMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_audits_started(&self) {
        self.audits_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audits_completed(&self) {
        self.audits_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audits_failed(&self) {
        self.audits_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audits_declined(&self) {
        self.audits_declined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_starts_rejected(&self) {
        self.starts_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_preparations(&self) {
        self.preparations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_preparation_failures(&self) {
        self.preparation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_runs(&self) {
        self.tool_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_failures(&self) {
        self.tool_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            audits_started: self.audits_started.load(Ordering::Relaxed),
            audits_completed: self.audits_completed.load(Ordering::Relaxed),
            audits_failed: self.audits_failed.load(Ordering::Relaxed),
            audits_declined: self.audits_declined.load(Ordering::Relaxed),
            starts_rejected: self.starts_rejected.load(Ordering::Relaxed),
            preparations: self.preparations.load(Ordering::Relaxed),
            preparation_failures: self.preparation_failures.load(Ordering::Relaxed),
            tool_runs: self.tool_runs.load(Ordering::Relaxed),
            tool_failures: self.tool_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub audits_started: u64,
    pub audits_completed: u64,
    pub audits_failed: u64,
    pub audits_declined: u64,
    pub starts_rejected: u64,
    pub preparations: u64,
    pub preparation_failures: u64,
    pub tool_runs: u64,
    pub tool_failures: u64,
}

impl MetricsSnapshot {
    pub fn tool_success_rate(&self) -> f64 {
        if self.tool_runs == 0 {
            return 1.0;
        }
        1.0 - (self.tool_failures as f64 / self.tool_runs as f64)
    }

    pub fn preparation_success_rate(&self) -> f64 {
        if self.preparations == 0 {
            return 1.0;
        }
        1.0 - (self.preparation_failures as f64 / self.preparations as f64)
    }
}
