use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::Local;
use crossbeam_channel::{bounded, select, tick, Sender};

use crate::counters::AuditCounters;

/// A destination for formatted progress lines.
pub trait ReportSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Prints progress lines to stdout. Progress is product output, not a
/// diagnostic, so it does not go through the logging layer.
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn emit(&self, line: &str) {
        println!("{line}");
    }
}

/// Collects progress lines in memory. Used by tests to assert on cadence.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// Throttled, contention-safe progress reporter.
///
/// Workers call [`check_and_report`](Self::check_and_report) after every unit;
/// a line is only emitted when a new milestone boundary is crossed, and the
/// boundary is claimed with an atomic `fetch_max` so exactly one of any
/// simultaneous crossers prints. Milestones that workers blow past between
/// checks are skipped, never back-filled: progress lines are a rate-limited
/// sample, not a complete ledger.
pub struct ProgressReporter {
    total: u64,
    interval: u64,
    counters: Arc<AuditCounters>,
    last_milestone: AtomicU64,
    final_reported: AtomicBool,
    sink: Box<dyn ReportSink>,
}

impl ProgressReporter {
    pub fn new(
        total: u64,
        interval: u64,
        counters: Arc<AuditCounters>,
        sink: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            total,
            interval: interval.max(1),
            counters,
            last_milestone: AtomicU64::new(0),
            final_reported: AtomicBool::new(false),
            sink,
        }
    }

    /// Emits one progress line if the current `users_checked` value crossed a
    /// milestone boundary nobody has claimed yet. Callable concurrently from
    /// any worker and from the wall-clock ticker.
    pub fn check_and_report(&self) {
        let checked = self.counters.users_checked();
        let bucket = checked / self.interval;

        if bucket == 0 {
            return;
        }

        // exactly one caller observes the previous maximum below its bucket
        let previous = self.last_milestone.fetch_max(bucket, Ordering::AcqRel);
        if bucket > previous {
            self.emit_line(checked);
        }
    }

    /// Forces the final report. Emits exactly one line no matter how many
    /// workers or tickers call it, so the 100%-complete line always appears.
    pub fn report_final(&self) {
        if self.final_reported.swap(true, Ordering::AcqRel) {
            return;
        }

        let checked = self.counters.users_checked();
        self.last_milestone.fetch_max(checked / self.interval, Ordering::AcqRel);
        self.emit_line(checked);
    }

    fn emit_line(&self, checked: u64) {
        let percent = if self.total == 0 {
            100.0
        } else {
            checked as f64 / self.total as f64 * 100.0
        };
        let found = self.counters.passwords_found();
        let remaining = self.total.saturating_sub(checked);
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

        self.sink.emit(&format!(
            "[{timestamp}] {percent:.2}% complete | Passwords Found: {found} | Users Remaining: {remaining}"
        ));
    }
}

/// A wall-clock driver for a [`ProgressReporter`].
///
/// The owned thread invokes the reporter's milestone check periodically,
/// exactly as per-unit callers do; the atomic milestone claim makes the two
/// driving modes safe to combine. Stopped through a rendezvous channel.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
    stop: Sender<()>,
}

impl ProgressTicker {
    pub fn start(reporter: Arc<ProgressReporter>, period: Duration) -> Self {
        let (stop, stop_receiver) = bounded(0);
        let ticks = tick(period);

        let handle = thread::spawn(move || loop {
            select! {
                recv(ticks) -> _ => reporter.check_and_report(),
                recv(stop_receiver) -> _ => break,
            }
        });

        Self { handle, stop }
    }

    /// Stops the ticker thread and blocks until it has exited.
    pub fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.handle.join();
    }
}
