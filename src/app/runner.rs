// ErrHarvest - app/runner.rs
//
// Fixed-interval driver for the pipeline.
//
// Architecture:
//   - The first cycle runs immediately, then one cycle per interval.
//   - Cycles run on the calling thread and never overlap.
//   - The sleep between cycles is cut into CANCEL_CHECK_INTERVAL_MS slices
//     so a shared cancel flag (set by the Ctrl-C handler) is observed
//     promptly. A running cycle is never interrupted.
//   - A failed cycle is logged and the loop carries on; the next interval is
//     the retry. There is no backoff.

use crate::app::pipeline::Pipeline;
use crate::core::model::CycleReport;
use crate::store::position::PositionStore;
use crate::store::sink::EntrySink;
use crate::util::constants::CANCEL_CHECK_INTERVAL_MS;
use crate::util::error::HarvestError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Totals across the cycles of one `run_loop` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub entries: u64,
}

/// Run a single cycle and log its outcome.
pub fn run_once<P: PositionStore, S: EntrySink>(
    pipeline: &mut Pipeline<P, S>,
) -> Result<CycleReport, HarvestError> {
    match pipeline.run_cycle() {
        Ok(report) => {
            log_report(&report);
            Ok(report)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Harvest cycle failed; will retry next interval");
            Err(e)
        }
    }
}

/// Run cycles every `interval` until `cancel` is set.
pub fn run_loop<P: PositionStore, S: EntrySink>(
    pipeline: &mut Pipeline<P, S>,
    interval: Duration,
    cancel: &Arc<AtomicBool>,
) -> RunStats {
    let mut stats = RunStats::default();

    tracing::info!(interval_secs = interval.as_secs(), "Harvest loop started");

    loop {
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        stats.cycles += 1;
        match run_once(pipeline) {
            Ok(report) => stats.entries += report.new_entries as u64,
            Err(_) => stats.failed_cycles += 1,
        }

        if !sleep_unless_cancelled(interval, cancel) {
            break;
        }
    }

    tracing::info!(
        cycles = stats.cycles,
        failed = stats.failed_cycles,
        entries = stats.entries,
        "Harvest loop stopped"
    );
    stats
}

/// Sleep for `total`, waking every CANCEL_CHECK_INTERVAL_MS to check the
/// flag. Returns false if cancelled.
fn sleep_unless_cancelled(total: Duration, cancel: &AtomicBool) -> bool {
    let slice = Duration::from_millis(CANCEL_CHECK_INTERVAL_MS);
    let mut remaining = total;

    while !remaining.is_zero() {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let step = remaining.min(slice);
        std::thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }

    !cancel.load(Ordering::SeqCst)
}

fn log_report(report: &CycleReport) {
    tracing::info!(
        at = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        file = %report.path.display(),
        new_lines = report.grown,
        last_line = report.last_line_read,
        new_entries = report.new_entries,
        "Cycle complete"
    );
}
