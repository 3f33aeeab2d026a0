use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use depth_view_domain::PipelineMetrics;

#[derive(Debug, Default)]
pub(crate) struct RequestTracker {
    in_flight: AtomicUsize,
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    stale: AtomicU64,
    skipped_ticks: AtomicU64,
}

impl RequestTracker {
    pub(crate) fn begin(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.submitted.fetch_add(1, Ordering::Relaxed);
        InFlight { tracker: self }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn record_applied(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.succeeded
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_tick(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PipelineMetrics {
        PipelineMetrics {
            submitted_requests: self.submitted.load(Ordering::Relaxed),
            succeeded_requests: self.succeeded.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            stale_responses: self.stale.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
        }
    }
}

/// Counts one outstanding request until dropped.
pub(crate) struct InFlight<'a> {
    tracker: &'a RequestTracker,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let tracker = RequestTracker::default();
        let first = tracker.begin();
        let second = tracker.begin();
        assert_eq!(tracker.in_flight(), 2);

        drop(first);
        assert_eq!(tracker.in_flight(), 1);
        drop(second);
        assert_eq!(tracker.in_flight(), 0);
        assert_eq!(tracker.snapshot().submitted_requests, 2);
    }
}
