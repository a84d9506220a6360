//! Progress reporting during `evaluate_all`.

/// Receives progress of one evaluation run.
pub trait ProgressListener: Send {
    fn started(&mut self, _total: u64) {}

    /// `done` of `total` pixels have been evaluated.
    fn progress(&mut self, done: u64, total: u64);

    fn finished(&mut self, _total: u64) {}
}

/// Never reports.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullProgressListener;

impl ProgressListener for NullProgressListener {
    fn progress(&mut self, _done: u64, _total: u64) {}
}

/// A listener plus the pixel interval between reports.
pub struct ProgressPolicy {
    pub(crate) listener: Box<dyn ProgressListener>,
    pub(crate) interval: u64,
}

impl ProgressPolicy {
    /// No reports and no per-pixel bookkeeping beyond one compare.
    pub fn none() -> Self {
        ProgressPolicy {
            listener: Box::new(NullProgressListener),
            interval: u64::MAX,
        }
    }

    /// Report to `listener` every `interval` pixels (at least one).
    pub fn every(interval: u64, listener: impl ProgressListener + 'static) -> Self {
        ProgressPolicy {
            listener: Box::new(listener),
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for ProgressPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressPolicy")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Counter driving a policy through one run.
pub(crate) struct ProgressTracker<'p> {
    policy: &'p mut ProgressPolicy,
    total: u64,
    done: u64,
    next_report: u64,
}

impl<'p> ProgressTracker<'p> {
    pub(crate) fn start(policy: &'p mut ProgressPolicy, total: u64) -> Self {
        policy.listener.started(total);
        let next_report = policy.interval;
        ProgressTracker {
            policy,
            total,
            done: 0,
            next_report,
        }
    }

    #[inline]
    pub(crate) fn tick(&mut self) {
        self.done += 1;
        if self.done == self.next_report {
            self.policy.listener.progress(self.done, self.total);
            self.next_report = self.next_report.saturating_add(self.policy.interval);
        }
    }

    pub(crate) fn finish(self) {
        self.policy.listener.finished(self.total);
    }
}
