//! Build progress reporting.
//!
//! The orchestrator emits [`Progress`] events into a [`ProgressObserver`];
//! how they are displayed is up to the observer. Each phase owns a fixed
//! slice of the 0–100 range so the reported percentage never goes backwards
//! within a build.

use std::fmt;

/// Stage of an archive build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Encode,
    Compress,
    Save,
    Done,
    Failed,
}

impl Phase {
    /// Inclusive percentage range this phase reports within.
    pub fn range(&self) -> (u8, u8) {
        match self {
            Phase::Read => (0, 40),
            Phase::Encode => (40, 80),
            Phase::Compress => (80, 95),
            Phase::Save => (95, 100),
            Phase::Done => (100, 100),
            Phase::Failed => (0, 0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Read => "Reading files",
            Phase::Encode => "Encoding",
            Phase::Compress => "Compressing (gzip)",
            Phase::Save => "Saving",
            Phase::Done => "Done",
            Phase::Failed => "Failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A single progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    /// Overall completion, 0 to 100
    pub percent: u8,
}

/// Receiver of progress events.
///
/// Implemented for any `Fn(Progress)`, so a closure forwarding into a channel
/// works as an observer.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: Progress);
}

impl<F> ProgressObserver for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn on_progress(&self, progress: Progress) {
        self(progress)
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: Progress) {}
}

/// Maps per-phase completion onto the overall range and keeps it monotonic.
pub(crate) struct ProgressTracker<'a> {
    observer: &'a dyn ProgressObserver,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self { observer, last: 0 }
    }

    /// Report `done` of `total` units finished within `phase`.
    pub(crate) fn report(&mut self, phase: Phase, done: usize, total: usize) {
        let (lo, hi) = phase.range();
        let span = (hi - lo) as usize;
        let within = if total == 0 {
            span
        } else {
            span * done.min(total) / total
        };
        let percent = (lo as usize + within) as u8;

        self.last = self.last.max(percent);
        self.observer.on_progress(Progress {
            phase,
            percent: self.last,
        });
    }

    pub(crate) fn done(&mut self) {
        self.report(Phase::Done, 1, 1);
    }

    /// Reset to zero after a failed build.
    pub(crate) fn fail(&mut self) {
        self.last = 0;
        self.observer.on_progress(Progress {
            phase: Phase::Failed,
            percent: 0,
        });
    }
}
