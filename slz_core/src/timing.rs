use std::time::{Duration, Instant};

/// Start/end timestamps around one codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    pub start: Instant,
    pub end: Instant,
}

impl TimingSample {
    pub fn elapsed(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }
}

/// Append-only record of codec call timings for one file.
///
/// One sample is pushed per codec invocation, in call order. Samples are
/// never trimmed while the file is being processed; the ledger is dropped
/// together with the rest of the per-file state.
#[derive(Debug, Default)]
pub struct TimingLedger {
    samples: Vec<TimingSample>,
}

impl TimingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, start: Instant, end: Instant) {
        self.samples.push(TimingSample { start, end });
    }

    /// Run `f`, recording how long it took.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(start, Instant::now());
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TimingSample] {
        &self.samples
    }

    /// Sum of the per-call durations. Gaps between calls (file reads,
    /// writes) are not counted.
    pub fn total_elapsed(&self) -> Duration {
        self.samples.iter().map(TimingSample::elapsed).sum()
    }
}
