//! Bounded, time-ordered sample history for a single metric.

use serde::{Deserialize, Serialize};

/// One observed data point: a millisecond Unix timestamp and a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time the batch containing this sample was gathered.
    pub timestamp_ms: i64,
    /// The combined value observed at that time.
    pub value: f64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// The retained sample history of one metric.
///
/// The window is always sorted ascending by timestamp, even when a batch
/// arrives late, and never holds more samples than the bound passed to
/// [`push`](SeriesWindow::push). Once the bound would be exceeded the
/// oldest sample is evicted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesWindow {
    samples: Vec<Sample>,
}

impl SeriesWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, preserving ascending timestamp order, then evict
    /// from the front until at most `max_points` samples remain.
    ///
    /// Batches normally arrive in order, so the scan starts from the back.
    pub fn push(&mut self, sample: Sample, max_points: usize) {
        let pos = self
            .samples
            .iter()
            .rposition(|s| s.timestamp_ms <= sample.timestamp_ms)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.samples.insert(pos, sample);

        if self.samples.len() > max_points {
            self.samples.drain(..self.samples.len() - max_points);
        }
    }

    /// The retained samples, oldest first.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// The most recent sample, if any.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no samples have been retained.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
