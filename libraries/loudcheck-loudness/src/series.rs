//! Time-indexed analysis series
//!
//! One point per analysis window, in chronological order. The presentation
//! layer charts these and maps clicks on the chart back to seek targets.

use serde::{Deserialize, Serialize};

/// A single (time, value) point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Offset of the window start from the beginning of the track
    pub time_secs: f64,
    /// Window statistic (dB for loudness, linear amplitude for peak)
    pub value: f64,
}

/// Immutable, chronologically ordered series of window statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, time_secs: f64, value: f64) {
        debug_assert!(self
            .points
            .last()
            .map_or(true, |last| last.time_secs < time_secs));
        self.points.push(SeriesPoint { time_secs, value });
    }

    /// All points in chronological order
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time offset of the point at `index`
    pub fn time_of(&self, index: usize) -> Option<f64> {
        self.points.get(index).map(|p| p.time_secs)
    }

    /// Largest value in the series
    pub fn max_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::max)
    }

    /// Index of the window containing `time_secs`
    ///
    /// Times before the first point map to 0, times past the last window
    /// map to the last index.
    pub fn nearest_index(&self, time_secs: f64) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let after = self.points.partition_point(|p| p.time_secs <= time_secs);
        Some(after.saturating_sub(1))
    }

    /// Seek target for a click at `fraction` (0.0..=1.0) of the chart width
    ///
    /// Snaps to the start of the window under the click.
    pub fn seek_target(&self, fraction: f64, duration_secs: f64) -> Option<f64> {
        let time = fraction.clamp(0.0, 1.0) * duration_secs;
        self.nearest_index(time).and_then(|i| self.time_of(i))
    }
}
