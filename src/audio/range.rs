//! Trim window expressed as percentages of clip duration

use crate::{Result, SpeechClipError};

/// Minimum distance the slider handles keep between start and end
const MIN_GAP_PCT: f64 = 1.0;

/// A start/end window in percent of total duration.
///
/// Invariant: `0 <= start < end <= 100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    start_pct: f64,
    end_pct: f64,
}

impl TrimRange {
    /// The whole clip
    pub const FULL: TrimRange = TrimRange {
        start_pct: 0.0,
        end_pct: 100.0,
    };

    pub fn new(start_pct: f64, end_pct: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&start_pct)
            || !(0.0..=100.0).contains(&end_pct)
            || start_pct >= end_pct
        {
            return Err(SpeechClipError::Other(format!(
                "invalid trim range {}%..{}%",
                start_pct, end_pct
            )));
        }
        Ok(Self { start_pct, end_pct })
    }

    /// Build a range from arbitrary input, forcing it into `[0, 100]` and
    /// keeping the handles at least one percent apart.
    pub fn clamped(start_pct: f64, end_pct: f64) -> Self {
        let start = if start_pct.is_nan() { 0.0 } else { start_pct };
        let end = if end_pct.is_nan() { 100.0 } else { end_pct };
        let start = start.clamp(0.0, 100.0 - MIN_GAP_PCT);
        let end = end.clamp(start + MIN_GAP_PCT, 100.0);
        Self {
            start_pct: start,
            end_pct: end,
        }
    }

    /// Move the start handle; it cannot pass the end handle
    pub fn with_start(self, start_pct: f64) -> Self {
        if start_pct.is_nan() {
            return self;
        }
        let upper = (self.end_pct - MIN_GAP_PCT).max(0.0);
        Self {
            start_pct: start_pct.clamp(0.0, upper),
            ..self
        }
    }

    /// Move the end handle; it cannot pass the start handle
    pub fn with_end(self, end_pct: f64) -> Self {
        if end_pct.is_nan() {
            return self;
        }
        let lower = (self.start_pct + MIN_GAP_PCT).min(100.0);
        Self {
            end_pct: end_pct.clamp(lower, 100.0),
            ..self
        }
    }

    pub fn start_pct(&self) -> f64 {
        self.start_pct
    }

    pub fn end_pct(&self) -> f64 {
        self.end_pct
    }

    /// True when the range covers the entire clip
    pub fn is_full(&self) -> bool {
        self.start_pct <= 0.0 && self.end_pct >= 100.0
    }

    /// Share of the clip kept, in [0, 1]
    pub fn fraction(&self) -> f64 {
        (self.end_pct - self.start_pct) / 100.0
    }
}

impl Default for TrimRange {
    fn default() -> Self {
        Self::FULL
    }
}
