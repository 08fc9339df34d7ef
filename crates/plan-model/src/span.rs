//! Time intervals on the source timeline.

use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` in seconds.
///
/// A span is only constructed when `end > start` and both bounds are finite;
/// degenerate intervals are represented by `None` at the construction site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    /// Create a span, returning `None` for degenerate or non-finite bounds.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Span length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Clamp into `[lo, hi]`, returning `None` if nothing is left.
    pub fn clamp_to(&self, lo: f64, hi: f64) -> Option<Self> {
        Self::new(self.start.max(lo), self.end.min(hi))
    }

    /// True interval overlap: `self.start < other.end && self.end > other.start`.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// The shared part of two spans, if any.
    pub fn intersection(&self, other: &TimeSpan) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }
}
