//! Crossfade planning between adjacent segments.

use autocut_plan_model::Recovery;
use serde::{Deserialize, Serialize};

/// Crossfade from one segment into the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionDirective {
    /// Overlap in seconds; the earlier unit fades out and the later fades in
    /// by this amount.
    pub crossfade: f64,
}

/// Result of planning transitions for one composition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    /// Crossfade applied to every adjacent pair (0 means hard cuts).
    pub crossfade: f64,
    pub recovery: Option<Recovery>,
}

impl TransitionPlan {
    /// Fade-in and fade-out lengths for unit `index` of `count`.
    pub fn fades_for(&self, index: usize, count: usize) -> (f64, f64) {
        if self.crossfade <= 0.0 || count < 2 {
            return (0.0, 0.0);
        }
        let fade_in = if index > 0 { self.crossfade } else { 0.0 };
        let fade_out = if index + 1 < count { self.crossfade } else { 0.0 };
        (fade_in, fade_out)
    }

    /// Directive from unit `index` into the next one, if any.
    pub fn directive_after(&self, index: usize, count: usize) -> Option<TransitionDirective> {
        (self.crossfade > 0.0 && index + 1 < count).then_some(TransitionDirective {
            crossfade: self.crossfade,
        })
    }
}

/// Cap the requested crossfade against the shortest segment.
///
/// One capped value, `min(requested, shortest - epsilon)`, is used for every
/// pair. A cap at or below zero disables transitions.
pub fn plan_transitions(durations: &[f64], requested: f64, epsilon: f64) -> TransitionPlan {
    let none = TransitionPlan {
        crossfade: 0.0,
        recovery: None,
    };
    if !requested.is_finite() || requested <= 0.0 || durations.len() < 2 {
        return none;
    }

    let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
    let capped = requested.min(shortest - epsilon);

    if capped <= 0.0 {
        tracing::warn!(
            requested,
            shortest,
            "Crossfade does not fit the shortest segment; using hard cuts"
        );
        return TransitionPlan {
            crossfade: 0.0,
            recovery: Some(Recovery::TransitionInfeasible {
                requested,
                applied: 0.0,
            }),
        };
    }

    if capped < requested {
        tracing::info!(requested, applied = capped, "Crossfade capped to shortest segment");
        return TransitionPlan {
            crossfade: capped,
            recovery: Some(Recovery::TransitionInfeasible {
                requested,
                applied: capped,
            }),
        };
    }

    TransitionPlan {
        crossfade: requested,
        recovery: None,
    }
}
