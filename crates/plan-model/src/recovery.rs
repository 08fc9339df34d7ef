//! Records of conditions the pipeline recovered from locally.
//!
//! None of these are errors. They are kept so callers (the CLI `validate`
//! and `compose` commands in particular) can show what was substituted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the plan or media an interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Segment,
    Caption,
    Graphic,
}

/// Which audio input was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrack {
    Original,
    Music,
}

/// A locally recovered condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recovery {
    /// A plan field was missing or unusable; a default was substituted.
    PlanMalformed { field: String, detail: String },

    /// A graphic has no generated asset; its placements were omitted.
    AssetMissing { graphic_index: usize },

    /// An interval was empty after clamping and was dropped.
    DegenerateInterval { interval: IntervalKind, index: usize },

    /// The requested crossfade did not fit; `applied` is what was used
    /// (0 means transitions were skipped).
    TransitionInfeasible { requested: f64, applied: f64 },

    /// An audio input was absent and the mix was planned without it.
    AudioSourceAbsent { track: AudioTrack },
}

impl Recovery {
    pub fn malformed(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::PlanMalformed {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recovery::PlanMalformed { field, detail } => {
                write!(f, "malformed plan field `{field}`: {detail}")
            }
            Recovery::AssetMissing { graphic_index } => {
                write!(f, "graphic {graphic_index} has no asset; placement skipped")
            }
            Recovery::DegenerateInterval { interval, index } => {
                write!(f, "{interval:?} {index} is empty after clamping; dropped")
            }
            Recovery::TransitionInfeasible { requested, applied } => {
                if *applied > 0.0 {
                    write!(f, "crossfade {requested:.2}s capped to {applied:.2}s")
                } else {
                    write!(f, "crossfade {requested:.2}s does not fit; transitions skipped")
                }
            }
            Recovery::AudioSourceAbsent { track } => match track {
                AudioTrack::Original => write!(f, "source has no audio track"),
                AudioTrack::Music => write!(f, "music track unusable; mixed without it"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Recovery::AssetMissing { graphic_index: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"asset_missing","graphic_index":2}"#);
    }

    #[test]
    fn test_display_for_skipped_transition() {
        let text = Recovery::TransitionInfeasible {
            requested: 1.0,
            applied: 0.0,
        }
        .to_string();
        assert!(text.contains("skipped"));
    }
}
