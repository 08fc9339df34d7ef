//! The editing plan proposed by the vision model.
//!
//! The model's reply is untrusted: fields may be missing, mistyped, given as
//! strings, or wrapped in prose. [`EditPlan::from_value`] applies every
//! default exactly once at ingestion and records what it substituted, so the
//! composer downstream only ever sees a well-typed plan.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::recovery::Recovery;

/// Default on-screen time for a graphic without an explicit duration.
pub const DEFAULT_GRAPHIC_DURATION: f64 = 3.0;

/// Default transition type name.
pub const DEFAULT_TRANSITION_TYPE: &str = "crossfade";

/// A piece of the source video to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub start: f64,
    /// `None` means "until the end of the source".
    pub end: Option<f64>,
}

/// A caption shown over `[start, end)` of the source timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSpec {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A generated graphic shown from `timestamp` for `duration` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicSpec {
    pub timestamp: f64,
    pub duration: f64,
    /// Prompt for the image generator. Graphics without one never get an asset.
    pub prompt: Option<String>,
}

/// An advisory transition suggestion from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionHint {
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A fully-typed editing plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    #[serde(default)]
    pub segments: Vec<SegmentSpec>,

    #[serde(default)]
    pub captions: Vec<CaptionSpec>,

    #[serde(default)]
    pub graphics: Vec<GraphicSpec>,

    #[serde(default)]
    pub transitions: Vec<TransitionHint>,

    /// Defaults substituted while ingesting the raw plan.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recoveries: Vec<Recovery>,
}

impl EditPlan {
    /// Build a plan from an arbitrary JSON value, never failing.
    pub fn from_value(value: &Value) -> Self {
        let mut ingest = Ingest::default();

        let Some(root) = value.as_object() else {
            ingest.note("plan", format!("expected an object, found {}", type_name(value)));
            return Self {
                recoveries: ingest.recoveries,
                ..Self::default()
            };
        };

        let segments = ingest
            .entries(root, "segments")
            .into_iter()
            .map(|(path, obj)| SegmentSpec {
                start: ingest.number(obj, &path, "start").unwrap_or(0.0),
                end: ingest.number(obj, &path, "end"),
            })
            .collect();

        let mut captions = Vec::new();
        for (path, obj) in ingest.entries(root, "captions") {
            let start = ingest.number(obj, &path, "start").unwrap_or(0.0);
            let end = ingest.number(obj, &path, "end").unwrap_or(0.0);
            match ingest.text(obj, &path, "text") {
                Some(text) => captions.push(CaptionSpec { start, end, text }),
                None => ingest.note(&format!("{path}.text"), "empty caption suppressed"),
            }
        }

        let graphics = ingest
            .entries(root, "graphics")
            .into_iter()
            .map(|(path, obj)| GraphicSpec {
                timestamp: ingest.number(obj, &path, "timestamp").unwrap_or(0.0),
                duration: ingest
                    .number(obj, &path, "duration")
                    .unwrap_or(DEFAULT_GRAPHIC_DURATION),
                prompt: ingest.text(obj, &path, "prompt"),
            })
            .collect();

        let transitions = ingest
            .entries(root, "transitions")
            .into_iter()
            .map(|(path, obj)| TransitionHint {
                timestamp: ingest.number(obj, &path, "timestamp").unwrap_or(0.0),
                kind: ingest
                    .text(obj, &path, "type")
                    .unwrap_or_else(|| DEFAULT_TRANSITION_TYPE.to_string()),
            })
            .collect();

        Self {
            segments,
            captions,
            graphics,
            transitions,
            recoveries: ingest.recoveries,
        }
    }

    /// Parse the raw text of a model reply.
    ///
    /// Accepts bare JSON, a fenced ```` ```json ```` block, or an object
    /// embedded in prose. Returns `None` when no JSON object can be found.
    pub fn from_response_text(text: &str) -> Option<Self> {
        extract_json_object(text).map(|value| Self::from_value(&value))
    }

    /// Graphic indices that carry a prompt, in plan order.
    pub fn graphic_requests(&self) -> Vec<(usize, &str)> {
        self.graphics
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.prompt.as_deref().map(|p| (i, p)))
            .collect()
    }

    /// Whether the plan carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
            && self.captions.is_empty()
            && self.graphics.is_empty()
            && self.transitions.is_empty()
    }
}

/// Find the first JSON object in a model reply.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(fenced) = fenced_block(trimmed) {
        candidates.push(fenced);
    }
    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            candidates.push(&trimmed[open..=close]);
        }
    }

    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find(Value::is_object)
}

/// Body of the first ```` ```json ```` (or bare ```` ``` ````) fence.
fn fenced_block(text: &str) -> Option<&str> {
    let (marker_at, marker_len) = match text.find("```json") {
        Some(at) => (at, "```json".len()),
        None => (text.find("```")?, "```".len()),
    };
    let body = &text[marker_at + marker_len..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Collects substitutions made while reading a raw plan.
#[derive(Default)]
struct Ingest {
    recoveries: Vec<Recovery>,
}

impl Ingest {
    fn note(&mut self, field: &str, detail: impl Into<String>) {
        let recovery = Recovery::malformed(field, detail);
        tracing::warn!(%recovery, "Plan input substituted");
        self.recoveries.push(recovery);
    }

    /// Object entries of a top-level array, tagged with their path.
    fn entries<'a>(
        &mut self,
        root: &'a Map<String, Value>,
        key: &str,
    ) -> Vec<(String, &'a Map<String, Value>)> {
        let items = match root.get(key) {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.note(
                    key,
                    format!("expected an array, found {}; treated as empty", type_name(other)),
                );
                return Vec::new();
            }
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let path = format!("{key}[{i}]");
            match item.as_object() {
                Some(obj) => out.push((path, obj)),
                None => self.note(
                    &path,
                    format!("expected an object, found {}; skipped", type_name(item)),
                ),
            }
        }
        out
    }

    /// A finite number, given either as a JSON number or a numeric string.
    fn number(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<f64> {
        let value = obj.get(key)?;
        let parsed = match value {
            Value::Null => return None,
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed.filter(|n| n.is_finite()) {
            Some(n) => Some(n),
            None => {
                self.note(
                    &format!("{path}.{key}"),
                    format!("not a number ({value}); default used"),
                );
                None
            }
        }
    }

    /// A non-empty string. Numbers are accepted and stringified.
    fn text(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<String> {
        match obj.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.note(
                    &format!("{path}.{key}"),
                    format!("expected a string, found {}", type_name(other)),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_plan() {
        let plan = EditPlan::from_value(&json!({
            "segments": [{"start": 0, "end": 5}, {"start": 5.5, "end": 10}],
            "captions": [{"start": 1, "end": 3, "text": "Hello"}],
            "graphics": [{"timestamp": 4, "duration": 2, "prompt": "a diagram"}],
            "transitions": [{"timestamp": 5, "type": "crossfade"}]
        }));

        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.segments[1].start, 5.5);
        assert_eq!(plan.segments[1].end, Some(10.0));
        assert_eq!(plan.captions[0].text, "Hello");
        assert_eq!(plan.graphics[0].prompt.as_deref(), Some("a diagram"));
        assert_eq!(plan.transitions[0].kind, "crossfade");
        assert!(plan.recoveries.is_empty());
    }

    #[test]
    fn test_missing_fields_take_defaults_without_recovery() {
        let plan = EditPlan::from_value(&json!({
            "segments": [{}],
            "graphics": [{"prompt": "x"}],
            "transitions": [{}]
        }));

        assert_eq!(plan.segments[0], SegmentSpec { start: 0.0, end: None });
        assert_eq!(plan.graphics[0].timestamp, 0.0);
        assert_eq!(plan.graphics[0].duration, DEFAULT_GRAPHIC_DURATION);
        assert_eq!(plan.transitions[0].kind, DEFAULT_TRANSITION_TYPE);
        assert!(plan.captions.is_empty());
        assert!(plan.recoveries.is_empty());
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let plan = EditPlan::from_value(&json!({
            "segments": [{"start": "1.5", "end": " 4 "}]
        }));
        assert_eq!(plan.segments[0].start, 1.5);
        assert_eq!(plan.segments[0].end, Some(4.0));
        assert!(plan.recoveries.is_empty());
    }

    #[test]
    fn test_garbage_fields_recorded() {
        let plan = EditPlan::from_value(&json!({
            "segments": "all of it",
            "captions": [{"start": 0, "end": 2, "text": ""}, 7],
            "graphics": [{"timestamp": "soon", "prompt": "x"}]
        }));

        assert!(plan.segments.is_empty());
        assert!(plan.captions.is_empty());
        assert_eq!(plan.graphics[0].timestamp, 0.0);

        let fields: Vec<&str> = plan
            .recoveries
            .iter()
            .filter_map(|r| match r {
                Recovery::PlanMalformed { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec!["segments", "captions[1]", "captions[0].text", "graphics[0].timestamp"]
        );
    }

    #[test]
    fn test_non_object_plan_is_empty() {
        let plan = EditPlan::from_value(&json!([1, 2, 3]));
        assert!(plan.is_empty());
        assert_eq!(plan.recoveries.len(), 1);
    }

    #[test]
    fn test_caption_without_end_is_kept_degenerate() {
        let plan = EditPlan::from_value(&json!({
            "captions": [{"start": 3, "text": "dangling"}]
        }));
        assert_eq!(plan.captions[0].end, 0.0);
    }

    #[test]
    fn test_response_text_fenced_block() {
        let text = "Here is the plan:\n```json\n{\"segments\": [{\"start\": 0, \"end\": 10}]}\n```\nHope you like it.";
        let plan = EditPlan::from_response_text(text).unwrap();
        assert_eq!(plan.segments[0].end, Some(10.0));
    }

    #[test]
    fn test_response_text_mixed_prose() {
        let text = "Sure, here is the JSON:\n{\n \"captions\": [{\"start\": 1, \"end\": 2, \"text\": \"hi\"}]\n}\nLet me know!";
        let plan = EditPlan::from_response_text(text).unwrap();
        assert_eq!(plan.captions.len(), 1);
    }

    #[test]
    fn test_response_text_without_json() {
        assert!(EditPlan::from_response_text("I cannot help with that.").is_none());
        assert!(EditPlan::from_response_text("[1, 2]").is_none());
    }

    #[test]
    fn test_graphic_requests_skip_prompts_missing() {
        let plan = EditPlan::from_value(&json!({
            "graphics": [{"prompt": "a"}, {"timestamp": 2}, {"prompt": "b"}]
        }));
        assert_eq!(plan.graphic_requests(), vec![(0, "a"), (2, "b")]);
    }
}
