//! Autocut Plan Model
//!
//! Defines the data contracts around the timeline composition engine:
//! - **Span:** Source-timeline intervals in seconds
//! - **Plan:** The editing plan proposed by the vision model, ingested leniently
//! - **Style:** Per-invocation feature options (music, crossfade, filter, cards, subtitles)
//! - **Assets:** Resolved graphic files plus source and music descriptors
//! - **Recovery:** Records of malformed input the pipeline substituted defaults for
//! - **Job:** The on-disk job bundle (`job.json`, `plan.json`, `graphics/`, `exports/`)
//!
//! All times are seconds on the source timeline unless a field says otherwise.

pub mod assets;
pub mod job;
pub mod plan;
pub mod recovery;
pub mod span;
pub mod style;

pub use assets::*;
pub use job::*;
pub use plan::*;
pub use recovery::*;
pub use span::*;
pub use style::*;
