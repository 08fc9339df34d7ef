//! Autocut Composer — the timeline composition engine
//!
//! Turns a sparse, possibly malformed editing plan plus already-rendered
//! overlay assets into a deterministic render graph:
//! - **Clipper:** Normalize the keep-list into ordered, playable segments
//! - **Interval Index:** Binary-search windowing over overlay events
//! - **Placement:** Project graphics and captions into segment-relative time
//! - **Transitions:** Cap crossfades against the shortest segment
//! - **Audio Mix:** Pick silence / pass-through / music-only / mixed
//! - **Assembler:** Lay everything out with title cards and output offsets
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod assembler;
pub mod audio_mix;
pub mod clipper;
pub mod graph;
pub mod interval_index;
pub mod placement;
pub mod transitions;

pub use assembler::{Composer, ComposerConfig};
pub use audio_mix::{AudioDirective, MusicFit, MusicPlan};
pub use graph::{
    CardRole, RenderGraph, RenderUnit, SegmentUnit, TimedCaption, TitleCard, UnitContent,
};
pub use placement::{OverlayContent, OverlayEvent, PlacedOverlay};
pub use transitions::TransitionDirective;
