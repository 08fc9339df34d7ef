//! Autocut Render Engine
//!
//! Turns a composed render graph into a finished video by driving ffmpeg,
//! and provides the media probing and caption sidecars around it.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ──┐
//!              ├── trim per segment ── graphic overlays ── drawtext captions
//! graphics/ ───┘                                   │
//!                                                  ├── xfade / concat (+ title cards)
//!                                                  │
//!                                                  ├── visual filter
//! music.mp3 ───────── loop / trim, volume, afade ──┤
//!                                                  ▼
//!                                           Encode (H.264)
//!                                                  │
//!                                                  ▼
//!                                          exports/final.mp4 (+ .srt)
//! ```

pub mod export;
pub mod filter_graph;
pub mod probe;
pub mod subtitles;

pub use export::*;
pub use probe::{probe_media, probe_music, probe_source, MediaProbe};
pub use subtitles::SubtitleFormat;
