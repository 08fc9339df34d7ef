//! Autocut Assets
//!
//! The boundary to the image-generation service. Graphic requests from an
//! editing plan are deduplicated by prompt, run on a bounded worker pool with
//! a retry policy, and collected into an [`AssetMap`](autocut_plan_model::AssetMap).
//! A failed request only leaves its graphic slots empty; the composer skips
//! those placements.

pub mod generator;
pub mod naming;
pub mod pool;
pub mod retry;

pub use generator::{CommandGenerator, GenerationError, ImageGenerator};
pub use naming::asset_file_stem;
pub use pool::generate_graphics;
pub use retry::RetryPolicy;
