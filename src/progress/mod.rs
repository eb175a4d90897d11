//! Progress Tracker: which action steps and documents the user has done.

pub mod model;
pub mod tracker;

pub use model::{ProgressKey, ProgressKind, ProgressMap};
pub use tracker::ProgressTracker;
