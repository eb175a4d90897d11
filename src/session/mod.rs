//! Session scope: page routing and ownership of all per-user state.

pub mod app;
pub mod prefs;

pub use app::{Page, Services, Session};
pub use prefs::{SessionPrefs, Theme};
