//! RightLane: entitlements self-assessment session core.

pub mod analysis;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod profile;
pub mod progress;
pub mod report;
pub mod session;
pub mod store;
pub mod wizard;
