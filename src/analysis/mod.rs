//! Analysis: the external service boundaries and the trigger that calls them.
//!
//! `AnalysisService` turns a profile into entitlement records;
//! `ConversationService` answers chat turns. `GeminiClient` implements both.

pub mod gemini;
pub mod prompts;
pub mod service;
pub mod trigger;

pub use gemini::GeminiClient;
pub use service::{AnalysisService, ConversationService};
pub use trigger::AnalysisTrigger;
