//! Chat Session Controller: the assistant side-channel.

pub mod controller;
pub mod model;

pub use controller::ChatSession;
pub use model::{ChatMessage, PanelState, Role, TurnOutcome, TurnState};
