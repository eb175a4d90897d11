//! Terminal host: command parsing, rendering, and the REPL loop.

pub mod command;
pub mod render;
pub mod repl;

pub use command::{Command, CommandParser};
pub use repl::{Flow, Repl};
