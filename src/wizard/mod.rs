//! Step Sequencer: which wizard screens exist and where the user is.
//!
//! The step list is derived from the live profile on every access; the
//! wizard state holds nothing but an integer index into it.

pub mod state;
pub mod steps;

pub use state::WizardState;
pub use steps::{StepId, compute_steps};
