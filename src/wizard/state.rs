//! Wizard navigation state: an integer index into the live step list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::Profile;

use super::steps::{StepId, compute_steps};

/// Position of the user inside the wizard.
///
/// Only the index is stored. The step it names is resolved against
/// `compute_steps(profile)` at the moment of the call, so deselecting a
/// sector shifts which step a given index refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    step: usize,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw step index.
    pub fn index(&self) -> usize {
        self.step
    }

    /// Index clamped to the current step list.
    pub fn clamped_index(&self, profile: &Profile) -> usize {
        let len = compute_steps(profile).len();
        self.step.min(len - 1)
    }

    /// The step currently shown.
    pub fn current_step(&self, profile: &Profile) -> StepId {
        let steps = compute_steps(profile);
        let idx = self.step.min(steps.len() - 1);
        steps[idx]
    }

    /// Whether `advance` would move.
    pub fn can_advance(&self, profile: &Profile) -> bool {
        if self.step == 0 && profile.selected_sectors.is_empty() {
            return false;
        }
        self.step + 1 < compute_steps(profile).len()
    }

    pub fn can_retreat(&self) -> bool {
        self.step > 0
    }

    /// Move one step forward. Refused without error from the first step
    /// while no sector is selected, and on the last step.
    pub fn advance(&mut self, profile: &Profile) -> bool {
        if !self.can_advance(profile) {
            debug!(step = self.step, "Advance refused");
            return false;
        }
        self.step += 1;
        debug!(step = self.step, "Wizard advanced");
        true
    }

    /// Move one step back, floored at 0.
    pub fn retreat(&mut self) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step -= 1;
        debug!(step = self.step, "Wizard retreated");
        true
    }

    /// Return to the first step.
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// One-based position and total, e.g. "step 2 of 5".
    pub fn position(&self, profile: &Profile) -> (usize, usize) {
        let len = compute_steps(profile).len();
        (self.step.min(len - 1) + 1, len)
    }

    /// Fraction of the wizard completed, for the progress bar.
    pub fn progress(&self, profile: &Profile) -> f32 {
        let (pos, len) = self.position(profile);
        pos as f32 / len as f32
    }

    /// Back/next controls are hidden on the last step and while analyzing.
    pub fn navigation_visible(&self, profile: &Profile, analyzing: bool) -> bool {
        !analyzing && self.step + 1 < compute_steps(profile).len()
    }

    /// Sector selection is only editable on the first step.
    pub fn sectors_editable(&self) -> bool {
        self.step == 0
    }
}
