//! Step derivation: the wizard's screens as a pure function of the profile.

use serde::{Deserialize, Serialize};

use crate::profile::{Profile, Sector};

/// One wizard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "sector", rename_all = "snake_case")]
pub enum StepId {
    /// Sector selection. Always index 0.
    Intro,
    PersonalInfo,
    Sector(Sector),
    Summary,
}

impl StepId {
    pub fn is_summary(&self) -> bool {
        matches!(self, Self::Summary)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intro => write!(f, "intro"),
            Self::PersonalInfo => write!(f, "personal_info"),
            Self::Sector(sector) => write!(f, "{sector}"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Derive the ordered step list from the live profile.
///
/// `[Intro, PersonalInfo, ...selected sectors in catalog order..., Summary]`.
/// Never cached: callers recompute on every access.
pub fn compute_steps(profile: &Profile) -> Vec<StepId> {
    let mut steps = Vec::with_capacity(3 + profile.selected_sectors.len());
    steps.push(StepId::Intro);
    steps.push(StepId::PersonalInfo);
    steps.extend(
        Sector::ALL
            .into_iter()
            .filter(|s| profile.has_sector(*s))
            .map(StepId::Sector),
    );
    steps.push(StepId::Summary);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(sectors: &[Sector]) -> Profile {
        let mut p = Profile::default();
        p.selected_sectors.extend(sectors.iter().copied());
        p
    }

    #[test]
    fn empty_profile_has_fixed_steps() {
        let steps = compute_steps(&Profile::default());
        assert_eq!(
            steps,
            vec![StepId::Intro, StepId::PersonalInfo, StepId::Summary]
        );
    }

    #[test]
    fn tax_and_family_scenario() {
        let mut p = profile_with(&[Sector::Tax, Sector::Family]);
        p.age = Some(40);
        let steps = compute_steps(&p);
        assert_eq!(
            steps,
            vec![
                StepId::Intro,
                StepId::PersonalInfo,
                StepId::Sector(Sector::Tax),
                StepId::Sector(Sector::Family),
                StepId::Summary,
            ]
        );
    }

    #[test]
    fn length_is_fixed_plus_selected_for_every_subset() {
        for mask in 0u32..(1 << Sector::ALL.len()) {
            let sectors: Vec<Sector> = Sector::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, s)| s)
                .collect();
            let steps = compute_steps(&profile_with(&sectors));
            assert_eq!(steps.len(), 2 + sectors.len() + 1);
            assert_eq!(steps[0], StepId::Intro);
            assert_eq!(steps[1], StepId::PersonalInfo);
            assert_eq!(*steps.last().unwrap(), StepId::Summary);
        }
    }

    #[test]
    fn catalog_order_not_selection_order() {
        let a = compute_steps(&profile_with(&[Sector::Transport, Sector::Tax]));
        let b = compute_steps(&profile_with(&[Sector::Tax, Sector::Transport]));
        assert_eq!(a, b);
        assert_eq!(a[2], StepId::Sector(Sector::Tax));
        assert_eq!(a[3], StepId::Sector(Sector::Transport));
    }

    #[test]
    fn display_names() {
        assert_eq!(StepId::Intro.to_string(), "intro");
        assert_eq!(StepId::Sector(Sector::SocialSecurity).to_string(), "social_security");
        assert!(StepId::Summary.is_summary());
    }
}
