//! Profile data model: the sparse attribute record collected by the wizard.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A category of entitlements the user can opt into during the first step.
///
/// Declaration order is the catalog order; `Ord` follows it, so a
/// `BTreeSet<Sector>` iterates in catalog order regardless of selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Tax,
    SocialSecurity,
    Family,
    Health,
    Housing,
    Transport,
}

impl Sector {
    /// Every sector, in catalog order.
    pub const ALL: [Sector; 6] = [
        Sector::Tax,
        Sector::SocialSecurity,
        Sector::Family,
        Sector::Health,
        Sector::Housing,
        Sector::Transport,
    ];

    /// Stable identifier used in storage and on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Tax => "tax",
            Self::SocialSecurity => "social_security",
            Self::Family => "family",
            Self::Health => "health",
            Self::Housing => "housing",
            Self::Transport => "transport",
        }
    }

    /// Look up a sector by identifier.
    pub fn from_id(id: &str) -> Option<Sector> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employee,
    SelfEmployed,
    Both,
    Unemployed,
    Pensioner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingStatus {
    Rent,
    Owned,
    SocialHousing,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationFrequency {
    Rare,
    Often,
}

/// The accumulating user profile.
///
/// Every attribute is optional: the record is valid at any stage of the
/// wizard. Field names serialize in camelCase, which is the shape stored
/// locally and submitted to the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub selected_sectors: BTreeSet<Sector>,

    // Taxes & finance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_mortgage: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donations_over_threshold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_degree_in_last6_years: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributes_to_pension_independently: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharged_soldier_last3_years: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pays_alimony: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worked_from_home_in_high_percent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_debt_in_execution_office: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawn_pension_early: Option<bool>,

    // Social security & benefits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unemployed_last_year: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_injury_history: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostile_action_victim: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reserve_soldier: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_days_last_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maternity_leave_last_year: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_disability: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupational_disease: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_seeking_work: Option<bool>,

    // Family & education
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_ages: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_single_parent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_needs_family_member: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_student: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daycare_payments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paying_academic_tuition: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_first_degree_student: Option<bool>,

    // Health & holocaust survivors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chronic_condition: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_nursing_care: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_holocaust_survivor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_second_gen_holocaust: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobility_impairment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_equipment_at_home: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_expensive_medication: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancer_survivor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blind_or_visually_impaired: Option<bool>,

    // Housing & municipal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_status: Option<HousingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_peripheral_area: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electricity_high_usage: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_usage_abnormal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arnona_payer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_assistance_needed: Option<bool>,

    // Transportation, banking & leisure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_transport_user: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_private_vehicle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_disabled_parking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senior_citizen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacation_frequency: Option<VacationFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bank_fee_exempt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefers_local_culture: Option<bool>,

    // General
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_oleh_hadash: Option<bool>,
}

impl Profile {
    /// The profile a fresh wizard starts from.
    pub fn wizard_defaults() -> Self {
        Self {
            age: Some(30),
            gender: Some(String::new()),
            family_status: Some(String::new()),
            children_count: Some(0),
            children_ages: Some(Vec::new()),
            employment_status: Some(EmploymentStatus::Employee),
            ..Default::default()
        }
    }

    /// Whether `sector` is currently selected.
    pub fn has_sector(&self, sector: Sector) -> bool {
        self.selected_sectors.contains(&sector)
    }

    /// Render the profile as a short markdown section.
    pub fn to_summary_section(&self) -> String {
        let mut parts = vec!["# Profile".to_string()];

        if !self.selected_sectors.is_empty() {
            let ids: Vec<&str> = self.selected_sectors.iter().map(|s| s.id()).collect();
            parts.push(format!("- **Sectors:** {}", ids.join(", ")));
        }
        if let Some(age) = self.age {
            parts.push(format!("- **Age:** {age}"));
        }
        if let Some(status) = self.employment_status {
            // serde name doubles as the display label
            let label = serde_json::to_value(status)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            parts.push(format!("- **Employment:** {label}"));
        }
        if let Some(ref family) = self.family_status {
            if !family.is_empty() {
                parts.push(format!("- **Family status:** {family}"));
            }
        }
        if let Some(count) = self.children_count {
            if count > 0 {
                parts.push(format!("- **Children:** {count}"));
            }
        }
        if let Some(ref location) = self.location {
            if !location.is_empty() {
                parts.push(format!("- **Location:** {location}"));
            }
        }

        parts.join("\n")
    }
}
