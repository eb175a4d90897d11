//! ProfileStore: owns the in-flight profile and applies field-level patches.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ProfileError;

use super::model::{Profile, Sector};

/// Upper bound on `childrenAges` entries a single edit may create.
pub const MAX_CHILDREN: usize = 20;

/// Owner of the accumulating profile.
///
/// All mutation goes through this type; readers get `&Profile` or a
/// `snapshot()` copy. Patches are shallow JSON merges (a `null` value clears
/// the field) validated only by whether the merged result still has the
/// profile's type shape.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profile: Profile,
}

impl ProfileStore {
    /// Start a wizard from the stored profile, or from wizard defaults.
    pub fn new(initial: Option<Profile>) -> Self {
        Self {
            profile: initial.unwrap_or_else(Profile::wizard_defaults),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Frozen copy handed to the analysis service.
    pub fn snapshot(&self) -> Profile {
        self.profile.clone()
    }

    /// Replace the whole profile (hydration from storage).
    pub fn replace(&mut self, profile: Profile) {
        self.profile = profile;
    }

    /// Merge a JSON object of camelCase fields into the profile.
    ///
    /// On error the profile is left unchanged.
    pub fn apply_patch(&mut self, patch: Value) -> Result<(), ProfileError> {
        let updates = match patch {
            Value::Object(map) => map,
            other => return Err(ProfileError::NotAnObject(json_kind(&other).to_string())),
        };

        let merged = self.merged_with(&updates)?;
        let next: Profile = serde_json::from_value(Value::Object(merged))
            .map_err(ProfileError::InvalidShape)?;

        // Unknown keys are dropped by deserialization; surface them in the log.
        let kept = to_object(&next)?;
        for key in updates.keys() {
            if !updates[key].is_null() && !kept.contains_key(key) {
                warn!(field = %key, "Ignoring unknown profile field");
            }
        }

        debug!(fields = updates.len(), "Profile patched");
        self.profile = next;
        Ok(())
    }

    /// Flip a boolean attribute by its camelCase name. Absent counts as false.
    pub fn toggle_flag(&mut self, field: &str) -> Result<bool, ProfileError> {
        if !is_flag_field(field) {
            return Err(ProfileError::NotAFlag(field.to_string()));
        }
        let next_value = match to_object(&self.profile)?.get(field) {
            Some(Value::Bool(b)) => !b,
            _ => true,
        };

        let mut updates = Map::new();
        updates.insert(field.to_string(), Value::Bool(next_value));
        let merged = self.merged_with(&updates)?;
        self.profile = serde_json::from_value(Value::Object(merged))
            .map_err(ProfileError::InvalidShape)?;
        Ok(next_value)
    }

    /// Add or remove a sector. Returns whether it is selected afterwards.
    pub fn toggle_sector(&mut self, sector: Sector) -> bool {
        let selected = if self.profile.selected_sectors.remove(&sector) {
            false
        } else {
            self.profile.selected_sectors.insert(sector);
            true
        };
        debug!(%sector, selected, "Sector toggled");
        selected
    }

    /// Set the age of child `index`, growing `childrenAges` to `childrenCount`.
    ///
    /// Indexes at or past [`MAX_CHILDREN`] are rejected without change.
    pub fn set_child_age(&mut self, index: usize, age: u32) -> Result<(), ProfileError> {
        if index >= MAX_CHILDREN {
            return Err(ProfileError::ChildOutOfRange {
                index,
                max: MAX_CHILDREN,
            });
        }
        let count = (self.profile.children_count.unwrap_or(0) as usize).min(MAX_CHILDREN);
        let ages = self.profile.children_ages.get_or_insert_with(Vec::new);
        let len = count.max(index + 1);
        if ages.len() < len {
            ages.resize(len, 0);
        }
        ages[index] = age;
        if count < len {
            self.profile.children_count = Some(len as u32);
        }
        debug!(index, age, "Child age set");
        Ok(())
    }

    fn merged_with(&self, updates: &Map<String, Value>) -> Result<Map<String, Value>, ProfileError> {
        let mut merged = to_object(&self.profile)?;
        for (key, value) in updates {
            if value.is_null() {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
        Ok(merged)
    }
}

/// Whether `field` is declared as an optional boolean on `Profile`: a
/// profile decoded from `{field: true}` alone must keep it.
fn is_flag_field(field: &str) -> bool {
    let mut single = Map::new();
    single.insert(field.to_string(), Value::Bool(true));
    match serde_json::from_value::<Profile>(Value::Object(single)) {
        Ok(profile) => to_object(&profile)
            .is_ok_and(|fields| fields.get(field) == Some(&Value::Bool(true))),
        Err(_) => false,
    }
}

fn to_object(profile: &Profile) -> Result<Map<String, Value>, ProfileError> {
    match serde_json::to_value(profile).map_err(ProfileError::InvalidShape)? {
        Value::Object(map) => Ok(map),
        other => Err(ProfileError::NotAnObject(json_kind(&other).to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
