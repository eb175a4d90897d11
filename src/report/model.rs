//! Entitlement records and the report that holds them.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Urgency class of an entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Priority {
    Critical,
    Important,
    Recommended,
    Future,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Recommended => "recommended",
            Self::Future => "future",
        }
    }
}

/// Unknown labels from the analysis service decode as `Recommended`.
impl From<String> for Priority {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "important" => Self::Important,
            "future" => Self::Future,
            _ => Self::Recommended,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A citation backing an entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: String,
}

/// One discovered benefit or right.
///
/// Immutable once received. `id` doubles as the progress-tracking key, so
/// it must stay stable for as long as the report is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authority: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    /// Human-readable value label as given by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<String>,
    /// Annual value used for totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<Decimal>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub action_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub documents_to_prepare: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_processing_time: Option<String>,
}

fn default_priority() -> Priority {
    Priority::Recommended
}

impl EntitlementRecord {
    /// Minimal record; the remaining fields start empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        authority: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            authority: authority.into(),
            priority,
            estimated_value: None,
            numeric_value: None,
            requirements: Vec::new(),
            action_steps: Vec::new(),
            contact_info: None,
            documents_to_prepare: Vec::new(),
            recommendations: None,
            official_link: None,
            form_link: None,
            sources: None,
            location: None,
            estimated_processing_time: None,
        }
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.numeric_value = Some(value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.action_steps = steps;
        self
    }

    pub fn with_documents(mut self, documents: Vec<String>) -> Self {
        self.documents_to_prepare = documents;
        self
    }

    pub fn has_documents(&self) -> bool {
        !self.documents_to_prepare.is_empty()
    }

    /// The first recommendation, if the service gave any.
    pub fn primary_recommendation(&self) -> Option<&str> {
        self.recommendations
            .as_ref()
            .and_then(|r| r.first())
            .map(String::as_str)
    }

    /// Give a record without an identifier a fresh one.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
    }

    /// Append citations after any the record already carries.
    pub fn append_sources(&mut self, extra: &[Source]) {
        if extra.is_empty() {
            return;
        }
        self.sources
            .get_or_insert_with(Vec::new)
            .extend(extra.iter().cloned());
    }
}

/// The ordered result of one analysis run.
///
/// Stored as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    records: Vec<EntitlementRecord>,
}

impl Report {
    pub fn new(records: Vec<EntitlementRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EntitlementRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntitlementRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&EntitlementRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn critical_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.priority == Priority::Critical)
            .count()
    }

    /// Give every record a non-empty id unique within the report. Blank
    /// and repeated ids get fresh UUIDs; the first holder of an id keeps it.
    /// Returns whether any id changed.
    pub fn repair_ids(&mut self) -> bool {
        let mut seen = HashSet::with_capacity(self.records.len());
        let mut changed = false;
        for record in &mut self.records {
            if record.id.trim().is_empty() {
                record.ensure_id();
                changed = true;
            } else if seen.contains(&record.id) {
                let fresh = Uuid::new_v4().to_string();
                warn!(duplicate = %record.id, replacement = %fresh, "Duplicate record id replaced");
                record.id = fresh;
                changed = true;
            }
            seen.insert(record.id.clone());
        }
        changed
    }
}

impl FromIterator<EntitlementRecord> for Report {
    fn from_iter<I: IntoIterator<Item = EntitlementRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a EntitlementRecord;
    type IntoIter = std::slice::Iter<'a, EntitlementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
