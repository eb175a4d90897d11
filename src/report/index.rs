//! Report index: filtering, grouping, and totals over a report.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::{EntitlementRecord, Priority, Report};

/// Active browsing tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    All,
    Critical,
    /// Document checklist view mode; not a filter predicate.
    Documents,
}

impl Tab {
    pub fn from_label(label: &str) -> Option<Tab> {
        match label.trim().to_lowercase().as_str() {
            "all" => Some(Tab::All),
            "critical" => Some(Tab::Critical),
            "documents" | "docs" => Some(Tab::Documents),
            _ => None,
        }
    }
}

/// Transient browsing filters. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub tab: Tab,
    /// Selected authorities in selection order. Empty means no filter.
    pub authorities: Vec<String>,
    pub query: String,
}

impl FilterState {
    pub fn with_tab(mut self, tab: Tab) -> Self {
        self.tab = tab;
        self
    }

    pub fn with_authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorities = authorities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Add the authority if absent, remove it if present.
    pub fn toggle_authority(&mut self, authority: &str) -> bool {
        if let Some(pos) = self.authorities.iter().position(|a| a == authority) {
            self.authorities.remove(pos);
            false
        } else {
            self.authorities.push(authority.to_string());
            true
        }
    }

    pub fn clear_authorities(&mut self) {
        self.authorities.clear();
    }

    fn matches(&self, record: &EntitlementRecord, needle: &str) -> bool {
        if self.tab == Tab::Critical && record.priority != Priority::Critical {
            return false;
        }
        if !self.authorities.is_empty() && !self.authorities.iter().any(|a| *a == record.authority)
        {
            return false;
        }
        if !needle.is_empty() {
            let haystack = format!(
                "{} {} {} {}",
                record.authority,
                record.description,
                record.title,
                record.location.as_deref().unwrap_or("")
            )
            .to_lowercase();
            if !haystack.contains(needle) {
                return false;
            }
        }
        true
    }
}

/// Records passing every active filter, in report order.
///
/// Tab, authority, and query filters are ANDed. The documents tab adds no
/// predicate here; see [`documents_checklist`].
pub fn filter<'a>(report: &'a Report, state: &FilterState) -> Vec<&'a EntitlementRecord> {
    let needle = state.query.to_lowercase();
    report
        .iter()
        .filter(|r| state.matches(r, &needle))
        .collect()
}

/// A run of records sharing one issuing authority.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorityGroup<'a> {
    pub authority: &'a str,
    pub records: Vec<&'a EntitlementRecord>,
}

/// Group records by authority. Groups appear in first-occurrence order and
/// records keep their input order within a group.
pub fn group_by_authority<'a>(records: &[&'a EntitlementRecord]) -> Vec<AuthorityGroup<'a>> {
    let mut groups: Vec<AuthorityGroup<'a>> = Vec::new();
    for &record in records {
        match groups
            .iter_mut()
            .find(|g| g.authority == record.authority)
        {
            Some(group) => group.records.push(record),
            None => groups.push(AuthorityGroup {
                authority: &record.authority,
                records: vec![record],
            }),
        }
    }
    groups
}

/// Sum of annual values across the whole report. Records without a value
/// contribute zero. Filters never apply here.
///
/// Saturates at `Decimal::MAX` (or `MIN`) instead of overflowing.
pub fn total_value(report: &Report) -> Decimal {
    let mut total = Decimal::ZERO;
    for record in report {
        let Some(value) = record.numeric_value else {
            continue;
        };
        total = match total.checked_add(value) {
            Some(sum) => sum,
            None => {
                warn!(record = %record.id, "Report total overflowed, saturating");
                if value.is_sign_negative() {
                    Decimal::MIN
                } else {
                    Decimal::MAX
                }
            }
        };
    }
    total
}

/// Distinct authorities in first-occurrence order.
pub fn authorities(report: &Report) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for record in report {
        if !seen.contains(&record.authority.as_str()) {
            seen.push(&record.authority);
        }
    }
    seen
}

/// Records with at least one document to prepare, flattened and unfiltered.
pub fn documents_checklist(report: &Report) -> Vec<&EntitlementRecord> {
    report.iter().filter(|r| r.has_documents()).collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn rec(id: &str, authority: &str, priority: Priority) -> EntitlementRecord {
        EntitlementRecord::new(id, format!("title {id}"), authority, priority)
    }

    fn sample() -> Report {
        Report::new(vec![
            rec("1", "A", Priority::Critical)
                .with_value(dec!(3000))
                .with_location("Haifa"),
            rec("2", "B", Priority::Important).with_description("Arnona discount"),
            rec("3", "A", Priority::Future)
                .with_value(dec!(1500))
                .with_documents(vec!["ID card".into()]),
            rec("4", "C", Priority::Critical).with_documents(vec!["Payslip".into()]),
        ])
    }

    fn ids(records: &[&EntitlementRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn default_filter_keeps_everything() {
        let report = sample();
        assert_eq!(ids(&filter(&report, &FilterState::default())), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn critical_tab_keeps_order() {
        let report = sample();
        let state = FilterState::default().with_tab(Tab::Critical);
        assert_eq!(ids(&filter(&report, &state)), vec!["1", "4"]);
    }

    #[test]
    fn authority_multi_select() {
        let report = sample();
        let state = FilterState::default().with_authorities(["A", "C"]);
        assert_eq!(ids(&filter(&report, &state)), vec!["1", "3", "4"]);
    }

    #[test]
    fn query_is_case_insensitive_over_all_text_fields() {
        let report = sample();
        let by_location = FilterState::default().with_query("HAIFA");
        assert_eq!(ids(&filter(&report, &by_location)), vec!["1"]);

        let by_description = FilterState::default().with_query("arnona");
        assert_eq!(ids(&filter(&report, &by_description)), vec!["2"]);

        let by_title = FilterState::default().with_query("Title 3");
        assert_eq!(ids(&filter(&report, &by_title)), vec!["3"]);
    }

    #[test]
    fn dimensions_are_anded() {
        let report = sample();
        let state = FilterState::default()
            .with_tab(Tab::Critical)
            .with_authorities(["A"]);
        assert_eq!(ids(&filter(&report, &state)), vec!["1"]);
    }

    #[test]
    fn grouping_first_occurrence_order() {
        let report = Report::new(vec![
            rec("1", "A", Priority::Important),
            rec("2", "B", Priority::Important),
            rec("3", "A", Priority::Important),
        ]);
        let filtered = filter(&report, &FilterState::default());
        let groups = group_by_authority(&filtered);
        let names: Vec<&str> = groups.iter().map(|g| g.authority).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(ids(&groups[0].records), vec!["1", "3"]);
        assert_eq!(ids(&groups[1].records), vec!["2"]);
    }

    #[test]
    fn total_ignores_filters() {
        let report = Report::new(vec![
            rec("1", "A", Priority::Important).with_value(dec!(3000)),
            rec("2", "B", Priority::Important).with_value(dec!(1500)),
        ]);
        assert_eq!(total_value(&report), dec!(4500));
        let state = FilterState::default().with_authorities(["A"]);
        assert_eq!(filter(&report, &state).len(), 1);
        assert_eq!(total_value(&report), dec!(4500));
    }

    #[test]
    fn total_of_empty_or_valueless_report_is_zero() {
        assert_eq!(total_value(&Report::default()), Decimal::ZERO);
        let report = Report::new(vec![rec("1", "A", Priority::Future)]);
        assert_eq!(total_value(&report), Decimal::ZERO);
    }

    #[test]
    fn total_saturates_instead_of_overflowing() {
        let huge: Decimal = "50000000000000000000000000000".parse().unwrap();
        let report = Report::new(vec![
            rec("1", "A", Priority::Critical).with_value(huge),
            rec("2", "B", Priority::Critical).with_value(huge),
            rec("3", "C", Priority::Future).with_value(Decimal::ONE),
        ]);
        assert_eq!(total_value(&report), Decimal::MAX);

        let printed = crate::report::render_for_print(&report);
        assert!(printed.contains("79,228,162,514,264,337,593,543,950,335"));
    }

    #[test]
    fn huge_values_from_the_service_still_total() {
        let records: Vec<EntitlementRecord> = serde_json::from_value(serde_json::json!([
            { "id": "a", "title": "A", "authority": "X", "priority": "critical", "numericValue": 5e28 },
            { "id": "b", "title": "B", "authority": "X", "priority": "critical", "numericValue": 5e28 }
        ]))
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(total_value(&Report::new(records)), Decimal::MAX);
    }

    #[test]
    fn authorities_in_first_occurrence_order() {
        assert_eq!(authorities(&sample()), vec!["A", "B", "C"]);
    }

    #[test]
    fn documents_checklist_only_records_with_documents() {
        assert_eq!(ids(&documents_checklist(&sample())), vec!["3", "4"]);
    }

    #[test]
    fn toggle_and_clear_authorities() {
        let mut state = FilterState::default();
        assert!(state.toggle_authority("A"));
        assert!(state.toggle_authority("B"));
        assert!(!state.toggle_authority("A"));
        assert_eq!(state.authorities, vec!["B".to_string()]);
        state.clear_authorities();
        assert!(state.authorities.is_empty());
    }

    #[test]
    fn tab_labels() {
        assert_eq!(Tab::from_label("Critical"), Some(Tab::Critical));
        assert_eq!(Tab::from_label("docs"), Some(Tab::Documents));
        assert_eq!(Tab::from_label("nope"), None);
    }
}
