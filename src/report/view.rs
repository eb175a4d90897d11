//! Browsing view: the dashboard's filter controls over the report index.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::index::{self, AuthorityGroup, FilterState, Tab};
use super::model::{EntitlementRecord, Report};

/// Tip shown for records that came without a recommendation.
pub const DEFAULT_TIP: &str =
    "תתחילו לאסוף את המסמכים עוד היום, כל יום שעובר הוא כסף שנשאר אצל המדינה!";

/// What the browsing view shows for the current tab.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseContent<'a> {
    /// All/critical tabs: filtered records grouped by authority.
    Grouped(Vec<AuthorityGroup<'a>>),
    /// Documents tab: every record with documents, flat, filters ignored.
    Documents(Vec<&'a EntitlementRecord>),
}

impl BrowseContent<'_> {
    /// Number of records on screen.
    pub fn record_count(&self) -> usize {
        match self {
            Self::Grouped(groups) => groups.iter().map(|g| g.records.len()).sum(),
            Self::Documents(records) => records.len(),
        }
    }
}

/// One entry of the authority filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorityOption<'a> {
    pub authority: &'a str,
    pub selected: bool,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Over the unfiltered report.
    pub total_value: Decimal,
    pub critical_count: usize,
    pub completed_steps: usize,
    pub prepared_documents: usize,
}

/// Filter state plus the operations the dashboard controls invoke.
#[derive(Debug, Clone, Default)]
pub struct ReportBrowser {
    filters: FilterState,
}

impl ReportBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn tab(&self) -> Tab {
        self.filters.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        debug!(?tab, "Browse tab changed");
        self.filters.tab = tab;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filters.query = query.into();
    }

    pub fn toggle_authority(&mut self, authority: &str) -> bool {
        self.filters.toggle_authority(authority)
    }

    pub fn clear_authorities(&mut self) {
        self.filters.clear_authorities();
    }

    /// Forget all filters, e.g. when a new report arrives.
    pub fn reset(&mut self) {
        self.filters = FilterState::default();
    }

    /// The view for the current tab.
    pub fn content<'a>(&self, report: &'a Report) -> BrowseContent<'a> {
        match self.filters.tab {
            Tab::Documents => BrowseContent::Documents(index::documents_checklist(report)),
            Tab::All | Tab::Critical => {
                let filtered = index::filter(report, &self.filters);
                BrowseContent::Grouped(index::group_by_authority(&filtered))
            }
        }
    }

    /// Authority filter entries, in first-occurrence order.
    pub fn authority_options<'a>(&self, report: &'a Report) -> Vec<AuthorityOption<'a>> {
        index::authorities(report)
            .into_iter()
            .map(|authority| AuthorityOption {
                authority,
                selected: self.filters.authorities.iter().any(|a| a == authority),
            })
            .collect()
    }
}

/// The recommendation shown on a record's card.
pub fn recommendation_or_default(record: &EntitlementRecord) -> &str {
    record.primary_recommendation().unwrap_or(DEFAULT_TIP)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::report::model::Priority;

    fn sample() -> Report {
        Report::new(vec![
            EntitlementRecord::new("1", "Credit points", "Tax", Priority::Critical)
                .with_value(dec!(3000)),
            EntitlementRecord::new("2", "Arnona", "City", Priority::Important)
                .with_documents(vec!["Lease".into()]),
            EntitlementRecord::new("3", "Refund", "Tax", Priority::Future)
                .with_documents(vec!["Form 106".into()]),
        ])
    }

    #[test]
    fn grouped_by_default() {
        let report = sample();
        let browser = ReportBrowser::new();
        match browser.content(&report) {
            BrowseContent::Grouped(groups) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].authority, "Tax");
                assert_eq!(groups[0].records.len(), 2);
            }
            other => panic!("expected grouped view, got {other:?}"),
        }
    }

    #[test]
    fn documents_tab_ignores_other_filters() {
        let report = sample();
        let mut browser = ReportBrowser::new();
        browser.toggle_authority("City");
        browser.set_query("nothing matches this");
        browser.set_tab(Tab::Documents);
        let content = browser.content(&report);
        assert_eq!(content.record_count(), 2);
        match content {
            BrowseContent::Documents(records) => {
                assert_eq!(records[0].id, "2");
                assert_eq!(records[1].id, "3");
            }
            other => panic!("expected documents view, got {other:?}"),
        }
    }

    #[test]
    fn authority_options_reflect_selection() {
        let report = sample();
        let mut browser = ReportBrowser::new();
        browser.toggle_authority("City");
        let options = browser.authority_options(&report);
        assert_eq!(
            options,
            vec![
                AuthorityOption {
                    authority: "Tax",
                    selected: false
                },
                AuthorityOption {
                    authority: "City",
                    selected: true
                },
            ]
        );
        assert_eq!(browser.content(&report).record_count(), 1);
        browser.clear_authorities();
        assert_eq!(browser.content(&report).record_count(), 3);
    }

    #[test]
    fn reset_clears_filters() {
        let mut browser = ReportBrowser::new();
        browser.set_tab(Tab::Critical);
        browser.set_query("x");
        browser.reset();
        assert_eq!(browser.filters(), &FilterState::default());
    }

    #[test]
    fn recommendation_falls_back_to_default_tip() {
        let report = sample();
        let record = report.get("1").unwrap();
        assert_eq!(recommendation_or_default(record), DEFAULT_TIP);
    }
}
