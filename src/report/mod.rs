//! Report Index: entitlement records and the dashboard's view over them.
//!
//! A report arrives whole from one analysis run and is never edited. The
//! index functions filter, group, and total it; `ReportBrowser` holds the
//! transient filter state; `print` renders the unfiltered report.

pub mod index;
pub mod model;
pub mod print;
pub mod view;

pub use index::{
    AuthorityGroup, FilterState, Tab, authorities, documents_checklist, filter,
    group_by_authority, total_value,
};
pub use model::{EntitlementRecord, Priority, Report, Source};
pub use print::{format_amount, render_for_print};
pub use view::{BrowseContent, DashboardSummary, ReportBrowser, recommendation_or_default};
