//! Plain-text rendering of session state for the terminal.

use crate::chat::{ChatMessage, Role};
use crate::profile::{Profile, Sector};
use crate::progress::{ProgressKind, ProgressTracker};
use crate::report::{
    self, BrowseContent, DashboardSummary, EntitlementRecord, ReportBrowser, Report, Tab,
};
use crate::wizard::{StepId, WizardState, compute_steps};

const BAR_WIDTH: usize = 20;

/// The current wizard screen.
pub fn wizard_screen(wizard: &WizardState, profile: &Profile, analyzing: bool) -> String {
    let step = wizard.current_step(profile);
    let (pos, len) = wizard.position(profile);
    let filled = (wizard.progress(profile) * BAR_WIDTH as f32).round() as usize;

    let mut out = vec![format!(
        "Step {pos} of {len}: {step}  [{}{}]",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH.saturating_sub(filled))
    )];

    match step {
        StepId::Intro => {
            out.push("Choose the areas to check (/sector <id>):".to_string());
            for sector in Sector::ALL {
                let mark = if profile.has_sector(sector) { "x" } else { " " };
                out.push(format!("  [{mark}] {sector}"));
            }
            if profile.selected_sectors.is_empty() {
                out.push("Select at least one area to continue.".to_string());
            }
        }
        StepId::PersonalInfo => {
            out.push("Personal details (/set <field> <value>, /child <n> <age>):".to_string());
            out.push(profile.to_summary_section());
        }
        StepId::Sector(sector) => {
            out.push(format!(
                "Questions for {sector}: toggle what applies with /flag <field>."
            ));
        }
        StepId::Summary => {
            out.push(profile.to_summary_section());
            if analyzing {
                out.push("Analyzing your profile...".to_string());
            } else {
                out.push("Ready. Type /analyze to build your report.".to_string());
            }
        }
    }

    if wizard.navigation_visible(profile, analyzing) {
        let mut nav = Vec::new();
        if wizard.can_retreat() {
            nav.push("/back");
        }
        if wizard.can_advance(profile) {
            nav.push("/next");
        }
        if !nav.is_empty() {
            out.push(nav.join("  "));
        }
    }
    out.join("\n")
}

/// The step list with the current one marked.
pub fn step_list(wizard: &WizardState, profile: &Profile) -> String {
    let current = wizard.clamped_index(profile);
    compute_steps(profile)
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let marker = if i == current { ">" } else { " " };
            format!("{marker} {}. {step}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Headline numbers, filter controls, and the current tab's records.
pub fn dashboard(
    summary: &DashboardSummary,
    browser: &ReportBrowser,
    report: &Report,
    progress: &ProgressTracker,
) -> String {
    if report.is_empty() {
        return "No report yet. Type /start to begin the assessment.".to_string();
    }

    let mut out = vec![
        format!(
            "Potential annual value: {}   urgent: {}   steps done: {}   documents ready: {}",
            report::format_amount(summary.total_value),
            summary.critical_count,
            summary.completed_steps,
            summary.prepared_documents
        ),
        format!("Tab: {}", tab_label(browser.tab())),
    ];

    let options: Vec<String> = browser
        .authority_options(report)
        .into_iter()
        .map(|o| {
            if o.selected {
                format!("[{}]", o.authority)
            } else {
                o.authority.to_string()
            }
        })
        .collect();
    out.push(format!("Authorities: {}", options.join(" | ")));
    if !browser.filters().query.is_empty() {
        out.push(format!("Search: {}", browser.filters().query));
    }

    match browser.content(report) {
        BrowseContent::Grouped(groups) => {
            if groups.is_empty() {
                out.push("Nothing matches the current filters.".to_string());
            }
            for group in groups {
                out.push(String::new());
                out.push(format!("== {} ==", group.authority));
                for record in group.records {
                    out.push(record_card(record, progress));
                }
            }
        }
        BrowseContent::Documents(records) => {
            for record in records {
                out.push(String::new());
                out.push(format!("{} [{}] ({})", record.title, record.id, record.authority));
                out.push(checklist(record, progress, ProgressKind::Document));
            }
        }
    }
    out.join("\n")
}

fn tab_label(tab: Tab) -> &'static str {
    match tab {
        Tab::All => "all",
        Tab::Critical => "critical",
        Tab::Documents => "documents",
    }
}

fn record_card(record: &EntitlementRecord, progress: &ProgressTracker) -> String {
    let mut lines = Vec::new();
    let mut head = format!("* {} [{}] {}", record.title, record.id, record.priority);
    if let Some(value) = record.numeric_value {
        head.push_str(&format!(" {}", report::format_amount(value)));
    } else if let Some(ref label) = record.estimated_value {
        head.push_str(&format!(" {label}"));
    }
    lines.push(head);
    if !record.description.is_empty() {
        lines.push(format!("  {}", record.description));
    }
    if !record.action_steps.is_empty() {
        lines.push(checklist(record, progress, ProgressKind::Step));
    }
    if record.has_documents() {
        lines.push(checklist(record, progress, ProgressKind::Document));
    }
    lines.push(format!("  tip: {}", report::recommendation_or_default(record)));
    lines.join("\n")
}

fn checklist(record: &EntitlementRecord, progress: &ProgressTracker, kind: ProgressKind) -> String {
    let items = match kind {
        ProgressKind::Step => &record.action_steps,
        ProgressKind::Document => &record.documents_to_prepare,
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mark = if progress.is_done(&record.id, kind, i) {
                "x"
            } else {
                " "
            };
            format!("    [{mark}] {}. {item}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One transcript line.
pub fn message(msg: &ChatMessage) -> String {
    match msg.role {
        Role::User => format!("you> {}", msg.text),
        Role::Assistant => format!("sheli> {}", msg.text),
    }
}

pub fn transcript(messages: &[ChatMessage]) -> String {
    messages.iter().map(message).collect::<Vec<_>>().join("\n")
}
