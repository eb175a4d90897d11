//! Session: the single owner of profile, report, progress, and chat.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use super::prefs::SessionPrefs;
use crate::analysis::{AnalysisService, AnalysisTrigger, ConversationService};
use crate::chat::ChatSession;
use crate::config::ChatConfig;
use crate::error::{AnalysisError, ProfileError};
use crate::profile::{Profile, ProfileStore, Sector};
use crate::progress::{ProgressKind, ProgressTracker};
use crate::report::{self, DashboardSummary, Report, ReportBrowser};
use crate::store::{self, KeyValueStore, storage_keys};
use crate::wizard::{StepId, WizardState, compute_steps};

const SELECTED_SECTORS: &str = "selectedSectors";

/// Top-level screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Home,
    Assessment,
    Dashboard,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Page::Home => "home",
            Page::Assessment => "assessment",
            Page::Dashboard => "dashboard",
        };
        write!(f, "{s}")
    }
}

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct Services {
    pub analysis: Arc<dyn AnalysisService>,
    pub conversation: Arc<dyn ConversationService>,
}

/// One user's session.
///
/// Owns every mutable entity; other components only see references handed
/// out here. The report is shared with the chat controller as read-only
/// context.
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    page: Page,
    /// Last profile persisted by a successful analysis.
    saved_profile: Option<Profile>,
    profile: ProfileStore,
    wizard: WizardState,
    report: Arc<RwLock<Report>>,
    progress: ProgressTracker,
    browser: ReportBrowser,
    trigger: AnalysisTrigger,
    chat: Arc<ChatSession>,
    prefs: SessionPrefs,
}

impl Session {
    /// Hydrate a session from durable storage. Unreadable blobs start empty.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        services: Services,
        chat_config: ChatConfig,
    ) -> Self {
        let saved_profile: Option<Profile> =
            store::load(store.as_ref(), storage_keys::USER_PROFILE).await;
        let mut loaded: Report =
            store::load_or_default(store.as_ref(), storage_keys::ACTIVE_REPORT).await;
        if loaded.repair_ids() {
            warn!("Stored report had blank or repeated ids, re-saving");
            store::save(store.as_ref(), storage_keys::ACTIVE_REPORT, &loaded).await;
        }
        let progress = ProgressTracker::load(store.clone()).await;
        let prefs = SessionPrefs::load(store.clone()).await;

        info!(
            has_profile = saved_profile.is_some(),
            records = loaded.len(),
            "Session loaded"
        );

        let report = Arc::new(RwLock::new(loaded));
        let chat = Arc::new(ChatSession::new(
            services.conversation,
            report.clone(),
            chat_config,
        ));

        Self {
            profile: ProfileStore::new(saved_profile.clone()),
            saved_profile,
            store,
            page: Page::Home,
            wizard: WizardState::new(),
            report,
            progress,
            browser: ReportBrowser::new(),
            trigger: AnalysisTrigger::new(services.analysis),
            chat,
            prefs,
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    pub fn page(&self) -> Page {
        self.page
    }

    /// Enter the wizard at step 0 with the stored profile, or defaults.
    pub fn start_assessment(&mut self) {
        self.profile = ProfileStore::new(self.saved_profile.clone());
        self.wizard.reset();
        self.page = Page::Assessment;
        info!("Assessment started");
    }

    /// Re-enter the wizard from the dashboard.
    pub fn edit_profile(&mut self) {
        self.start_assessment();
    }

    pub fn go_home(&mut self) {
        self.page = Page::Home;
    }

    pub fn open_dashboard(&mut self) {
        self.page = Page::Dashboard;
    }

    // ── Wizard ──────────────────────────────────────────────────────

    pub fn profile(&self) -> &Profile {
        self.profile.profile()
    }

    pub fn wizard(&self) -> &WizardState {
        &self.wizard
    }

    pub fn steps(&self) -> Vec<StepId> {
        compute_steps(self.profile.profile())
    }

    pub fn current_step(&self) -> StepId {
        self.wizard.current_step(self.profile.profile())
    }

    pub fn advance(&mut self) -> bool {
        self.wizard.advance(self.profile.profile())
    }

    pub fn retreat(&mut self) -> bool {
        self.wizard.retreat()
    }

    /// Back/next controls: hidden on the last step and while analyzing.
    pub fn navigation_visible(&self) -> bool {
        self.wizard
            .navigation_visible(self.profile.profile(), self.trigger.is_analyzing())
    }

    pub fn is_analyzing(&self) -> bool {
        self.trigger.is_analyzing()
    }

    /// Sector selection is open only on the first step of a running wizard.
    pub fn sectors_editable(&self) -> bool {
        self.page == Page::Assessment && self.wizard.sectors_editable()
    }

    /// Toggle a sector. `None` when sector selection is not editable right
    /// now; otherwise whether the sector is now selected.
    pub fn toggle_sector(&mut self, sector: Sector) -> Option<bool> {
        if !self.sectors_editable() {
            debug!(%sector, page = %self.page, step = self.wizard.index(), "Sector toggle refused");
            return None;
        }
        Some(self.profile.toggle_sector(sector))
    }

    /// Merge a field-level patch. A patch touching `selectedSectors` is
    /// refused whole unless sectors are editable.
    pub fn apply_patch(&mut self, patch: Value) -> Result<(), ProfileError> {
        let touches_sectors = patch
            .as_object()
            .is_some_and(|fields| fields.contains_key(SELECTED_SECTORS));
        if touches_sectors && !self.sectors_editable() {
            debug!(page = %self.page, step = self.wizard.index(), "Sector patch refused");
            return Err(ProfileError::SectorsLocked);
        }
        self.profile.apply_patch(patch)
    }

    pub fn toggle_flag(&mut self, field: &str) -> Result<bool, ProfileError> {
        self.profile.toggle_flag(field)
    }

    pub fn set_child_age(&mut self, index: usize, age: u32) -> Result<(), ProfileError> {
        self.profile.set_child_age(index, age)
    }

    /// Submit the profile from the summary step.
    ///
    /// On success the report is replaced and persisted along with the
    /// profile, filters reset, and the dashboard shown. On failure nothing
    /// changes and the user stays on the summary step.
    pub async fn run_analysis(&mut self) -> Result<usize, AnalysisError> {
        if self.page != Page::Assessment || !self.current_step().is_summary() {
            return Err(AnalysisError::NotAtSummary);
        }

        let snapshot = self.profile.snapshot();
        let new_report = self.trigger.submit(&snapshot).await?;
        let count = new_report.len();

        store::save(self.store.as_ref(), storage_keys::ACTIVE_REPORT, &new_report).await;
        store::save(self.store.as_ref(), storage_keys::USER_PROFILE, &snapshot).await;
        *self.report.write().await = new_report;
        self.saved_profile = Some(snapshot);

        self.browser.reset();
        self.page = Page::Dashboard;
        info!(records = count, "Report replaced");
        Ok(count)
    }

    // ── Dashboard ───────────────────────────────────────────────────

    /// Read access to the current report.
    pub async fn report(&self) -> RwLockReadGuard<'_, Report> {
        self.report.read().await
    }

    pub fn browser(&self) -> &ReportBrowser {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut ReportBrowser {
        &mut self.browser
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Mark an action step or document done/undone.
    pub async fn toggle_progress(&mut self, record_id: &str, kind: ProgressKind, index: usize) -> bool {
        self.progress.toggle(record_id, kind, index).await
    }

    pub async fn dashboard_summary(&self) -> DashboardSummary {
        let report = self.report.read().await;
        DashboardSummary {
            total_value: report::total_value(&report),
            critical_count: report.critical_count(),
            completed_steps: self.progress.count(ProgressKind::Step),
            prepared_documents: self.progress.count(ProgressKind::Document),
        }
    }

    pub async fn total_value(&self) -> Decimal {
        report::total_value(&*self.report.read().await)
    }

    /// The full unfiltered report, rendered for printing.
    pub async fn render_for_print(&self) -> String {
        report::render_for_print(&*self.report.read().await)
    }

    // ── Chat ────────────────────────────────────────────────────────

    pub fn chat(&self) -> Arc<ChatSession> {
        self.chat.clone()
    }

    /// Focus the chat on a record of the current report. `false` if no
    /// such record.
    pub async fn focus_record(&self, record_id: &str) -> bool {
        let record = {
            let report = self.report.read().await;
            report.get(record_id).cloned()
        };
        match record {
            Some(record) => {
                self.chat.focus_on_record(&record).await;
                true
            }
            None => false,
        }
    }

    // ── Preferences ─────────────────────────────────────────────────

    pub fn prefs(&self) -> &SessionPrefs {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut SessionPrefs {
        &mut self.prefs
    }
}
