//! Analysis Trigger: one-shot hand-off of a frozen profile to the service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{error, info, warn};

use super::service::AnalysisService;
use crate::error::AnalysisError;
use crate::profile::Profile;
use crate::report::Report;

/// Runs analysis requests and exposes the "analyzing" display flag.
///
/// No retries and no timeout of its own. At most one submission is in
/// flight; a second one is refused with [`AnalysisError::AlreadyRunning`].
pub struct AnalysisTrigger {
    service: Arc<dyn AnalysisService>,
    analyzing: AtomicBool,
}

/// Clears the analyzing flag however the submission ends.
struct AnalyzingGuard<'a>(&'a AtomicBool);

impl Drop for AnalyzingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AnalysisTrigger {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            service,
            analyzing: AtomicBool::new(false),
        }
    }

    /// Whether a submission is pending.
    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::SeqCst)
    }

    /// Submit a profile snapshot. On failure nothing else changes; callers
    /// keep their current report and may call again.
    pub async fn submit(&self, profile: &Profile) -> Result<Report, AnalysisError> {
        if self
            .analyzing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Analysis already running, ignoring submission");
            return Err(AnalysisError::AlreadyRunning);
        }
        let _guard = AnalyzingGuard(&self.analyzing);

        let provider = self.service.name().to_string();
        let sectors = profile.selected_sectors.len();
        info!(provider = %provider, sectors, "Analysis started");
        let started = Instant::now();

        match self.service.analyze(profile).await {
            Ok(records) => {
                let mut report = Report::new(records);
                report.repair_ids();
                info!(
                    provider = %provider,
                    records = report.len(),
                    critical = report.critical_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analysis completed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(provider = %provider, error = %e, "Analysis failed");
                Err(e)
            }
        }
    }
}
