//! External service boundaries.

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::profile::Profile;
use crate::report::EntitlementRecord;

/// Produces entitlement records for a submitted profile.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Provider name for logs and errors.
    fn name(&self) -> &str;

    /// Analyze a frozen profile. An empty list is a valid answer.
    async fn analyze(&self, profile: &Profile) -> Result<Vec<EntitlementRecord>, AnalysisError>;
}

/// Answers one chat turn.
///
/// Never fails: implementations turn their own errors into a user-facing
/// apology string.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// `report_context` is the serialized current report, `None` when there
    /// is no report.
    async fn reply(&self, turn: &str, report_context: Option<&str>) -> String;
}
