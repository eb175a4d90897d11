//! Chat Session Controller: transcript, panel, and turn serialization.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::model::{ChatMessage, PanelState, TurnOutcome, TurnState};
use crate::analysis::ConversationService;
use crate::config::ChatConfig;
use crate::report::{EntitlementRecord, Report};

struct ChatState {
    panel: PanelState,
    transcript: Vec<ChatMessage>,
}

/// Marks a turn as pending; clears it however the turn ends, including a
/// dropped future or a panicking service.
struct PendingTurn<'a>(&'a AtomicBool);

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One session's conversation with the assistant.
///
/// The transcript is append-only and starts with the greeting. At most one
/// turn is awaiting the conversation service at any time; the state lock is
/// never held across that call.
pub struct ChatSession {
    service: Arc<dyn ConversationService>,
    report: Arc<RwLock<Report>>,
    config: ChatConfig,
    state: Mutex<ChatState>,
    /// Set and cleared only while `state` is locked.
    awaiting: AtomicBool,
}

impl ChatSession {
    pub fn new(
        service: Arc<dyn ConversationService>,
        report: Arc<RwLock<Report>>,
        config: ChatConfig,
    ) -> Self {
        let greeting = ChatMessage::assistant(config.greeting.clone());
        Self {
            service,
            report,
            config,
            state: Mutex::new(ChatState {
                panel: PanelState::Closed,
                transcript: vec![greeting],
            }),
            awaiting: AtomicBool::new(false),
        }
    }

    pub async fn open_panel(&self) {
        self.state.lock().await.panel = PanelState::Open;
    }

    pub async fn close_panel(&self) {
        self.state.lock().await.panel = PanelState::Closed;
    }

    /// Flip the panel. Returns the new state.
    pub async fn toggle_panel(&self) -> PanelState {
        let mut state = self.state.lock().await;
        state.panel = match state.panel {
            PanelState::Closed => PanelState::Open,
            PanelState::Open => PanelState::Closed,
        };
        state.panel
    }

    pub async fn panel_state(&self) -> PanelState {
        self.state.lock().await.panel
    }

    pub async fn turn_state(&self) -> TurnState {
        let _state = self.state.lock().await;
        if self.awaiting.load(Ordering::SeqCst) {
            TurnState::AwaitingResponse
        } else {
            TurnState::Ready
        }
    }

    /// Whether a reply is pending (the "thinking" indicator).
    pub async fn is_awaiting(&self) -> bool {
        self.turn_state().await == TurnState::AwaitingResponse
    }

    /// Snapshot of the transcript in arrival order.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.state.lock().await.transcript.clone()
    }

    /// Send text typed by the user.
    pub async fn submit_user_text(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::IgnoredBlank;
        }

        let pending = {
            let mut state = self.state.lock().await;
            if self
                .awaiting
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!("Chat turn refused, reply still pending");
                return TurnOutcome::Busy;
            }
            state.transcript.push(ChatMessage::user(text));
            PendingTurn(&self.awaiting)
        };

        let context = self.report_context().await;
        debug!(has_context = context.is_some(), "Chat turn sent");
        let reply = self.service.reply(text, context.as_deref()).await;

        let mut state = self.state.lock().await;
        state.transcript.push(ChatMessage::assistant(reply));
        drop(pending);
        debug!(messages = state.transcript.len(), "Chat turn completed");
        TurnOutcome::Replied
    }

    /// Open the panel and send text on behalf of another component.
    pub async fn trigger_external(&self, text: &str) -> TurnOutcome {
        self.open_panel().await;
        info!("External chat trigger");
        self.submit_user_text(text).await
    }

    /// Ask the assistant how to prioritize the current report.
    pub async fn ask_to_prioritize(&self) -> TurnOutcome {
        let prompt = self.config.prioritize_prompt.clone();
        self.trigger_external(&prompt).await
    }

    /// Open the panel and append a canned message about `record`.
    ///
    /// No service call; allowed while a turn is pending.
    pub async fn focus_on_record(&self, record: &EntitlementRecord) {
        let message = self.config.focus_message(&record.title, &record.authority);
        let mut state = self.state.lock().await;
        state.panel = PanelState::Open;
        state.transcript.push(ChatMessage::assistant(message));
        debug!(record = %record.id, "Chat focused on record");
    }

    /// The full current report as JSON, or `None` when there is no report.
    async fn report_context(&self) -> Option<String> {
        let report = self.report.read().await;
        if report.is_empty() {
            return None;
        }
        match serde_json::to_string(&*report) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, "Failed to serialize report for chat context");
                None
            }
        }
    }
}
