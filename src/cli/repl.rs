//! Terminal REPL driving a `Session`.

use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use super::command::{Command, CommandParser, help_text};
use super::render;
use crate::chat::{ChatSession, TurnOutcome};
use crate::error::{AnalysisError, ProfileError};
use crate::progress::ProgressKind;
use crate::session::{Page, Session};

type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Whether the loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Non-empty trimmed stdin lines.
fn stdin_lines() -> LineStream {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        eprint!("> ");
                        continue;
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF
                Err(e) => {
                    error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    }))
}

/// Stdin/stdout host for one session.
pub struct Repl {
    session: Session,
}

impl Repl {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read commands from stdin until `/quit` or EOF.
    pub async fn run(mut self) {
        if self.session.prefs_mut().mark_visited().await {
            println!("Welcome! Type /start to check your entitlements, /help for commands.\n");
        }
        println!("{}", self.page_view().await);
        eprint!("> ");

        let mut lines = stdin_lines();
        while let Some(line) = lines.next().await {
            let command = CommandParser::parse(&line);
            let flow = self.handle(command).await;
            if flow == Flow::Quit {
                break;
            }
            eprint!("> ");
        }
        info!("REPL finished");
    }

    /// Execute one command and print its result.
    pub async fn handle(&mut self, command: Command) -> Flow {
        if let Some(output) = self.execute(command).await {
            match output {
                Output::Text(text) => println!("\n{text}\n"),
                Output::Quit => return Flow::Quit,
            }
        }
        Flow::Continue
    }

    async fn execute(&mut self, command: Command) -> Option<Output> {
        let s = &mut self.session;
        let text = match command {
            Command::Help => help_text().to_string(),
            Command::Quit => return Some(Output::Quit),
            Command::Home => {
                s.go_home();
                "Home. Type /start to begin, /report for your dashboard.".to_string()
            }
            Command::Start => {
                s.start_assessment();
                self.page_view().await
            }
            Command::Edit => {
                s.edit_profile();
                self.page_view().await
            }
            Command::Next => {
                if !self.require_page(Page::Assessment) {
                    return Some(not_in_wizard());
                }
                if !self.session.advance() {
                    return Some(Output::Text("Can't move forward from here.".to_string()));
                }
                self.page_view().await
            }
            Command::Back => {
                if !self.require_page(Page::Assessment) {
                    return Some(not_in_wizard());
                }
                self.session.retreat();
                self.page_view().await
            }
            Command::Steps => render::step_list(s.wizard(), s.profile()),
            Command::Sector(sector) => match s.toggle_sector(sector) {
                Some(_) => self.page_view().await,
                None => "Areas can only be changed on the first step of the assessment.".to_string(),
            },
            Command::Set { field, value } => {
                let mut patch = serde_json::Map::new();
                patch.insert(field.clone(), value);
                match s.apply_patch(serde_json::Value::Object(patch)) {
                    Ok(()) => format!("Updated {field}."),
                    Err(e) => format!("Not updated: {e}"),
                }
            }
            Command::Flag(field) => match s.toggle_flag(&field) {
                Ok(on) => format!("{field}: {}", if on { "yes" } else { "no" }),
                Err(e) => format!("Not updated: {e}"),
            },
            Command::Child { index, age } => match s.set_child_age(index, age) {
                Ok(()) => format!("Child {} is {age}.", index + 1),
                Err(ProfileError::ChildOutOfRange { max, .. }) => {
                    format!("Child number must be between 1 and {max}.")
                }
                Err(e) => format!("Not updated: {e}"),
            },
            Command::Profile => s.profile().to_summary_section(),
            Command::Analyze => {
                println!("Analyzing your profile, this can take a while...");
                match s.run_analysis().await {
                    Ok(count) => {
                        let header = format!("Found {count} entitlements.");
                        format!("{header}\n\n{}", self.page_view().await)
                    }
                    Err(AnalysisError::NotAtSummary) => {
                        "Finish the wizard first (/next until the summary step).".to_string()
                    }
                    Err(e) => format!("The analysis did not complete ({e}). Try /analyze again."),
                }
            }
            Command::Report => {
                s.open_dashboard();
                self.page_view().await
            }
            Command::Tab(tab) => {
                s.browser_mut().set_tab(tab);
                self.dashboard_view().await
            }
            Command::Authority(name) => {
                s.browser_mut().toggle_authority(&name);
                self.dashboard_view().await
            }
            Command::ClearAuthorities => {
                s.browser_mut().clear_authorities();
                self.dashboard_view().await
            }
            Command::Search(query) => {
                s.browser_mut().set_query(query);
                self.dashboard_view().await
            }
            Command::Step { record_id, index } => {
                let done = s
                    .toggle_progress(&record_id, ProgressKind::Step, index)
                    .await;
                format!(
                    "Step {} of {record_id}: {}",
                    index + 1,
                    if done { "done" } else { "not done" }
                )
            }
            Command::Doc { record_id, index } => {
                let done = s
                    .toggle_progress(&record_id, ProgressKind::Document, index)
                    .await;
                format!(
                    "Document {} of {record_id}: {}",
                    index + 1,
                    if done { "ready" } else { "not ready" }
                )
            }
            Command::Focus(record_id) => {
                if s.focus_record(&record_id).await {
                    self.chat_tail(1).await
                } else {
                    format!("No record {record_id} in the current report.")
                }
            }
            Command::Ask(text) => {
                let turn = match text {
                    Some(text) => Turn::External(text),
                    None => Turn::Prioritize,
                };
                spawn_turn(s.chat(), turn);
                return None;
            }
            Command::Say(text) => {
                spawn_turn(s.chat(), Turn::Typed(text));
                return None;
            }
            Command::Chat => {
                let chat = s.chat();
                chat.toggle_panel().await;
                render::transcript(&chat.transcript().await)
            }
            Command::Close => {
                s.chat().close_panel().await;
                "Chat closed.".to_string()
            }
            Command::Print(path) => {
                let text = s.render_for_print().await;
                match path {
                    Some(path) => write_print(&path, &text).await,
                    None => text,
                }
            }
            Command::Theme(theme) => {
                let prefs = s.prefs_mut();
                let theme = match theme {
                    Some(theme) => {
                        prefs.set_theme(theme).await;
                        theme
                    }
                    None => prefs.toggle_theme().await,
                };
                format!("Theme: {theme}")
            }
            Command::Invalid { usage } => format!("Usage: {usage}"),
            Command::Unknown(head) => format!("Unknown command {head}. Type /help."),
        };
        Some(Output::Text(text))
    }

    fn require_page(&self, page: Page) -> bool {
        self.session.page() == page
    }

    /// What the current page shows.
    async fn page_view(&self) -> String {
        let s = &self.session;
        match s.page() {
            Page::Home => {
                "RightLane: find the benefits you're entitled to.\nType /start to begin, /report for your dashboard."
                    .to_string()
            }
            Page::Assessment => render::wizard_screen(s.wizard(), s.profile(), s.is_analyzing()),
            Page::Dashboard => self.dashboard_view().await,
        }
    }

    async fn dashboard_view(&self) -> String {
        let s = &self.session;
        let summary = s.dashboard_summary().await;
        let report = s.report().await;
        render::dashboard(&summary, s.browser(), &report, s.progress())
    }

    async fn chat_tail(&self, n: usize) -> String {
        let transcript = self.session.chat().transcript().await;
        let start = transcript.len().saturating_sub(n);
        render::transcript(&transcript[start..])
    }
}

enum Output {
    Text(String),
    Quit,
}

fn not_in_wizard() -> Output {
    Output::Text("You're not in the assessment. Type /start.".to_string())
}

/// Where a background chat turn came from.
enum Turn {
    Typed(String),
    External(String),
    Prioritize,
}

/// Run a chat turn in the background so the prompt stays usable.
fn spawn_turn(chat: Arc<ChatSession>, turn: Turn) {
    tokio::spawn(async move {
        let outcome = match turn {
            Turn::Typed(text) => chat.submit_user_text(&text).await,
            Turn::External(text) => chat.trigger_external(&text).await,
            Turn::Prioritize => chat.ask_to_prioritize().await,
        };
        match outcome {
            TurnOutcome::Replied => {
                if let Some(last) = chat.transcript().await.last() {
                    println!("\n{}\n", render::message(last));
                }
            }
            TurnOutcome::Busy => println!("\nStill waiting for the previous answer.\n"),
            TurnOutcome::IgnoredBlank => {}
        }
        eprint!("> ");
    });
}

async fn write_print(path: &Path, text: &str) -> String {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return format!("Could not create {}: {e}", parent.display());
            }
        }
    }
    match tokio::fs::write(path, text).await {
        Ok(()) => format!("Report written to {}.", path.display()),
        Err(e) => format!("Could not write {}: {e}", path.display()),
    }
}
