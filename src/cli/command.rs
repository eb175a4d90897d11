//! REPL command parsing.

use std::path::PathBuf;

use serde_json::Value;

use crate::profile::Sector;
use crate::report::Tab;
use crate::session::Theme;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Home,
    /// Start the wizard.
    Start,
    /// Re-enter the wizard from the dashboard.
    Edit,
    Next,
    Back,
    Steps,
    Sector(Sector),
    /// Patch one profile field with a JSON value.
    Set { field: String, value: Value },
    Flag(String),
    /// Set the age of child `index` (zero-based).
    Child { index: usize, age: u32 },
    Profile,
    Analyze,
    Report,
    Tab(Tab),
    Authority(String),
    ClearAuthorities,
    Search(String),
    /// Toggle an action step (zero-based index).
    Step { record_id: String, index: usize },
    /// Toggle a document (zero-based index).
    Doc { record_id: String, index: usize },
    Focus(String),
    /// Ask the assistant; `None` asks for help prioritizing the report.
    Ask(Option<String>),
    /// Toggle the chat panel and show the transcript.
    Chat,
    Close,
    Print(Option<PathBuf>),
    /// Set the theme, or flip it when `None`.
    Theme(Option<Theme>),
    Quit,
    /// Plain text: a chat turn.
    Say(String),
    /// Recognized command with bad arguments.
    Invalid { usage: &'static str },
    Unknown(String),
}

/// Parses REPL lines into commands.
pub struct CommandParser;

impl CommandParser {
    pub fn parse(content: &str) -> Command {
        let trimmed = content.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/help" | "/?" => Command::Help,
            "/home" => Command::Home,
            "/start" => Command::Start,
            "/edit" => Command::Edit,
            "/next" | "/n" => Command::Next,
            "/back" | "/b" => Command::Back,
            "/steps" => Command::Steps,
            "/profile" => Command::Profile,
            "/analyze" => Command::Analyze,
            "/report" | "/dashboard" => Command::Report,
            "/authorities clear" => Command::ClearAuthorities,
            "/ask" => Command::Ask(None),
            "/chat" => Command::Chat,
            "/close" => Command::Close,
            "/print" => Command::Print(None),
            "/theme" => Command::Theme(None),
            "/quit" | "/exit" => Command::Quit,
            _ => parse_complex(trimmed),
        }
    }
}

/// Commands with arguments, then plain chat text.
fn parse_complex(trimmed: &str) -> Command {
    if !trimmed.starts_with('/') {
        return Command::Say(trimmed.to_string());
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head.to_lowercase().as_str() {
        "/sector" => parse_sector(rest),
        "/set" => parse_set(rest),
        "/flag" => require(rest, "/flag <field>", |f| Command::Flag(f.to_string())),
        "/child" => parse_child(rest),
        "/tab" => Tab::from_label(rest)
            .map(Command::Tab)
            .unwrap_or(Command::Invalid {
                usage: "/tab <all|critical|documents>",
            }),
        "/authority" => require(rest, "/authority <name>", |a| {
            Command::Authority(a.to_string())
        }),
        "/search" => Command::Search(rest.to_string()),
        "/step" => parse_progress(rest)
            .map(|(record_id, index)| Command::Step { record_id, index })
            .unwrap_or(Command::Invalid {
                usage: "/step <record> <n>",
            }),
        "/doc" => parse_progress(rest)
            .map(|(record_id, index)| Command::Doc { record_id, index })
            .unwrap_or(Command::Invalid {
                usage: "/doc <record> <n>",
            }),
        "/focus" => require(rest, "/focus <record>", |r| Command::Focus(r.to_string())),
        "/ask" => Command::Ask(Some(rest.to_string())),
        "/print" => Command::Print(Some(PathBuf::from(rest))),
        "/theme" => Theme::from_label(rest)
            .map(|t| Command::Theme(Some(t)))
            .unwrap_or(Command::Invalid {
                usage: "/theme <light|dark>",
            }),
        _ => Command::Unknown(head.to_string()),
    }
}

fn require(rest: &str, usage: &'static str, build: impl FnOnce(&str) -> Command) -> Command {
    if rest.is_empty() {
        Command::Invalid { usage }
    } else {
        build(rest)
    }
}

/// `/sector <id>`: catalog id such as `tax` or `social_security`.
fn parse_sector(rest: &str) -> Command {
    Sector::from_id(&rest.to_lowercase())
        .map(Command::Sector)
        .unwrap_or(Command::Invalid {
            usage: "/sector <tax|social_security|family|health|housing|transport>",
        })
}

/// `/set <field> <json>`. A value that is not valid JSON is taken as a string.
fn parse_set(rest: &str) -> Command {
    let usage = "/set <field> <json value>";
    let Some((field, raw)) = rest.split_once(char::is_whitespace) else {
        return Command::Invalid { usage };
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Command::Invalid { usage };
    }
    let value =
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Command::Set {
        field: field.to_string(),
        value,
    }
}

/// `/child <n> <age>` with a one-based `n`.
fn parse_child(rest: &str) -> Command {
    let usage = "/child <n> <age>";
    let mut parts = rest.split_whitespace();
    let (Some(n), Some(age), None) = (parts.next(), parts.next(), parts.next()) else {
        return Command::Invalid { usage };
    };
    match (n.parse::<usize>(), age.parse::<u32>()) {
        (Ok(n), Ok(age)) if n >= 1 => Command::Child { index: n - 1, age },
        _ => Command::Invalid { usage },
    }
}

/// `<record> <n>` with a one-based `n`; record ids may not contain spaces.
fn parse_progress(rest: &str) -> Option<(String, usize)> {
    let (record, n) = rest.rsplit_once(char::is_whitespace)?;
    let record = record.trim();
    let n: usize = n.trim().parse().ok()?;
    if record.is_empty() || n == 0 {
        return None;
    }
    Some((record.to_string(), n - 1))
}

/// Help text listing every command.
pub fn help_text() -> &'static str {
    "\
Navigation:
  /home                  back to the start page
  /start                 begin the assessment
  /edit                  edit your profile (restarts the wizard)
  /next, /back           move through the wizard
  /steps                 list the wizard steps
Profile:
  /sector <id>           toggle a sector (first step only)
  /set <field> <json>    set a profile field, e.g. /set age 42
  /flag <field>          toggle a yes/no field, e.g. /flag isStudent
  /child <n> <age>       set the age of child n
  /profile               show the profile
  /analyze               submit the profile from the summary step
Report:
  /report                show the dashboard
  /tab <all|critical|documents>
  /authority <name>      toggle an authority filter
  /authorities clear     clear the authority filter
  /search <text>         free-text filter (empty clears)
  /step <record> <n>     mark action step n done/undone
  /doc <record> <n>      mark document n prepared/unprepared
  /print [path]          render the full report
Assistant:
  /focus <record>        ask about a record
  /ask [text]            ask the assistant (no text: help prioritizing)
  /chat                  toggle the chat panel
  /close                 close the chat panel
  <any other text>       send a chat message
Other:
  /theme [light|dark]    set or flip the theme
  /quit                  exit"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(CommandParser::parse("/help"), Command::Help);
        assert_eq!(CommandParser::parse("  /NEXT "), Command::Next);
        assert_eq!(CommandParser::parse("/exit"), Command::Quit);
        assert_eq!(
            CommandParser::parse("/authorities clear"),
            Command::ClearAuthorities
        );
        assert_eq!(CommandParser::parse("/ask"), Command::Ask(None));
        assert_eq!(CommandParser::parse("/theme"), Command::Theme(None));
    }

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(
            CommandParser::parse("מה מגיע לי?"),
            Command::Say("מה מגיע לי?".to_string())
        );
    }

    #[test]
    fn sector_and_tab() {
        assert_eq!(
            CommandParser::parse("/sector Social_Security"),
            Command::Sector(Sector::SocialSecurity)
        );
        assert!(matches!(
            CommandParser::parse("/sector pets"),
            Command::Invalid { .. }
        ));
        assert_eq!(
            CommandParser::parse("/tab critical"),
            Command::Tab(Tab::Critical)
        );
    }

    #[test]
    fn set_parses_json_or_string() {
        assert_eq!(
            CommandParser::parse("/set age 42"),
            Command::Set {
                field: "age".to_string(),
                value: serde_json::json!(42),
            }
        );
        assert_eq!(
            CommandParser::parse("/set location Haifa"),
            Command::Set {
                field: "location".to_string(),
                value: serde_json::json!("Haifa"),
            }
        );
        assert!(matches!(
            CommandParser::parse("/set age"),
            Command::Invalid { .. }
        ));
    }

    #[test]
    fn progress_indices_are_one_based() {
        assert_eq!(
            CommandParser::parse("/step tax-1 2"),
            Command::Step {
                record_id: "tax-1".to_string(),
                index: 1,
            }
        );
        assert_eq!(
            CommandParser::parse("/doc fam-1 1"),
            Command::Doc {
                record_id: "fam-1".to_string(),
                index: 0,
            }
        );
        assert!(matches!(
            CommandParser::parse("/step tax-1 0"),
            Command::Invalid { .. }
        ));
        assert!(matches!(
            CommandParser::parse("/doc"),
            Command::Invalid { .. }
        ));
    }

    #[test]
    fn child_and_print() {
        assert_eq!(
            CommandParser::parse("/child 2 7"),
            Command::Child { index: 1, age: 7 }
        );
        assert_eq!(
            CommandParser::parse("/print out/report.md"),
            Command::Print(Some(PathBuf::from("out/report.md")))
        );
        assert_eq!(CommandParser::parse("/print"), Command::Print(None));
    }

    #[test]
    fn unknown_slash_command() {
        assert_eq!(
            CommandParser::parse("/dance now"),
            Command::Unknown("/dance".to_string())
        );
    }
}
