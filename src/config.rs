//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Chat copy and templates.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// First assistant message of every fresh session.
    pub greeting: String,
    /// Assistant message injected when a record is focused.
    /// `{title}` and `{authority}` are substituted.
    pub focus_template: String,
    /// Text sent when the user asks for help prioritizing the report.
    pub prioritize_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "שלום! אני שלי, המלווה האישית שלך. איך אני יכולה לעזור לך למצות את הזכויות שלך היום?"
                .to_string(),
            focus_template:
                "אני רואה שאת/ה מעוניין/ת במידע על \"{title}\" של {authority}. זו זכות חשובה מאוד! במה נוכל להתקדם?"
                    .to_string(),
            prioritize_prompt: "איך כדאי לי לתעדף את המשימות בדו\"ח שלי?".to_string(),
        }
    }
}

impl ChatConfig {
    /// Fill the focus template for one record.
    pub fn focus_message(&self, title: &str, authority: &str) -> String {
        self.focus_template
            .replace("{title}", title)
            .replace("{authority}", authority)
    }
}

/// Gemini transport and generation settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// REST base, without the trailing `/models`.
    pub base_url: String,
    pub analysis_model: String,
    pub chat_model: String,
    pub chat_temperature: f32,
    /// Reasoning token budget for analysis requests.
    pub thinking_budget: u32,
    /// Ask the analysis model to ground itself with web search.
    pub web_search: bool,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            analysis_model: "gemini-3-pro-preview".to_string(),
            chat_model: "gemini-3-flash-preview".to_string(),
            chat_temperature: 0.7,
            thinking_budget: 32_768,
            web_search: true,
            request_timeout: Duration::from_secs(300), // analysis with search is slow
        }
    }
}

/// Application configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// libSQL file backing durable storage.
    pub db_path: PathBuf,
    /// Storage namespace.
    pub user: String,
    /// `None` when no key is configured; the binary refuses to start.
    pub api_key: Option<SecretString>,
    /// Directory for rolling log files. Logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
    pub gemini: GeminiConfig,
    pub chat: ChatConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/rightlane.db"),
            user: "default".to_string(),
            api_key: None,
            log_dir: None,
            gemini: GeminiConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("RIGHTLANE_DB_PATH") {
            config.db_path = PathBuf::from(non_empty("RIGHTLANE_DB_PATH", path)?);
        }
        if let Some(user) = lookup("RIGHTLANE_USER") {
            config.user = non_empty("RIGHTLANE_USER", user)?;
        }
        config.api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        config.log_dir = lookup("RIGHTLANE_LOG_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        if let Some(model) = lookup("RIGHTLANE_ANALYSIS_MODEL") {
            config.gemini.analysis_model = non_empty("RIGHTLANE_ANALYSIS_MODEL", model)?;
        }
        if let Some(model) = lookup("RIGHTLANE_CHAT_MODEL") {
            config.gemini.chat_model = non_empty("RIGHTLANE_CHAT_MODEL", model)?;
        }
        if let Some(secs) = lookup("RIGHTLANE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "RIGHTLANE_REQUEST_TIMEOUT_SECS".to_string(),
                message: format!("{e}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "RIGHTLANE_REQUEST_TIMEOUT_SECS".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.gemini.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// The API key, or the error the binary reports when it is missing.
    pub fn require_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))
    }
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./data/rightlane.db"));
        assert_eq!(config.user, "default");
        assert!(config.api_key.is_none());
        assert!(config.log_dir.is_none());
        assert_eq!(config.gemini.analysis_model, "gemini-3-pro-preview");
        assert_eq!(config.gemini.chat_model, "gemini-3-flash-preview");
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn overrides_from_env() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("RIGHTLANE_DB_PATH", "/tmp/x.db"),
            ("RIGHTLANE_USER", "dana"),
            ("GEMINI_API_KEY", "secret"),
            ("RIGHTLANE_CHAT_MODEL", "flash-test"),
            ("RIGHTLANE_REQUEST_TIMEOUT_SECS", "30"),
            ("RIGHTLANE_LOG_DIR", "/tmp/logs"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.user, "dana");
        assert_eq!(config.require_api_key().unwrap().expose_secret(), "secret");
        assert_eq!(config.gemini.chat_model, "flash-test");
        assert_eq!(config.gemini.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("RIGHTLANE_USER", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "RIGHTLANE_USER"));

        let err = AppConfig::from_lookup(lookup_from(&[(
            "RIGHTLANE_REQUEST_TIMEOUT_SECS",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::from_lookup(lookup_from(&[(
            "RIGHTLANE_REQUEST_TIMEOUT_SECS",
            "0",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn focus_message_substitutes_placeholders() {
        let chat = ChatConfig::default();
        let msg = chat.focus_message("נקודות זיכוי", "רשות המסים");
        assert!(msg.contains("\"נקודות זיכוי\""));
        assert!(msg.contains("של רשות המסים"));
        assert!(!msg.contains("{title}"));
    }
}
