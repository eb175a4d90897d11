//! Process-wide session preferences: theme and first-visit flag.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{self, KeyValueStore, storage_keys};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_label(label: &str) -> Option<Theme> {
        match label.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loaded once at startup; every setter persists immediately.
pub struct SessionPrefs {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
    visited: bool,
}

impl SessionPrefs {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let theme = store::load_or_default(store.as_ref(), storage_keys::THEME).await;
        let visited = store::load_or_default(store.as_ref(), storage_keys::VISITED).await;
        Self {
            store,
            theme,
            visited,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub async fn set_theme(&mut self, theme: Theme) {
        debug!(%theme, "Theme changed");
        self.theme = theme;
        store::save(self.store.as_ref(), storage_keys::THEME, &theme).await;
    }

    pub async fn toggle_theme(&mut self) -> Theme {
        let next = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.set_theme(next).await;
        next
    }

    /// Whether the user has been here before.
    pub fn has_visited(&self) -> bool {
        self.visited
    }

    /// Record the first visit. Returns `true` if this call was the first.
    pub async fn mark_visited(&mut self) -> bool {
        if self.visited {
            return false;
        }
        self.visited = true;
        store::save(self.store.as_ref(), storage_keys::VISITED, &true).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn defaults_then_persisted() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut prefs = SessionPrefs::load(store.clone()).await;
        assert_eq!(prefs.theme(), Theme::Light);
        assert!(!prefs.has_visited());

        assert_eq!(prefs.toggle_theme().await, Theme::Dark);
        assert!(prefs.mark_visited().await);
        assert!(!prefs.mark_visited().await);

        let reloaded = SessionPrefs::load(store).await;
        assert_eq!(reloaded.theme(), Theme::Dark);
        assert!(reloaded.has_visited());
    }

    #[tokio::test]
    async fn legacy_string_values_are_read() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(storage_keys::THEME, &serde_json::json!("dark"))
            .await
            .unwrap();
        store
            .set(storage_keys::VISITED, &serde_json::json!(true))
            .await
            .unwrap();
        let prefs = SessionPrefs::load(store).await;
        assert_eq!(prefs.theme(), Theme::Dark);
        assert!(prefs.has_visited());
    }

    #[test]
    fn theme_labels() {
        assert_eq!(Theme::from_label(" Dark "), Some(Theme::Dark));
        assert_eq!(Theme::from_label("blue"), None);
    }
}
