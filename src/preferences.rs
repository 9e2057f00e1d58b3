//! Theme preference, persisted independently of the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::storage::{Storage, StorageError, THEME_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ThemeBlob {
    theme: Theme,
}

pub struct Preferences {
    storage: Arc<dyn Storage>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored theme, defaulting to light when absent or unreadable
    pub fn theme(&self) -> Theme {
        match self.storage.get(THEME_KEY) {
            Ok(Some(blob)) => serde_json::from_str::<ThemeBlob>(&blob)
                .map(|b| b.theme)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring corrupt theme blob");
                    Theme::default()
                }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        let blob = serde_json::json!({ "theme": theme }).to_string();
        self.storage.set(THEME_KEY, &blob)
    }
}
